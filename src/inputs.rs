use crate::error::{SetupError, SetupResult};
use crate::records::{header_line, ArtifactValues, ConfigRecord, Fingerprint};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const PAYOFF_DIR: &str = "Payoffs";
pub const STRATEGY_DIR: &str = "Strategy";

pub fn payoff_path(input_dir: &Path, key: &str) -> PathBuf {
    input_dir.join(PAYOFF_DIR).join(format!("Payoffs_{key}.csv"))
}

pub fn strategy_path(input_dir: &Path, key: &str) -> PathBuf {
    input_dir.join(STRATEGY_DIR).join(format!("Strategy_{key}.csv"))
}

#[derive(Clone, Debug)]
pub struct ExistingInput {
    pub record: ConfigRecord,
    pub artifacts: ArtifactValues,
    pub source: PathBuf,
}

impl ExistingInput {
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(&self.record, &self.artifacts)
    }
}

/// Records already present in a sweep directory, indexed by key.
#[derive(Debug, Default)]
pub struct ExistingInputs {
    by_key: BTreeMap<String, ExistingInput>,
    fingerprints: HashSet<Fingerprint>,
}

impl ExistingInputs {
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ExistingInput> {
        self.by_key.get(key)
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.fingerprints.contains(fingerprint)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExistingInput> {
        self.by_key.values()
    }

    fn insert(&mut self, input: ExistingInput) {
        self.fingerprints.insert(input.fingerprint());
        self.by_key.insert(input.record.key.clone(), input);
    }
}

/// `.conf` files directly inside `input_dir`, sorted by file name.
pub fn conf_files(input_dir: &Path) -> SetupResult<Vec<PathBuf>> {
    let entries = fs::read_dir(input_dir).map_err(|e| SetupError::io(input_dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SetupError::io(input_dir, e))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "conf") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Rebuilds the records of a previous run together with the contents of
/// their payoff and strategy files. A missing directory yields an empty set.
pub fn load_existing(input_dir: &Path) -> SetupResult<ExistingInputs> {
    let mut existing = ExistingInputs::default();
    if !input_dir.is_dir() {
        return Ok(existing);
    }

    for conf in conf_files(input_dir)? {
        for record in read_conf(&conf)? {
            let artifacts = read_artifacts(input_dir, &record.key)?;
            existing.insert(ExistingInput {
                record,
                artifacts,
                source: conf.clone(),
            });
        }
    }

    tracing::debug!(
        dir = %input_dir.display(),
        records = existing.len(),
        "loaded existing inputs"
    );
    Ok(existing)
}

pub fn read_conf(path: &Path) -> SetupResult<Vec<ConfigRecord>> {
    let raw = fs::read_to_string(path).map_err(|e| SetupError::io(path, e))?;
    let mut lines = raw.lines().enumerate();

    match lines.next() {
        Some((_, header)) if header.split_whitespace().collect::<Vec<_>>().join(" ") == header_line() => {}
        Some((idx, _)) => return Err(SetupError::malformed(path, idx + 1, "unexpected header")),
        None => return Ok(Vec::new()),
    }

    let mut records = Vec::new();
    for (idx, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        records.push(ConfigRecord::parse_row(line, path, idx + 1)?);
    }
    Ok(records)
}

fn read_artifacts(input_dir: &Path, key: &str) -> SetupResult<ArtifactValues> {
    let payoff_file = payoff_path(input_dir, key);
    let strategy_file = strategy_path(input_dir, key);
    let payoff_raw = read_artifact(&payoff_file, key)?;
    let strategy_raw = read_artifact(&strategy_file, key)?;

    let (payoffs, bonus) = ArtifactValues::parse_payoff_file(&payoff_raw);
    Ok(ArtifactValues {
        payoffs,
        bonus,
        strategy: ArtifactValues::parse_strategy_file(&strategy_raw),
    })
}

fn read_artifact(path: &Path, key: &str) -> SetupResult<String> {
    if !path.is_file() {
        return Err(SetupError::MissingArtifact {
            key: key.to_string(),
            path: path.to_path_buf(),
        });
    }
    fs::read_to_string(path).map_err(|e| SetupError::io(path, e))
}
