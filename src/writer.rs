use crate::config::BonusVector;
use crate::error::{SetupError, SetupResult};
use crate::inputs::{payoff_path, strategy_path, PAYOFF_DIR, STRATEGY_DIR};
use crate::payoffs::PayoffPair;
use crate::records::{header_line, render_payoff_file, ConfigRecord, StrategyMatrix};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const LOCK_FILE: &str = ".sweep.lock";

/// Directory layout of one sweep under a base directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SweepLayout {
    pub game: String,
    pub data_description: String,
    pub input_root: PathBuf,
    pub input_dir: PathBuf,
    pub output_root: PathBuf,
}

impl SweepLayout {
    pub fn new(base_dir: &Path, game: &str, data_description: &str) -> Self {
        let input_root = base_dir.join(format!("{game}_Input"));
        Self {
            game: game.to_string(),
            data_description: data_description.to_string(),
            input_dir: input_root.join(format!("Input_{data_description}")),
            input_root,
            output_root: base_dir.join(format!("{game}_Output_Data")),
        }
    }

    pub fn conf_path(&self, index: usize) -> PathBuf {
        self.input_dir
            .join(format!("Input_{}_{index}.conf", self.data_description))
    }
}

/// Records per `.conf` file: large populations make each simulation heavy,
/// so fewer records are grouped per file.
pub fn chunk_size(population: u32) -> usize {
    if population < 100 {
        8
    } else if population < 500 {
        2
    } else {
        1
    }
}

pub fn ensure_dir(path: &Path) -> SetupResult<()> {
    fs::create_dir_all(path).map_err(|e| SetupError::io(path, e))
}

/// Exclusive claim on a sweep directory, held for the read-modify-append
/// cycle. The lock file is removed on drop.
#[derive(Debug)]
pub struct SweepLock {
    path: PathBuf,
}

impl SweepLock {
    pub fn acquire(input_dir: &Path) -> SetupResult<Self> {
        ensure_dir(input_dir)?;
        let path = input_dir.join(LOCK_FILE);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                // Constructed first so a failed write still removes the file.
                let lock = Self { path };
                writeln!(file, "{}", std::process::id())
                    .map_err(|e| SetupError::io(&lock.path, e))?;
                Ok(lock)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(SetupError::SweepLocked { path })
            }
            Err(e) => Err(SetupError::io(path, e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SweepLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("failed removing sweep lock {}: {e}", self.path.display());
        }
    }
}

/// Writes `Payoffs_<key>.csv` and `Strategy_<key>.csv`, overwriting any
/// previous file for the same key.
pub fn write_artifacts(
    input_dir: &Path,
    key: &str,
    payoffs: &PayoffPair,
    bonus: BonusVector,
    strategy: &StrategyMatrix,
) -> SetupResult<()> {
    ensure_dir(&input_dir.join(PAYOFF_DIR))?;
    ensure_dir(&input_dir.join(STRATEGY_DIR))?;

    let payoff_file = payoff_path(input_dir, key);
    fs::write(&payoff_file, render_payoff_file(payoffs, bonus))
        .map_err(|e| SetupError::io(&payoff_file, e))?;

    let strategy_file = strategy_path(input_dir, key);
    fs::write(&strategy_file, strategy.render()).map_err(|e| SetupError::io(&strategy_file, e))?;
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfChunk {
    pub path: PathBuf,
    pub rows: usize,
    pub appended: bool,
}

/// Splits `records` into chunks of `per_file` and writes chunk `i` to
/// `Input_<data_description>_<i>.conf`. Existing files get rows appended
/// without a header.
pub fn write_conf_chunks(
    layout: &SweepLayout,
    records: &[ConfigRecord],
    per_file: usize,
) -> SetupResult<Vec<ConfChunk>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }
    ensure_dir(&layout.input_dir)?;

    let mut written = Vec::new();
    for (index, chunk) in records.chunks(per_file.max(1)).enumerate() {
        let path = layout.conf_path(index);
        let appended = path.exists();

        let mut body = String::new();
        if !appended {
            body.push_str(&header_line());
            body.push('\n');
        }
        for record in chunk {
            body.push_str(&record.to_line());
            body.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| SetupError::io(&path, e))?;
        file.write_all(body.as_bytes())
            .map_err(|e| SetupError::io(&path, e))?;

        tracing::info!(
            file = %path.display(),
            rows = chunk.len(),
            appended,
            "wrote conf chunk"
        );
        written.push(ConfChunk {
            path,
            rows: chunk.len(),
            appended,
        });
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_size_follows_population_tiers() {
        assert_eq!(chunk_size(20), 8);
        assert_eq!(chunk_size(99), 8);
        assert_eq!(chunk_size(100), 2);
        assert_eq!(chunk_size(499), 2);
        assert_eq!(chunk_size(500), 1);
    }

    #[test]
    fn layout_names() {
        let layout = SweepLayout::new(Path::new("/data"), "HDInnov", "HDInnov_Pop-20");
        assert_eq!(layout.input_dir, PathBuf::from("/data/HDInnov_Input/Input_HDInnov_Pop-20"));
        assert_eq!(layout.output_root, PathBuf::from("/data/HDInnov_Output_Data"));
        assert_eq!(
            layout.conf_path(1),
            PathBuf::from("/data/HDInnov_Input/Input_HDInnov_Pop-20/Input_HDInnov_Pop-20_1.conf")
        );
    }

    #[test]
    fn lock_is_exclusive_and_released() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("sweep");
        let lock = SweepLock::acquire(&dir).unwrap();
        assert!(lock.path().exists());
        assert!(matches!(
            SweepLock::acquire(&dir),
            Err(SetupError::SweepLocked { .. })
        ));
        drop(lock);
        assert!(!dir.join(LOCK_FILE).exists());
        assert!(SweepLock::acquire(&dir).is_ok());
    }

    #[test]
    fn lock_file_records_owner_pid() {
        let tmp = tempfile::tempdir().unwrap();
        let lock = SweepLock::acquire(tmp.path()).unwrap();
        let owner = fs::read_to_string(lock.path()).unwrap();
        assert_eq!(owner.trim(), std::process::id().to_string());
    }
}
