use crate::config::{SweepConfig, DEFAULT_GAME};
use crate::error::SetupResult;
use crate::inputs::load_existing;
use crate::keys::{KeyGenerator, RandomKeys};
use crate::launcher::{launch, LaunchConfig, LaunchOutcome};
use crate::payoffs::build_payoffs;
use crate::records::{ConfigRecord, Fingerprint};
use crate::sweep::{data_description, describe, expand, prepare};
use crate::writer::{chunk_size, ensure_dir, write_artifacts, write_conf_chunks, SweepLayout, SweepLock};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Whether combinations skipped as duplicates still get artifact files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactPolicy {
    /// Every combination gets fresh payoff/strategy files under its new key,
    /// recorded or not.
    #[default]
    Always,
    /// Only combinations that produce a `.conf` row get files.
    SkipDuplicates,
}

/// Everything a run needs besides the experiment parameters.
#[derive(Debug)]
pub struct SetupContext {
    pub base_dir: PathBuf,
    pub game: String,
    pub artifact_policy: ArtifactPolicy,
    pub keys: Box<dyn KeyGenerator>,
    pub launcher: LaunchConfig,
}

impl SetupContext {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            launcher: LaunchConfig::new(base_dir.clone()),
            base_dir,
            game: DEFAULT_GAME.to_string(),
            artifact_policy: ArtifactPolicy::default(),
            keys: Box::new(RandomKeys::from_entropy()),
        }
    }

    pub fn with_keys(mut self, keys: impl KeyGenerator + 'static) -> Self {
        self.keys = Box::new(keys);
        self
    }

    pub fn with_artifact_policy(mut self, policy: ArtifactPolicy) -> Self {
        self.artifact_policy = policy;
        self
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SetupReport {
    pub description: String,
    pub data_description: String,
    pub input_dir: String,
    pub combos: usize,
    pub existing_records: usize,
    pub records_written: usize,
    pub duplicates_skipped: usize,
    pub artifacts_written: usize,
    pub records_per_file: usize,
    pub conf_files: Vec<String>,
    pub keys: Vec<String>,
    pub launch: Option<LaunchOutcome>,
}

/// Describes a sweep without touching the filesystem.
pub fn plan(cfg: &SweepConfig, game: &str) -> SetupResult<(String, String, usize)> {
    cfg.validate()?;
    let payoffs = build_payoffs(&cfg.payoff)?;
    let description = describe(cfg, &payoffs);
    let combos = expand(cfg, &payoffs).total();
    Ok((data_description(game, &description), description, combos))
}

/// Expands the sweep, writes artifacts and `.conf` chunks, and launches the
/// simulator when `cfg.run_now` is set.
pub fn run_setup(cfg: &SweepConfig, ctx: &mut SetupContext) -> SetupResult<SetupReport> {
    cfg.validate()?;
    let payoffs = build_payoffs(&cfg.payoff)?;

    let description = describe(cfg, &payoffs);
    let data_description = data_description(&ctx.game, &description);
    let layout = SweepLayout::new(&ctx.base_dir, &ctx.game, &data_description);
    tracing::info!(%data_description, "preparing sweep");

    ensure_dir(&layout.output_root)?;
    let lock = SweepLock::acquire(&layout.input_dir)?;
    let existing = load_existing(&layout.input_dir)?;

    let combos = expand(cfg, &payoffs);
    let total = combos.total();
    tracing::info!(combos = total, existing = existing.len(), "expanding parameter combinations");

    let mut batch: HashSet<Fingerprint> = HashSet::new();
    let mut records: Vec<ConfigRecord> = Vec::new();
    let mut duplicates_skipped = 0usize;
    let mut artifacts_written = 0usize;
    let mut last_population = None;

    for combo in combos {
        let prepared = prepare(
            combo,
            cfg,
            &ctx.game,
            &data_description,
            ctx.keys.as_mut(),
        );
        last_population = Some(combo.population);
        let fingerprint = Fingerprint::new(&prepared.record, &prepared.artifacts);
        let duplicate = existing.contains(&fingerprint) || batch.contains(&fingerprint);

        if !duplicate || ctx.artifact_policy == ArtifactPolicy::Always {
            write_artifacts(
                &layout.input_dir,
                &prepared.record.key,
                &combo.payoffs,
                combo.bonus,
                &prepared.strategy,
            )?;
            artifacts_written += 1;
        }

        if duplicate {
            tracing::warn!(key = %prepared.record.key, "corresponding input already exists, skipping record");
            duplicates_skipped += 1;
            continue;
        }

        tracing::debug!(key = %prepared.record.key, population = combo.population, "new record");
        batch.insert(fingerprint);
        records.push(prepared.record);
    }

    let records_per_file = last_population.map(chunk_size).unwrap_or(1);
    let chunks = write_conf_chunks(&layout, &records, records_per_file)?;
    drop(lock);

    let launch_outcome = if cfg.run_now {
        Some(launch(&ctx.launcher, &description, cfg.num_seeds, cfg.ruggedness_k))
    } else {
        None
    };

    Ok(SetupReport {
        description,
        data_description,
        input_dir: layout.input_dir.display().to_string(),
        combos: total,
        existing_records: existing.len(),
        records_written: records.len(),
        duplicates_skipped,
        artifacts_written,
        records_per_file,
        conf_files: chunks.iter().map(|c| c.path.display().to_string()).collect(),
        keys: records.into_iter().map(|r| r.key).collect(),
        launch: launch_outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::SequentialKeys;

    #[test]
    fn context_defaults_and_debug_output() {
        let ctx = SetupContext::new(PathBuf::from("/data"))
            .with_keys(SequentialKeys::starting_at(3))
            .with_artifact_policy(ArtifactPolicy::SkipDuplicates);
        assert_eq!(ctx.game, DEFAULT_GAME);
        assert_eq!(ctx.launcher.working_dir, PathBuf::from("/data"));

        let debug = format!("{ctx:?}");
        assert!(debug.contains("SkipDuplicates"));
        assert!(debug.contains("SequentialKeys"));
    }

    #[test]
    fn plan_counts_combos_without_io() {
        let (data_description, description, combos) =
            plan(&SweepConfig::default(), DEFAULT_GAME).unwrap();
        assert_eq!(combos, 2);
        assert_eq!(data_description, format!("HDInnov_{description}"));
    }
}
