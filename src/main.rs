use anyhow::{Context, Result};
use clap::Parser;
use netgame_setup::config::SweepConfig;
use netgame_setup::keys::RandomKeys;
use netgame_setup::launcher::LaunchConfig;
use netgame_setup::payoffs::{PayoffArchetype, PayoffSpec};
use netgame_setup::setup::{plan, run_setup, ArtifactPolicy, SetupContext};
use netgame_setup::util::{parse_f64_csv, parse_u32_csv, read_env_path};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "netgame-setup")]
#[command(allow_negative_numbers = true)]
#[command(
    about = "Generate hawk/dove network-game input sweeps and optionally launch the simulator"
)]
struct Cli {
    /// Dove-vs-hawk payoff (normalized so hawk-vs-dove is 1)
    dh: f64,
    /// Dove-vs-dove payoff
    dd: f64,
    /// Full sweep configuration as JSON; positional payoffs still apply to User/grid archetypes
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding `<Game>_Input` and `<Game>_Output_Data` (env: NETGAME_BASE_DIR)
    #[arg(long)]
    base_dir: Option<PathBuf>,
    /// Payoff archetype: User, HawkDove, HawkDoveGrid, StagHunt, PrisonersDilemma
    #[arg(long)]
    archetype: Option<String>,
    /// Comma-separated population sizes
    #[arg(long)]
    population: Option<String>,
    /// Comma-separated coupling bonus fractions
    #[arg(long)]
    bonus_fractions: Option<String>,
    /// Coupling effect name (Fight, FightSplit, FightRand, StagHunt, FSH, None)
    #[arg(long)]
    couple_effect: Option<String>,
    /// Launch the simulator and plot script after writing inputs
    #[arg(long, default_value_t = false)]
    run_now: bool,
    #[arg(long)]
    num_seeds: Option<u32>,
    /// Only write payoff/strategy files for combinations that get a `.conf` row
    #[arg(long, default_value_t = false)]
    skip_duplicate_artifacts: bool,
    /// Print the sweep description and combination count without writing anything
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Seed for reproducible record keys
    #[arg(long)]
    key_seed: Option<u64>,
    /// Write the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = resolve_config(&cli)?;
    let game = netgame_setup::config::DEFAULT_GAME;

    if cli.dry_run {
        let (data_description, description, combos) = plan(&cfg, game)?;
        println!("description={description}");
        println!("data_description={data_description}");
        println!("combos={combos}");
        return Ok(());
    }

    let base_dir = cli
        .base_dir
        .clone()
        .or_else(|| read_env_path("NETGAME_BASE_DIR"))
        .unwrap_or_else(|| PathBuf::from("."));

    let mut ctx = SetupContext::new(base_dir.clone());
    ctx.launcher = LaunchConfig::new(base_dir).with_env_overrides();
    if let Some(seed) = cli.key_seed {
        ctx = ctx.with_keys(RandomKeys::seeded(seed));
    }
    if cli.skip_duplicate_artifacts {
        ctx = ctx.with_artifact_policy(ArtifactPolicy::SkipDuplicates);
    }

    let report = run_setup(&cfg, &mut ctx)?;

    println!("description={}", report.description);
    println!("input_dir={}", report.input_dir);
    println!("combos={}", report.combos);
    println!("existing_records={}", report.existing_records);
    println!("records_written={}", report.records_written);
    println!("duplicates_skipped={}", report.duplicates_skipped);
    println!("artifacts_written={}", report.artifacts_written);
    println!("records_per_file={}", report.records_per_file);
    for conf in &report.conf_files {
        println!("conf={conf}");
    }
    if let Some(launch) = &report.launch {
        println!(
            "simulator_exit={}",
            launch
                .simulator_exit
                .map(|code| code.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        println!(
            "plot_exit={}",
            launch
                .plot_exit
                .map(|code| code.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
    }

    if let Some(path) = &cli.report {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let encoded = serde_json::to_vec_pretty(&report)?;
        fs::write(path, encoded)
            .with_context(|| format!("failed writing report {}", path.display()))?;
        println!("report={}", path.display());
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<SweepConfig> {
    let mut cfg = match &cli.config {
        Some(path) => SweepConfig::from_json_file(path)?,
        None => SweepConfig::default(),
    };

    let from_file = cli.config.is_some();
    match cli.archetype.as_deref() {
        Some(name) => cfg.payoff = PayoffSpec::from_name(name, cli.dh, cli.dd)?,
        None if !from_file => {
            cfg.payoff = PayoffSpec::from_name(PayoffArchetype::User.as_str(), cli.dh, cli.dd)?
        }
        None => {}
    }

    if let Some(raw) = &cli.population {
        cfg.population = parse_u32_csv(raw, "population")?;
    }
    if let Some(raw) = &cli.bonus_fractions {
        cfg.bonus_fractions = parse_f64_csv(raw, "bonus-fractions")?;
    }
    if let Some(name) = &cli.couple_effect {
        cfg.couple_effect = name.parse()?;
    }
    if let Some(num_seeds) = cli.num_seeds {
        cfg.num_seeds = num_seeds;
    }
    if cli.run_now {
        cfg.run_now = true;
    }

    Ok(cfg)
}
