use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use warband::{GeneratorBuilder, SetupLoader};

#[derive(Debug, Parser)]
#[command(author, version, about = "Generate army rosters and starting positions")]
struct Cli {
    /// Path to the battle setup YAML file
    #[arg(long, default_value = "setups/border_skirmish.yaml")]
    setup: PathBuf,

    /// Override the setup's seed
    #[arg(long)]
    seed: Option<u64>,

    /// Pretty-print the JSON roster
    #[arg(long)]
    pretty: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warband=info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .with_context(|| format!("Invalid log filter '{}'", cli.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let loader = SetupLoader::new(".");
    let setup = loader.load(&cli.setup)?;
    let seed = cli.seed.unwrap_or(setup.seed);

    let mut generator = GeneratorBuilder::from_setup(setup).with_seed(seed).build();
    let roster = generator.generate()?;

    for team in roster.summary() {
        tracing::info!(
            team = team.team_id,
            army = %team.army_name,
            units = team.units,
            power = team.power,
            bosses = team.bosses,
            "team ready"
        );
    }

    let json = if cli.pretty {
        serde_json::to_string_pretty(&roster)?
    } else {
        serde_json::to_string(&roster)?
    };
    println!("{json}");
    Ok(())
}
