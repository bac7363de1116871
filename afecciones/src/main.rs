//! Point d'entrée CLI pour afecciones

use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Rapports préliminaires d'affections forestales par parcelle cadastrale
#[derive(Parser)]
#[command(name = "afecciones")]
#[command(author, version)]
#[command(about = "Localiser une parcelle cadastrale et produire son rapport d'affections (carte HTML, PDF)")]
#[command(long_about = "Localise une parcelle rustique (Región de Murcia, Castilla-La Mancha) par coordonnées ETRS89 / UTM 30N \
ou par polygone et parcelle, vérifie les couches WFS d'affections et produit une carte interactive et un rapport PDF.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    load_env();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Localizar {
            region,
            x,
            y,
            provincia,
        } => {
            debug!(%region, x, y, "Localizar");
            cli::cmd_localizar(region, x, y, provincia.as_deref())?;
        }
        Commands::Municipios { region, provincia } => {
            debug!(%region, "Municipios");
            cli::cmd_municipios(region, provincia.as_deref())?;
        }
        Commands::Informe(args) => {
            debug!(region = %args.region, "Informe");
            cli::cmd_informe(args)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
