//! Définition et implémentation des commandes CLI
//!
//! - `localizar`: sélecteur seul (coordonnées → polygone / parcelle)
//! - `municipios`: liste des municipalités d'une région ou d'une province
//! - `informe`: parcours complet jusqu'à la carte HTML et au rapport PDF
//!
//! Les issues métier (parcelle introuvable, formulaire incomplet) sont
//! affichées en message; seules les erreurs d'environnement sortent en erreur.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use tracing::info;

use afecciones::locator::LocatedParcel;
use afecciones::municipalities::list_municipalities;
use afecciones::workflow::{validate_applicant, validate_request};
use afecciones::{
    Applicant, Diagnostics, Fetcher, Locator, Region, RegionConfig, Session, Settings, Workflow,
};
use catastro::Coordinate;

#[derive(Subcommand)]
pub enum Commands {
    /// Locate the parcel containing an ETRS89 / UTM 30N coordinate
    Localizar {
        /// Region: murcia, castilla-la-mancha
        #[arg(long)]
        region: Region,

        /// X coordinate (metres, EPSG:25830)
        #[arg(long, allow_negative_numbers = true)]
        x: f64,

        /// Y coordinate (metres, EPSG:25830)
        #[arg(long)]
        y: f64,

        /// Restrict the scan to one province (Castilla-La Mancha)
        #[arg(long)]
        provincia: Option<String>,
    },

    /// List the municipalities of a region or province
    Municipios {
        /// Region: murcia, castilla-la-mancha
        #[arg(long)]
        region: Region,

        /// Province (required for Castilla-La Mancha)
        #[arg(long)]
        provincia: Option<String>,
    },

    /// Run the full request: locate, check affections, write map and PDF report
    Informe(InformeArgs),
}

#[derive(Args)]
pub struct InformeArgs {
    /// Region: murcia, castilla-la-mancha
    #[arg(long)]
    pub region: Region,

    /// X coordinate (metres, EPSG:25830)
    #[arg(long, requires = "y", conflicts_with = "municipio", allow_negative_numbers = true)]
    pub x: Option<f64>,

    /// Y coordinate (metres, EPSG:25830)
    #[arg(long, requires = "x")]
    pub y: Option<f64>,

    /// Province (Castilla-La Mancha)
    #[arg(long)]
    pub provincia: Option<String>,

    /// Municipality, for direct selection
    #[arg(long, requires_all = ["poligono", "parcela"])]
    pub municipio: Option<String>,

    /// Polygon number (MASA)
    #[arg(long)]
    pub poligono: Option<String>,

    /// Parcel number (PARCELA)
    #[arg(long)]
    pub parcela: Option<String>,

    /// Applicant first name
    #[arg(long)]
    pub nombre: Option<String>,

    /// Applicant surnames
    #[arg(long)]
    pub apellidos: Option<String>,

    /// Applicant national id
    #[arg(long)]
    pub dni: Option<String>,

    #[arg(long)]
    pub direccion: Option<String>,

    #[arg(long)]
    pub telefono: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    /// Purpose of the request
    #[arg(long)]
    pub objeto: Option<String>,

    /// Output directory for the HTML map and the PDF report (default: env AFECCIONES_OUTPUT_DIR, else the current directory)
    #[arg(long)]
    pub salida: Option<PathBuf>,

    /// Header logo (default: env AFECCIONES_LOGO)
    #[arg(long)]
    pub logo: Option<PathBuf>,

    /// Regulation cut-off date printed in the report (default: region preset)
    #[arg(long)]
    pub fecha_normativa: Option<String>,

    /// JSON file replacing the preset's affection layer catalog
    #[arg(long)]
    pub catalogo: Option<PathBuf>,

    /// Download cache directory (default: env AFECCIONES_CACHE_DIR)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Tile URL template for the static map, with {z}/{x}/{y}
    #[arg(long)]
    pub tiles: Option<String>,

    /// Write warnings and errors to this JSON file
    #[arg(long)]
    pub avisos: Option<PathBuf>,
}

impl InformeArgs {
    fn applicant(&self) -> Applicant {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        Applicant {
            nombre: field(&self.nombre),
            apellidos: field(&self.apellidos),
            dni: field(&self.dni),
            direccion: field(&self.direccion),
            telefono: field(&self.telefono),
            email: field(&self.email),
            objeto: field(&self.objeto),
        }
    }

    /// Réglages d'environnement, surchargés par les options
    fn settings(&self) -> Settings {
        let mut settings = Settings::from_env();
        if let Some(dir) = &self.salida {
            settings.output_dir = dir.clone();
        }
        if let Some(logo) = &self.logo {
            settings.logo = Some(logo.clone());
        }
        if let Some(date) = &self.fecha_normativa {
            settings.regulation_date = Some(date.clone());
        }
        if let Some(dir) = &self.cache_dir {
            settings.cache_dir = Some(dir.clone());
        }
        if let Some(tiles) = &self.tiles {
            settings.tile_url = tiles.clone();
        }
        settings
    }
}

fn region_config(region: Region, catalog: Option<&Path>) -> Result<RegionConfig> {
    let config = RegionConfig::from_preset(region)?;
    match catalog {
        Some(path) => config.with_catalog_file(path),
        None => Ok(config),
    }
}

fn fetcher(settings: &Settings) -> Result<Fetcher> {
    Fetcher::from_settings(settings).context("Failed to build HTTP client")
}

fn print_parcel(parcel: &LocatedParcel) {
    let reference = &parcel.reference;
    println!("Municipio: {}", reference.municipality);
    if let Some(province) = &reference.province {
        println!("Provincia: {}", province);
    }
    println!("Polígono:  {}", reference.masa);
    println!("Parcela:   {}", reference.parcela);
    println!(
        "Coordenadas (EPSG:25830): {:.2}, {:.2}",
        parcel.coordinate.x, parcel.coordinate.y
    );
}

/// Exécute la commande localizar
pub fn cmd_localizar(region: Region, x: f64, y: f64, provincia: Option<&str>) -> Result<()> {
    let settings = Settings::from_env();
    let config = RegionConfig::from_preset(region)?;
    let fetcher = fetcher(&settings)?;

    match Locator::new(&fetcher, &config).locate(Coordinate::new(x, y), provincia) {
        Ok(parcel) => print_parcel(&parcel),
        Err(e) => println!("{}", e),
    }
    Ok(())
}

/// Exécute la commande municipios
pub fn cmd_municipios(region: Region, provincia: Option<&str>) -> Result<()> {
    let settings = Settings::from_env();
    let config = RegionConfig::from_preset(region)?;
    let fetcher = fetcher(&settings)?;

    match list_municipalities(&fetcher, &config, provincia) {
        Ok(names) => {
            for name in &names {
                println!("{}", name);
            }
            info!(count = names.len(), "Municipalities listed");
        }
        Err(e) => println!("{}", e),
    }
    Ok(())
}

/// Exécute la commande informe
pub fn cmd_informe(args: InformeArgs) -> Result<()> {
    // Formulaire contrôlé avant tout accès réseau
    let applicant = args.applicant();
    let checked = match (args.x, args.y) {
        (Some(x), Some(y)) => validate_request(&applicant, Coordinate::new(x, y)),
        _ => validate_applicant(&applicant),
    };
    if let Err(e) = checked {
        println!("{}", e);
        return Ok(());
    }

    let settings = args.settings();
    std::fs::create_dir_all(&settings.output_dir).with_context(|| {
        format!("Failed to create output directory {}", settings.output_dir.display())
    })?;
    let config = region_config(args.region, args.catalogo.as_deref())?;
    let fetcher = fetcher(&settings)?;
    let workflow = Workflow::new(&config, &settings, &fetcher);
    let mut session = Session::new();

    let provincia = args.provincia.as_deref();
    let located = match (args.x, args.y, &args.municipio) {
        (Some(x), Some(y), _) => workflow.locate(&mut session, Coordinate::new(x, y), provincia),
        (_, _, Some(municipio)) => workflow.select(
            &mut session,
            provincia,
            municipio,
            args.poligono.as_deref().unwrap_or_default(),
            args.parcela.as_deref().unwrap_or_default(),
            None,
        ),
        _ => bail!("Either --x/--y or --municipio/--poligono/--parcela is required"),
    };
    if let Err(e) = located {
        println!("{}", e);
        return Ok(());
    }
    if let Some(parcel) = session.parcel() {
        print_parcel(parcel);
    }

    let mut diagnostics = Diagnostics::new();
    let today = chrono::Local::now().date_naive();
    match workflow.submit(&mut session, &applicant, today, &mut diagnostics) {
        Ok(outcome) => {
            println!();
            for result in &outcome.results {
                println!("- {}: {}", result.name, result.text());
            }
            println!();
            println!("Mapa:    {}", outcome.map_html.display());
            println!("Informe: {}", outcome.report_pdf.display());
        }
        Err(e) => println!("{}", e),
    }

    diagnostics.display();
    if let Some(path) = &args.avisos {
        diagnostics.save_to_file(path)?;
    }
    info!(summary = %diagnostics.summary(), "Request finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Command, FromArgMatches};

    #[test]
    fn test_help_strings_are_english() {
        let root = Commands::augment_subcommands(Command::new("afecciones"));
        for command in root.get_subcommands() {
            for arg in command.get_arguments() {
                let help = arg.get_help().map(ToString::to_string).unwrap_or_default();
                assert!(!help.contains("défaut"), "{}: {}", arg.get_id(), help);
                assert!(!help.contains(" :"), "{}: {}", arg.get_id(), help);
            }
        }
    }

    #[test]
    fn test_informe_overrides_settings() {
        let root = Commands::augment_subcommands(Command::new("afecciones"));
        let matches = root
            .try_get_matches_from([
                "afecciones",
                "informe",
                "--region",
                "murcia",
                "--x",
                "660100",
                "--y",
                "4190100",
                "--salida",
                "out",
                "--fecha-normativa",
                "1 de enero de 2026",
            ])
            .unwrap();
        let Commands::Informe(args) = Commands::from_arg_matches(&matches).unwrap() else {
            panic!("expected informe");
        };

        let settings = args.settings();
        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert_eq!(settings.regulation_date.as_deref(), Some("1 de enero de 2026"));
        assert!(args.applicant().nombre.is_empty());
    }
}
