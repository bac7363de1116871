//! Réglages d'exécution lus depuis l'environnement (.env chargé par le binaire)

use std::path::PathBuf;
use std::time::Duration;

/// Serveur de tuiles par défaut de la carte statique
pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Réglages transverses (HTTP, cache, sorties)
#[derive(Debug, Clone)]
pub struct Settings {
    /// Cache disque des téléchargements (désactivé si absent)
    pub cache_dir: Option<PathBuf>,

    /// Timeout par requête HTTP
    pub http_timeout: Duration,

    /// User-Agent envoyé à tous les services
    pub user_agent: String,

    /// Répertoire des artefacts (carte HTML, rapport PDF)
    pub output_dir: PathBuf,

    /// Logo de l'en-tête du rapport
    pub logo: Option<PathBuf>,

    /// Gabarit d'URL des tuiles (`{z}`, `{x}`, `{y}`)
    pub tile_url: String,

    /// Remplace la date de réglementation du preset
    pub regulation_date: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: None,
            http_timeout: Duration::from_secs(30),
            user_agent: format!("afecciones/{}", env!("CARGO_PKG_VERSION")),
            output_dir: PathBuf::from("."),
            logo: None,
            tile_url: DEFAULT_TILE_URL.to_string(),
            regulation_date: None,
        }
    }
}

impl Settings {
    /// Charge les réglages depuis les variables d'environnement
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Variante testable: `lookup` fournit la valeur d'une variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            cache_dir: non_empty("AFECCIONES_CACHE_DIR").map(PathBuf::from),
            http_timeout: non_empty("AFECCIONES_HTTP_TIMEOUT")
                .and_then(|s| s.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            user_agent: non_empty("AFECCIONES_USER_AGENT").unwrap_or(defaults.user_agent),
            output_dir: non_empty("AFECCIONES_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            logo: non_empty("AFECCIONES_LOGO").map(PathBuf::from),
            tile_url: non_empty("AFECCIONES_TILE_URL").unwrap_or(defaults.tile_url),
            regulation_date: non_empty("AFECCIONES_FECHA_NORMATIVA"),
        }
    }
}
