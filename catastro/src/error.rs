//! Types d'erreurs pour le crate catastro

use thiserror::Error;

/// Erreurs pouvant survenir lors du chargement d'un jeu cadastral
#[derive(Debug, Error)]
pub enum CatastroError {
    /// Erreur d'I/O lors de la matérialisation ou de la lecture
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fichier annexe manquant dans le jeu shapefile
    #[error("Missing required file: {0}")]
    MissingFile(String),

    /// Shapefile illisible
    #[error("Shapefile error in {file}: {reason}")]
    Shapefile { file: String, reason: String },

    /// Forme non polygonale rencontrée (ignorée)
    #[error("Unsupported shape #{index}: {shape_type}")]
    UnsupportedShape { index: usize, shape_type: String },

    /// Projection du .prj non reconnue
    #[error("Unknown projection: {0}")]
    UnknownProjection(String),

    /// Couple de systèmes non géré par la reprojection
    #[error("Unsupported reprojection EPSG:{source_epsg} -> EPSG:{target_epsg}")]
    UnsupportedReprojection { source_epsg: u32, target_epsg: u32 },

    /// Coordonnées hors de l'enveloppe plausible
    #[error("Coordinates out of range for ETRS89 UTM zone 30: X={x}, Y={y}")]
    OutOfEnvelope { x: f64, y: f64 },
}

impl CatastroError {
    /// Crée une erreur shapefile avec contexte
    pub fn shapefile(file: impl Into<String>, reason: impl ToString) -> Self {
        Self::Shapefile {
            file: file.into(),
            reason: reason.to_string(),
        }
    }
}
