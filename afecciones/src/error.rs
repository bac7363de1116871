//! Types d'erreurs pour le crate afecciones

use thiserror::Error;

/// Erreurs de téléchargement (HTTP ou cache disque)
#[derive(Debug, Error)]
pub enum FetchError {
    /// Réponse HTTP non 2xx
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Erreur réseau (connexion, timeout, corps illisible)
    #[error("Transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// Construction du client impossible
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl FetchError {
    pub fn transport(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transport {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Statuts relancés: 429 et erreurs serveur 500/502/503/504, plus les erreurs réseau
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::Transport { .. } => true,
            Self::Client(_) => false,
        }
    }
}

/// Erreurs de localisation d'une parcelle
#[derive(Debug, Error)]
pub enum LocateError {
    /// Coordonnées hors enveloppe ETRS89 / UTM 30N
    #[error(transparent)]
    InvalidCoordinate(#[from] catastro::CatastroError),

    /// Aucune parcelle ne contient le point
    #[error("No parcel found at X={x}, Y={y}")]
    NotFound { x: f64, y: f64 },

    /// Province inconnue pour la région
    #[error("Unknown province: {0}")]
    UnknownProvince(String),

    /// Région à provinces sans province choisie
    #[error("A province is required for {0}")]
    MissingProvince(String),

    /// Municipalité inconnue pour la région
    #[error("Unknown municipality: {0}")]
    UnknownMunicipality(String),

    /// Liste des municipalités indisponible
    #[error("Municipality listing failed for {province}: {reason}")]
    Listing { province: String, reason: String },

    /// Parcelle absente du jeu cadastral (sélection directe)
    #[error("Parcel {masa}/{parcela} not found in {municipality}")]
    ParcelNotFound {
        municipality: String,
        masa: String,
        parcela: String,
    },

    /// Jeu cadastral d'une municipalité illisible (sélection directe)
    #[error("Cadastre unavailable for {municipality}: {reason}")]
    Cadastre { municipality: String, reason: String },
}

impl LocateError {
    pub fn listing(province: impl Into<String>, reason: impl ToString) -> Self {
        Self::Listing {
            province: province.into(),
            reason: reason.to_string(),
        }
    }

    pub fn cadastre(municipality: impl Into<String>, reason: impl ToString) -> Self {
        Self::Cadastre {
            municipality: municipality.into(),
            reason: reason.to_string(),
        }
    }
}

/// Erreurs de la carte statique
#[derive(Debug, Error)]
pub enum MapError {
    /// Coordonnées hors enveloppe
    #[error(transparent)]
    Coordinate(#[from] catastro::CatastroError),

    /// Tuile indisponible
    #[error("Tile fetch failed: {0}")]
    Tile(#[from] FetchError),

    /// Tuile ou image illisible
    #[error("Image error: {0}")]
    Image(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Erreurs du parcours Selector → Formulaire → Rapport
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Champ obligatoire vide
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Coordonnées nulles ou hors enveloppe
    #[error("Invalid coordinates: X={x}, Y={y}")]
    InvalidCoordinates { x: f64, y: f64 },

    /// Accès direct à une page sans parcelle localisée
    #[error("No located parcel in session, back to selector")]
    NoParcel,

    /// Localisation impossible
    #[error(transparent)]
    Locate(#[from] LocateError),

    /// Écriture d'un artefact (carte, rapport)
    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkflowError {
    pub fn artifact(reason: impl ToString) -> Self {
        Self::Artifact(reason.to_string())
    }
}
