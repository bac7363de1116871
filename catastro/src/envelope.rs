//! Enveloppe de validité des coordonnées d'entrée

use crate::types::Coordinate;
use crate::CatastroError;

/// Rectangle englobant en coordonnées projetées
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// Plage plausible des coordonnées ETRS89 / UTM 30N pour les deux régions
pub const ETRS89_UTM30: Envelope = Envelope {
    min_x: 500_000.0,
    min_y: 4_000_000.0,
    max_x: 800_000.0,
    max_y: 4_800_000.0,
};

impl Envelope {
    /// Bornes incluses
    pub fn contains(&self, coord: &Coordinate) -> bool {
        (self.min_x..=self.max_x).contains(&coord.x) && (self.min_y..=self.max_y).contains(&coord.y)
    }

    /// Rejette toute coordonnée hors enveloppe (ou non finie)
    pub fn validate(&self, coord: &Coordinate) -> Result<(), CatastroError> {
        if coord.x.is_finite() && coord.y.is_finite() && self.contains(coord) {
            Ok(())
        } else {
            Err(CatastroError::OutOfEnvelope {
                x: coord.x,
                y: coord.y,
            })
        }
    }
}
