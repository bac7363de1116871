//! Définitions des ellipsoïdes

/// Ellipsoïde de révolution (demi-grand axe, aplatissement)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Demi-grand axe en mètres
    pub a: f64,

    /// Aplatissement
    pub f: f64,
}

/// GRS80, ellipsoïde d'ETRS89
pub const GRS80: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    f: 1.0 / 298.257222101,
};

/// WGS84 (écart avec GRS80 inférieur au millimètre)
pub const WGS84: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    f: 1.0 / 298.257223563,
};

impl Ellipsoid {
    /// Première excentricité au carré
    pub fn e2(&self) -> f64 {
        self.f * (2.0 - self.f)
    }

    /// Première excentricité
    pub fn e(&self) -> f64 {
        self.e2().sqrt()
    }

    /// Troisième aplatissement n = f / (2 - f)
    pub fn n(&self) -> f64 {
        self.f / (2.0 - self.f)
    }
}
