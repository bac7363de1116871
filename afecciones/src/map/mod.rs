//! Cartes: page HTML interactive (Leaflet) et vignette PNG pour le rapport

pub mod geojson;
pub mod interactive;
pub mod static_map;

pub use interactive::{render_interactive, write_interactive};
pub use static_map::{render_static, StaticMap, StaticMapRequest};

use catastro::reproject::Reprojector;
use catastro::{CatastroError, Coordinate, ETRS89_UTM30, WORKING_EPSG};

/// Code EPSG des coordonnées géographiques WGS84
pub const WGS84_EPSG: u32 = 4326;

/// Coordonnée de travail en (lon, lat) WGS84, après contrôle de l'enveloppe
pub fn to_geographic(coordinate: Coordinate) -> Result<(f64, f64), CatastroError> {
    ETRS89_UTM30.validate(&coordinate)?;
    let reprojector = Reprojector::new(WORKING_EPSG, WGS84_EPSG)?;
    Ok(reprojector.transform_point(coordinate.x, coordinate.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_geographic_murcia() {
        let (lon, lat) = to_geographic(Coordinate::new(660_000.0, 4_190_000.0)).unwrap();
        assert!((-1.3..=-1.1).contains(&lon), "lon = {}", lon);
        assert!((37.8..=37.9).contains(&lat), "lat = {}", lat);
    }

    #[test]
    fn test_to_geographic_rejects_out_of_envelope() {
        assert!(to_geographic(Coordinate::new(0.0, 0.0)).is_err());
    }
}
