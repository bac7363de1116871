//! Reprojection en Rust pur
//!
//! Systèmes gérés:
//! - ETRS89 / UTM zones 28 à 31 nord (EPSG:25828..25831), système de travail 25830
//! - WGS84 / UTM zones 28 à 31 (EPSG:32628..32631 nord, 32728..32731 sud)
//! - Géographique ETRS89 / WGS84 (EPSG:4258, EPSG:4326)
//! - Web Mercator (EPSG:3857)
//!
//! ETRS89 et WGS84 sont confondus (écart de l'ordre du mètre, sans effet à
//! l'échelle de la parcelle).

mod ellipsoid;
pub mod mercator;
mod utm;

pub use ellipsoid::{Ellipsoid, GRS80, WGS84};

use geo::{Coord, MapCoords};

use crate::CatastroError;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés (lon, lat)
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Famille de système de coordonnées
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Crs {
    Utm {
        zone: u32,
        south: bool,
        ellipsoid: Ellipsoid,
    },
    Geographic,
    WebMercator,
}

impl Crs {
    /// Système correspondant à un code EPSG, s'il est géré
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        match epsg {
            25828..=25831 => Some(Self::Utm {
                zone: epsg - 25800,
                south: false,
                ellipsoid: GRS80,
            }),
            32628..=32631 => Some(Self::Utm {
                zone: epsg - 32600,
                south: false,
                ellipsoid: WGS84,
            }),
            32728..=32731 => Some(Self::Utm {
                zone: epsg - 32700,
                south: true,
                ellipsoid: WGS84,
            }),
            4258 | 4326 => Some(Self::Geographic),
            3857 => Some(Self::WebMercator),
            _ => None,
        }
    }

    fn unproject(self, x: f64, y: f64) -> Geographic {
        match self {
            Self::Utm {
                zone,
                south,
                ellipsoid,
            } => utm::utm_to_geographic(x, y, zone, south, &ellipsoid),
            Self::Geographic => Geographic::from_degrees(x, y),
            Self::WebMercator => mercator::web_mercator_to_geographic(x, y),
        }
    }

    fn project(self, geo: Geographic) -> (f64, f64) {
        match self {
            Self::Utm {
                zone,
                south,
                ellipsoid,
            } => utm::geographic_to_utm(geo, zone, south, &ellipsoid),
            Self::Geographic => geo.to_degrees(),
            Self::WebMercator => mercator::geographic_to_web_mercator(geo),
        }
    }
}

/// Reprojection entre deux systèmes gérés
///
/// Les coordonnées géographiques sont toujours dans l'ordre (lon, lat) en degrés.
#[derive(Debug, Clone, Copy)]
pub struct Reprojector {
    source_epsg: u32,
    target_epsg: u32,
    source: Crs,
    target: Crs,
}

impl Reprojector {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, CatastroError> {
        match (Crs::from_epsg(source_epsg), Crs::from_epsg(target_epsg)) {
            (Some(source), Some(target)) => Ok(Self {
                source_epsg,
                target_epsg,
                source,
                target,
            }),
            _ => Err(CatastroError::UnsupportedReprojection {
                source_epsg,
                target_epsg,
            }),
        }
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source_epsg: u32, target_epsg: u32) -> bool {
        Crs::from_epsg(source_epsg).is_some() && Crs::from_epsg(target_epsg).is_some()
    }

    /// Vrai si source et cible sont le même système
    pub fn is_identity(&self) -> bool {
        self.source_epsg == self.target_epsg
    }

    pub fn source_epsg(&self) -> u32 {
        self.source_epsg
    }

    pub fn target_epsg(&self) -> u32 {
        self.target_epsg
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        if self.is_identity() {
            return (x, y);
        }
        self.target.project(self.source.unproject(x, y))
    }

    /// Transforme toute géométrie `geo` (Point, Polygon, MultiPolygon, Geometry...)
    pub fn transform<G>(&self, geometry: &G) -> <G as MapCoords<f64, f64>>::Output
    where
        G: MapCoords<f64, f64>,
    {
        geometry.map_coords(|c: Coord<f64>| {
            let (x, y) = self.transform_point(c.x, c.y);
            Coord { x, y }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Polygon};

    #[test]
    fn test_utm30_to_wgs84() {
        let reproj = Reprojector::new(25830, 4326).unwrap();
        let (lon, lat) = reproj.transform_point(664_000.0, 4_205_000.0);
        assert!((lon - (-1.13)).abs() < 0.02, "lon={}", lon);
        assert!((lat - 37.98).abs() < 0.02, "lat={}", lat);
    }

    #[test]
    fn test_zone_change() {
        // Un point de la zone 29 ramené en zone 30 se retrouve à l'ouest du méridien -3
        let reproj = Reprojector::new(25829, 25830).unwrap();
        let (x, _) = reproj.transform_point(700_000.0, 4_300_000.0);
        assert!(x < 500_000.0, "x={}", x);
    }

    #[test]
    fn test_geometry_roundtrip() {
        let square: Polygon<f64> = polygon![
            (x: 600_000.0, y: 4_200_000.0),
            (x: 600_100.0, y: 4_200_000.0),
            (x: 600_100.0, y: 4_200_100.0),
            (x: 600_000.0, y: 4_200_100.0),
            (x: 600_000.0, y: 4_200_000.0),
        ];
        let forward = Reprojector::new(25830, 4326).unwrap();
        let back = Reprojector::new(4326, 25830).unwrap();

        let wgs = forward.transform(&square);
        assert!(wgs.exterior().0[0].x < 0.0);

        let again = back.transform(&wgs);
        for (a, b) in square.exterior().coords().zip(again.exterior().coords()) {
            assert!((a.x - b.x).abs() < 0.01 && (a.y - b.y).abs() < 0.01);
        }
    }

    #[test]
    fn test_identity() {
        let reproj = Reprojector::new(25830, 25830).unwrap();
        assert!(reproj.is_identity());
        assert_eq!(reproj.transform_point(1.0, 2.0), (1.0, 2.0));
    }

    #[test]
    fn test_unsupported_epsg() {
        assert!(Reprojector::new(23030, 25830).is_err());
        assert!(!Reprojector::is_supported(25830, 2154));
    }
}
