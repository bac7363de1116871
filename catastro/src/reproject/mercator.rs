//! Web Mercator (EPSG:3857) et pixels de tuiles
//!
//! Modèle sphérique sur le rayon équatorial, utilisé par les serveurs de
//! tuiles OpenStreetMap.

use std::f64::consts::{FRAC_PI_4, PI};

use super::ellipsoid::WGS84;
use super::Geographic;

/// Latitude maximale représentable
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Géographique vers Web Mercator (mètres)
pub fn geographic_to_web_mercator(geo: Geographic) -> (f64, f64) {
    let r = WGS84.a;
    let lat = geo
        .lat
        .clamp(-MAX_LATITUDE.to_radians(), MAX_LATITUDE.to_radians());

    (r * geo.lon, r * (FRAC_PI_4 + lat / 2.0).tan().ln())
}

/// Web Mercator vers géographique
pub fn web_mercator_to_geographic(x: f64, y: f64) -> Geographic {
    let r = WGS84.a;
    Geographic::new(x / r, 2.0 * (y / r).exp().atan() - PI / 2.0)
}

/// Position en pixels dans le monde à un niveau de zoom donné
///
/// L'origine est le coin nord-ouest; le monde fait `tile_size * 2^zoom` pixels.
pub fn world_pixel(geo: Geographic, zoom: u8, tile_size: u32) -> (f64, f64) {
    let world = f64::from(tile_size) * 2f64.powi(i32::from(zoom));
    let lat = geo
        .lat
        .clamp(-MAX_LATITUDE.to_radians(), MAX_LATITUDE.to_radians());

    let x = (geo.lon + PI) / (2.0 * PI) * world;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * world;
    (x, y)
}

/// Inverse de [`world_pixel`]
pub fn pixel_to_geographic(px: f64, py: f64, zoom: u8, tile_size: u32) -> Geographic {
    let world = f64::from(tile_size) * 2f64.powi(i32::from(zoom));
    let lon = px / world * 2.0 * PI - PI;
    let lat = (PI * (1.0 - 2.0 * py / world)).sinh().atan();
    Geographic::new(lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_mercator_roundtrip() {
        let geo = Geographic::from_degrees(-1.13, 37.98);
        let (x, y) = geographic_to_web_mercator(geo);
        assert!((x - (-125_791.0)).abs() < 100.0, "x={}", x);

        let (lon, lat) = web_mercator_to_geographic(x, y).to_degrees();
        assert!((lon - (-1.13)).abs() < 1e-9);
        assert!((lat - 37.98).abs() < 1e-9);
    }

    #[test]
    fn test_world_pixel_origin_and_centre() {
        let (x, y) = world_pixel(Geographic::from_degrees(0.0, 0.0), 0, 256);
        assert!((x - 128.0).abs() < 1e-9);
        assert!((y - 128.0).abs() < 1e-9);

        let (x, _) = world_pixel(Geographic::from_degrees(-180.0, 0.0), 3, 256);
        assert!(x.abs() < 1e-9);
    }

    #[test]
    fn test_pixel_roundtrip() {
        let geo = Geographic::from_degrees(-1.13, 37.98);
        let (px, py) = world_pixel(geo, 16, 256);
        let (lon, lat) = pixel_to_geographic(px, py, 16, 256).to_degrees();
        assert!((lon - (-1.13)).abs() < 1e-9);
        assert!((lat - 37.98).abs() < 1e-9);
    }
}
