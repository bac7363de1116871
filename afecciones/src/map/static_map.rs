//! Vignette PNG (mosaïque de tuiles + marqueur rouge) pour le rapport

use std::path::{Path, PathBuf};

use image::{imageops, ImageFormat, Rgba, RgbaImage};
use tempfile::TempDir;
use tracing::debug;

use catastro::reproject::{mercator, Geographic};
use catastro::Coordinate;

use super::to_geographic;
use crate::error::MapError;
use crate::http::{FetchPolicy, Fetcher};

/// Taille des tuiles du serveur
pub const TILE_SIZE: u32 = 256;

/// Diamètre du marqueur en pixels
const MARKER_DIAMETER: f64 = 12.0;

const MARKER_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Paramètres de la vignette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticMapRequest {
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
}

impl Default for StaticMapRequest {
    fn default() -> Self {
        Self {
            zoom: 16,
            width: 800,
            height: 600,
        }
    }
}

/// Image écrite dans un répertoire temporaire, supprimé avec la valeur
#[derive(Debug)]
pub struct StaticMap {
    _dir: TempDir,
    path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl StaticMap {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Compose la vignette centrée sur `coordinate` (EPSG:25830)
///
/// Toute tuile indisponible fait échouer le rendu.
pub fn render_static(
    fetcher: &Fetcher,
    tile_url: &str,
    coordinate: Coordinate,
    request: StaticMapRequest,
) -> Result<StaticMap, MapError> {
    let (lon, lat) = to_geographic(coordinate)?;
    let (cx, cy) = mercator::world_pixel(Geographic::from_degrees(lon, lat), request.zoom, TILE_SIZE);

    let left = cx - f64::from(request.width) / 2.0;
    let top = cy - f64::from(request.height) / 2.0;
    let tiles_per_axis = 1i64 << request.zoom.min(30);
    let size = f64::from(TILE_SIZE);

    let mut canvas = RgbaImage::from_pixel(request.width, request.height, BACKGROUND);

    let tx_range = (left / size).floor() as i64..=((left + f64::from(request.width) - 1.0) / size).floor() as i64;
    let ty_range = (top / size).floor() as i64..=((top + f64::from(request.height) - 1.0) / size).floor() as i64;

    let mut fetched = 0usize;
    for ty in ty_range {
        if ty < 0 || ty >= tiles_per_axis {
            continue;
        }
        for tx in tx_range.clone() {
            let url = tile_url
                .replace("{z}", &request.zoom.to_string())
                .replace("{x}", &tx.rem_euclid(tiles_per_axis).to_string())
                .replace("{y}", &ty.to_string());
            let bytes = fetcher.fetch(&url, FetchPolicy::TILE)?;
            let tile = image::load_from_memory(&bytes)
                .map_err(|e| MapError::Image(format!("{}: {}", url, e)))?
                .to_rgba8();

            let x = (tx as f64 * size - left).round() as i64;
            let y = (ty as f64 * size - top).round() as i64;
            imageops::overlay(&mut canvas, &tile, x, y);
            fetched += 1;
        }
    }

    draw_marker(&mut canvas, cx - left, cy - top);

    let dir = tempfile::Builder::new().prefix("afecciones-mapa-").tempdir()?;
    let path = dir.path().join("mapa.png");
    canvas
        .save_with_format(&path, ImageFormat::Png)
        .map_err(|e| MapError::Image(e.to_string()))?;

    debug!(tiles = fetched, path = %path.display(), "Static map rendered");
    Ok(StaticMap {
        _dir: dir,
        path,
        width: request.width,
        height: request.height,
    })
}

/// Disque plein centré sur (x, y)
fn draw_marker(canvas: &mut RgbaImage, x: f64, y: f64) {
    let radius = MARKER_DIAMETER / 2.0;
    let x_min = (x - radius).floor().max(0.0) as u32;
    let y_min = (y - radius).floor().max(0.0) as u32;
    let x_max = ((x + radius).ceil() as u32).min(canvas.width());
    let y_max = ((y + radius).ceil() as u32).min(canvas.height());

    for py in y_min..y_max {
        for px in x_min..x_max {
            let dx = f64::from(px) + 0.5 - x;
            let dy = f64::from(py) + 0.5 - y;
            if dx * dx + dy * dy <= radius * radius {
                canvas.put_pixel(px, py, MARKER_COLOR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Routes;
    use std::io::Cursor;

    fn green_tile() -> Vec<u8> {
        let tile = RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgba([0, 128, 0, 255]));
        let mut bytes = Cursor::new(Vec::new());
        tile.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_static_map_mosaic_and_marker() {
        let routes = Routes::new().fallback(200, green_tile());
        let log = routes.log();
        let fetcher = routes.into_fetcher();

        let map = render_static(
            &fetcher,
            "https://tiles.example.org/{z}/{x}/{y}.png",
            Coordinate::new(660_000.0, 4_190_000.0),
            StaticMapRequest::default(),
        )
        .unwrap();

        let image = image::open(map.path()).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (800, 600));
        assert_eq!(*image.get_pixel(400, 300), MARKER_COLOR);
        assert_eq!(*image.get_pixel(10, 10), Rgba([0, 128, 0, 255]));

        // 800x600 couvre 4 ou 5 colonnes et 3 ou 4 lignes de tuiles
        let count = log.borrow().len();
        assert!((12..=20).contains(&count), "tiles = {}", count);
        assert!(log.borrow().iter().all(|u| u.starts_with("https://tiles.example.org/16/")));
    }

    #[test]
    fn test_tile_failure_is_an_error() {
        let fetcher = Routes::new().into_fetcher();
        let result = render_static(
            &fetcher,
            "https://tiles.example.org/{z}/{x}/{y}.png",
            Coordinate::new(660_000.0, 4_190_000.0),
            StaticMapRequest::default(),
        );
        assert!(matches!(result, Err(MapError::Tile(_))));
    }

    #[test]
    fn test_out_of_envelope_is_an_error() {
        let fetcher = Routes::new().into_fetcher();
        let result = render_static(&fetcher, "{z}/{x}/{y}", Coordinate::new(1.0, 1.0), StaticMapRequest::default());
        assert!(matches!(result, Err(MapError::Coordinate(_))));
    }

    #[test]
    fn test_marker_is_clipped_at_edges() {
        let mut canvas = RgbaImage::from_pixel(20, 20, BACKGROUND);
        draw_marker(&mut canvas, 0.0, 0.0);
        assert_eq!(*canvas.get_pixel(0, 0), MARKER_COLOR);
        assert_eq!(*canvas.get_pixel(19, 19), BACKGROUND);
    }
}
