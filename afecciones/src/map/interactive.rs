//! Carte HTML interactive (Leaflet)
//!
//! Page autonome: fond OpenStreetMap, marqueur au point, contour de la
//! parcelle en tirets bleus, couches WMS de référence avec contrôle de
//! couches, légende et un marqueur par résultat d'affection.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geo::MultiPolygon;
use tracing::debug;

use catastro::reproject::Reprojector;
use catastro::WORKING_EPSG;

use super::geojson::parcel_collection;
use super::WGS84_EPSG;
use crate::config::MapConfig;
use crate::session::artifact_file_name;

/// Niveau de zoom initial
pub const INITIAL_ZOOM: u8 = 16;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

/// Construit la page HTML
///
/// `parcel` est en EPSG:25830, reprojetée en WGS84 pour l'affichage.
/// `properties` (ex: MASA, PARCELA) alimentent le popup de la parcelle.
pub fn render_interactive(
    lon: f64,
    lat: f64,
    parcel: Option<&MultiPolygon<f64>>,
    properties: &[(&str, &str)],
    labels: &[String],
    map: &MapConfig,
) -> Result<String> {
    let parcel_json = match parcel {
        Some(geometry) if !geometry.0.is_empty() => {
            let reprojector = Reprojector::new(WORKING_EPSG, WGS84_EPSG)?;
            let escaped: Vec<(&str, String)> = properties
                .iter()
                .map(|(key, value)| (*key, html_escape(value)))
                .collect();
            let escaped: Vec<(&str, &str)> = escaped.iter().map(|(k, v)| (*k, v.as_str())).collect();
            Some(parcel_collection(&reprojector.transform(geometry), &escaped)?)
        }
        _ => None,
    };

    let mut html = String::with_capacity(8 * 1024);
    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html>\n<head>")?;
    writeln!(html, r#"<meta charset="utf-8"/>"#)?;
    writeln!(html, r#"<meta name="viewport" content="width=device-width, initial-scale=1.0"/>"#)?;
    writeln!(html, "<title>Mapa de afecciones</title>")?;
    writeln!(html, r#"<link rel="stylesheet" href="{}"/>"#, LEAFLET_CSS)?;
    writeln!(html, r#"<script src="{}"></script>"#, LEAFLET_JS)?;
    writeln!(
        html,
        "<style>html, body, #map {{ height: 100%; margin: 0; }} \
         .leyenda {{ position: fixed; bottom: 50px; left: 50px; z-index: 1000; \
         background: white; padding: 10px; border: 2px solid grey; border-radius: 5px; \
         max-height: 300px; overflow-y: auto; font-size: 12px; }}</style>"
    )?;
    writeln!(html, "</head>\n<body>")?;
    writeln!(html, r#"<div id="map"></div>"#)?;
    write_legend(&mut html, map)?;

    writeln!(html, "<script>")?;
    writeln!(
        html,
        "var map = L.map('map').setView([{}, {}], {});",
        lat, lon, INITIAL_ZOOM
    )?;
    writeln!(
        html,
        "var base = L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', \
         {{maxZoom: 19, attribution: '&copy; OpenStreetMap contributors'}}).addTo(map);"
    )?;
    writeln!(
        html,
        "L.marker([{lat}, {lon}]).bindPopup({}).addTo(map);",
        js_string(&format!("Coordenadas transformadas: {}, {}", lon, lat)),
        lat = lat,
        lon = lon
    )?;
    writeln!(html, "var overlays = {{}};")?;

    if let Some(json) = &parcel_json {
        writeln!(
            html,
            "overlays['Parcela'] = L.geoJSON({}, {{style: {{color: 'blue', weight: 2, \
             dashArray: '5, 5', fillColor: 'transparent', fillOpacity: 0}}, \
             onEachFeature: function (f, l) {{ l.bindPopup(Object.keys(f.properties)\
             .map(function (k) {{ return k + ': ' + f.properties[k]; }}).join('<br>')); }}}}).addTo(map);",
            json.replace("</", "<\\/")
        )?;
    }

    for overlay in &map.overlays {
        writeln!(
            html,
            "overlays[{}] = L.tileLayer.wms({}, {{layers: {}, format: 'image/png', \
             transparent: true, opacity: {}}}).addTo(map);",
            js_string(&overlay.name),
            js_string(&map.wms_url),
            js_string(&overlay.layer),
            overlay.opacity
        )?;
    }
    writeln!(html, "L.control.layers({{'OpenStreetMap': base}}, overlays).addTo(map);")?;

    for label in labels {
        let popup = html_escape(label).replace('\n', "<br>");
        writeln!(
            html,
            "L.marker([{}, {}]).bindPopup({}).addTo(map);",
            lat,
            lon,
            js_string(&popup)
        )?;
    }
    writeln!(html, "</script>\n</body>\n</html>")?;

    debug!(overlays = map.overlays.len(), markers = labels.len() + 1, parcel = parcel_json.is_some(), "Interactive map rendered");
    Ok(html)
}

/// Écrit la page dans `dir` sous `mapa_<8 hex>.html`
pub fn write_interactive(html: &str, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .context(format!("Failed to create output dir: {}", dir.display()))?;
    let path = dir.join(artifact_file_name("mapa", "html"));
    std::fs::write(&path, html).context(format!("Failed to write map: {}", path.display()))?;
    Ok(path)
}

/// Boîte « Leyenda » avec les images GetLegendGraphic
fn write_legend(html: &mut String, map: &MapConfig) -> std::fmt::Result {
    if map.overlays.is_empty() || map.legend_url.is_empty() {
        return Ok(());
    }
    writeln!(html, r#"<div class="leyenda"><b>Leyenda</b><br>"#)?;
    for overlay in &map.overlays {
        writeln!(
            html,
            r#"<div><b>{}</b><br><img src="{}{}" alt="{}"></div>"#,
            html_escape(&overlay.name),
            html_escape(&map.legend_url),
            url_encode(&overlay.layer),
            html_escape(&overlay.name)
        )?;
    }
    writeln!(html, "</div>")
}

/// Littéral de chaîne JavaScript (JSON, sans fermeture de balise script)
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string())
        .to_string()
        .replace("</", "<\\/")
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Encodage pourcent d'un paramètre de requête
fn url_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}
