//! Parcelle en GeoJSON pour la carte interactive (geozero)

use std::io::Write;

use anyhow::Result;
use geo::{Geometry, MultiPolygon};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;

/// FeatureCollection d'une seule parcelle (coordonnées WGS84 lon/lat)
pub fn parcel_collection(geometry: &MultiPolygon<f64>, properties: &[(&str, &str)]) -> Result<String> {
    let mut buffer = Vec::new();
    write!(buffer, r#"{{"type":"FeatureCollection","features":["#)?;
    write_feature(&mut buffer, geometry, properties)?;
    write!(buffer, "]}}")?;
    Ok(String::from_utf8(buffer)?)
}

/// Écrit une feature; les propriétés passent par serde_json
fn write_feature<W: Write>(
    writer: &mut W,
    geometry: &MultiPolygon<f64>,
    properties: &[(&str, &str)],
) -> Result<()> {
    write!(writer, r#"{{"type":"Feature","geometry":"#)?;
    let mut geom_writer = GeoJsonWriter::new(&mut *writer);
    Geometry::MultiPolygon(geometry.clone()).process_geom(&mut geom_writer)?;

    let properties: serde_json::Map<String, serde_json::Value> = properties
        .iter()
        .map(|(key, value)| (key.to_string(), serde_json::Value::from(*value)))
        .collect();
    write!(writer, r#","properties":"#)?;
    serde_json::to_writer(&mut *writer, &properties)?;
    write!(writer, "}}")?;
    Ok(())
}
