//! Vérification des affections (couches WFS GeoJSON)
//!
//! Phase 1: téléchargement de la couche (relances, cache d'une semaine).
//! Phase 2: lecture de la FeatureCollection et test d'intersection avec la
//! géométrie cible. Aucune erreur n'est propagée: chaque couche donne un
//! résultat textuel.

use geo::{Geometry, Intersects, MultiPolygon};
use geojson::{FeatureCollection, GeoJson};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use catastro::reproject::Reprojector;
use catastro::{Coordinate, WORKING_EPSG};

use crate::config::{AttributeMapping, LayerDescriptor};
use crate::diagnostics::Diagnostics;
use crate::http::{FetchPolicy, Fetcher};

/// Valeur affichée pour un attribut absent (couches multi-attributs)
const UNKNOWN_VALUE: &str = "Desconocido";

/// Résultat d'une couche
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffectionOutcome {
    /// Aucune entité n'intersecte la cible
    NotAffected,
    /// Texte complet « Dentro de ... »
    Affected(String),
    /// Couche indisponible après relances
    ServiceUnavailable,
    /// Réponse illisible
    DataError,
}

/// Résultat nommé d'une couche du catalogue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffectionResult {
    pub key: String,
    pub name: String,
    pub outcome: AffectionOutcome,
}

impl AffectionResult {
    /// Ligne de résultat
    pub fn text(&self) -> String {
        match &self.outcome {
            AffectionOutcome::NotAffected => format!("No afecta a {}", self.name),
            AffectionOutcome::Affected(text) => text.clone(),
            AffectionOutcome::ServiceUnavailable => {
                format!("Indeterminado: {} (servicio no disponible)", self.name)
            }
            AffectionOutcome::DataError => format!("Indeterminado: {} (error de datos)", self.name),
        }
    }

    /// Ligne du rapport: la phrase par défaut remplace « No afecta »
    pub fn report_text(&self, default_text: &str) -> String {
        match self.outcome {
            AffectionOutcome::NotAffected => default_text.to_string(),
            _ => self.text(),
        }
    }

    pub fn is_affected(&self) -> bool {
        matches!(self.outcome, AffectionOutcome::Affected(_))
    }
}

/// Échecs de la phase 2
#[derive(Debug, Error)]
enum DataError {
    #[error("invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a FeatureCollection")]
    NotACollection,

    #[error("unsupported CRS: {0}")]
    Crs(String),

    #[error("invalid geometry: {0}")]
    Geometry(String),
}

/// Géométrie cible: la parcelle si elle est connue et non vide, sinon le point
pub fn target_geometry(parcel: Option<&MultiPolygon<f64>>, coordinate: Coordinate) -> Geometry<f64> {
    match parcel {
        Some(geometry) if !geometry.0.is_empty() => Geometry::MultiPolygon(geometry.clone()),
        _ => Geometry::Point(coordinate.point()),
    }
}

/// Vérifie une couche
pub fn check(
    fetcher: &Fetcher,
    target: &Geometry<f64>,
    layer: &LayerDescriptor,
    diagnostics: &mut Diagnostics,
) -> AffectionResult {
    let outcome = match fetcher.fetch(&layer.url, FetchPolicy::WFS) {
        Err(e) => {
            debug!(layer = %layer.key, error = %e, "Layer fetch failed");
            diagnostics.service_unavailable(&layer.url);
            AffectionOutcome::ServiceUnavailable
        }
        Ok(body) => match evaluate(&body, target, layer) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(layer = %layer.key, error = %e, "Layer data error");
                diagnostics.warning(Some(&layer.key), format!("Error de datos en {}", layer.name));
                AffectionOutcome::DataError
            }
        },
    };

    AffectionResult {
        key: layer.key.clone(),
        name: layer.name.clone(),
        outcome,
    }
}

/// Vérifie tout le catalogue, dans l'ordre
pub fn check_all(
    fetcher: &Fetcher,
    target: &Geometry<f64>,
    layers: &[LayerDescriptor],
    diagnostics: &mut Diagnostics,
) -> Vec<AffectionResult> {
    layers
        .iter()
        .map(|layer| check(fetcher, target, layer, diagnostics))
        .collect()
}

/// Phase 2: lecture et intersection
fn evaluate(
    body: &[u8],
    target: &Geometry<f64>,
    layer: &LayerDescriptor,
) -> Result<AffectionOutcome, DataError> {
    let collection = match serde_json::from_slice::<GeoJson>(body)? {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(DataError::NotACollection),
    };

    let epsg = declared_epsg(&collection)?;
    let reprojector = if epsg == WORKING_EPSG {
        None
    } else {
        Some(Reprojector::new(epsg, WORKING_EPSG).map_err(|_| DataError::Crs(epsg.to_string()))?)
    };

    let mut matches = Vec::new();
    for feature in collection.features {
        let Some(geometry) = feature.geometry else {
            continue;
        };
        let geometry = Geometry::<f64>::try_from(geometry)
            .map_err(|e| DataError::Geometry(e.to_string()))?;
        let geometry = match &reprojector {
            Some(r) => r.transform(&geometry),
            None => geometry,
        };
        if target.intersects(&geometry) {
            matches.push(feature.properties.unwrap_or_default());
        }
    }

    debug!(layer = %layer.key, matches = matches.len(), "Layer evaluated");
    if matches.is_empty() {
        return Ok(AffectionOutcome::NotAffected);
    }
    Ok(AffectionOutcome::Affected(describe(layer, &matches)))
}

/// Système déclaré par le membre `crs` (absent = EPSG:25830)
fn declared_epsg(collection: &FeatureCollection) -> Result<u32, DataError> {
    let Some(crs) = collection
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
    else {
        return Ok(WORKING_EPSG);
    };

    let name = crs
        .pointer("/properties/name")
        .and_then(Value::as_str)
        .ok_or_else(|| DataError::Crs(crs.to_string()))?;
    parse_crs_name(name).ok_or_else(|| DataError::Crs(name.to_string()))
}

/// "urn:ogc:def:crs:EPSG::25830", "EPSG:4326", "urn:ogc:def:crs:OGC:1.3:CRS84"
fn parse_crs_name(name: &str) -> Option<u32> {
    if name.trim_end().ends_with("CRS84") {
        return Some(4326);
    }
    name.rsplit(':').next()?.trim().parse().ok()
}

/// Texte « Dentro de ... » d'une couche affectée
fn describe(layer: &LayerDescriptor, matches: &[serde_json::Map<String, Value>]) -> String {
    match &layer.mapping {
        AttributeMapping::Field(field) => {
            let mut values: Vec<String> = Vec::new();
            for properties in matches {
                if let Some(value) = properties.get(field).and_then(value_text) {
                    if !values.contains(&value) {
                        values.push(value);
                    }
                }
            }
            format!("Dentro de {}: {}", layer.name, values.join(", "))
        }
        AttributeMapping::Fields(_) => {
            let fields = layer.mapping.labeled_fields();
            let blocks: Vec<String> = matches
                .iter()
                .map(|properties| {
                    fields
                        .iter()
                        .map(|(field, label)| {
                            let value = properties
                                .get(*field)
                                .and_then(value_text)
                                .unwrap_or_else(|| UNKNOWN_VALUE.to_string());
                            format!("{}: {}", label, value)
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .collect();
            format!("Dentro de {}:\n{}", layer.name, blocks.join("\n\n"))
        }
    }
}

/// Valeur d'attribut en texte (None pour null)
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Routes;
    use geo::{polygon, Point};

    const URL: &str = "https://example.org/geoserver/wfs?typeName=TEST:ENP";

    fn layer(mapping: AttributeMapping) -> LayerDescriptor {
        LayerDescriptor {
            key: "enp".into(),
            name: "ENP".into(),
            url: URL.into(),
            mapping,
            default_text: "No afecta a ningún Espacio Natural Protegido".into(),
        }
    }

    /// Deux carrés de 100 m autour de (660000, 4190000) et (661000, 4190000)
    fn collection(crs: Option<&str>) -> String {
        let crs = crs
            .map(|name| format!(r#""crs":{{"type":"name","properties":{{"name":"{}"}}}},"#, name))
            .unwrap_or_default();
        format!(
            r#"{{"type":"FeatureCollection",{}"features":[
                {{"type":"Feature","properties":{{"nombre":"Sierra Espuña","id_monte":"MU-1","propiedad":null}},
                  "geometry":{{"type":"Polygon","coordinates":[[[659950,4189950],[660050,4189950],[660050,4190050],[659950,4190050],[659950,4189950]]]}}}},
                {{"type":"Feature","properties":{{"nombre":"Sierra Espuña"}},
                  "geometry":{{"type":"Polygon","coordinates":[[[659900,4189900],[660100,4189900],[660100,4190100],[659900,4190100],[659900,4189900]]]}}}},
                {{"type":"Feature","properties":{{"nombre":"Carrascoy"}},
                  "geometry":{{"type":"Polygon","coordinates":[[[660950,4189950],[661050,4189950],[661050,4190050],[660950,4190050],[660950,4189950]]]}}}},
                {{"type":"Feature","properties":{{"nombre":"Sin geometría"}},"geometry":null}}
            ]}}"#,
            crs
        )
    }

    fn point() -> Geometry<f64> {
        Geometry::Point(Point::new(660_000.0, 4_190_000.0))
    }

    #[test]
    fn test_single_field_distinct_values() {
        let outcome = evaluate(collection(None).as_bytes(), &point(), &layer(AttributeMapping::Field("nombre".into()))).unwrap();
        assert_eq!(outcome, AffectionOutcome::Affected("Dentro de ENP: Sierra Espuña".into()));
    }

    #[test]
    fn test_parcel_touching_two_features() {
        let parcel = Geometry::Polygon(polygon![
            (x: 659_990.0, y: 4_189_990.0),
            (x: 661_010.0, y: 4_189_990.0),
            (x: 661_010.0, y: 4_190_010.0),
            (x: 659_990.0, y: 4_190_010.0),
        ]);
        let outcome = evaluate(collection(None).as_bytes(), &parcel, &layer(AttributeMapping::Field("nombre".into()))).unwrap();
        assert_eq!(
            outcome,
            AffectionOutcome::Affected("Dentro de ENP: Sierra Espuña, Carrascoy".into())
        );
    }

    #[test]
    fn test_multi_field_blocks() {
        let mapping = AttributeMapping::Fields(vec!["id_monte:ID".into(), "propiedad:Propiedad".into()]);
        let outcome = evaluate(collection(None).as_bytes(), &point(), &layer(mapping)).unwrap();
        assert_eq!(
            outcome,
            AffectionOutcome::Affected(
                "Dentro de ENP:\nID: MU-1\nPropiedad: Desconocido\n\nID: Desconocido\nPropiedad: Desconocido".into()
            )
        );
    }

    #[test]
    fn test_no_intersection() {
        let far = Geometry::Point(Point::new(700_000.0, 4_200_000.0));
        let outcome = evaluate(collection(None).as_bytes(), &far, &layer(AttributeMapping::Field("nombre".into()))).unwrap();
        assert_eq!(outcome, AffectionOutcome::NotAffected);
    }

    #[test]
    fn test_explicit_working_crs() {
        let body = collection(Some("urn:ogc:def:crs:EPSG::25830"));
        let outcome = evaluate(body.as_bytes(), &point(), &layer(AttributeMapping::Field("nombre".into()))).unwrap();
        assert!(matches!(outcome, AffectionOutcome::Affected(_)));
    }

    #[test]
    fn test_parse_crs_name() {
        assert_eq!(parse_crs_name("urn:ogc:def:crs:EPSG::25830"), Some(25830));
        assert_eq!(parse_crs_name("EPSG:4326"), Some(4326));
        assert_eq!(parse_crs_name("urn:ogc:def:crs:OGC:1.3:CRS84"), Some(4326));
        assert_eq!(parse_crs_name("bogus"), None);
    }

    #[test]
    fn test_data_errors() {
        let mapping = AttributeMapping::Field("nombre".into());
        assert!(evaluate(b"<html>", &point(), &layer(mapping.clone())).is_err());
        assert!(evaluate(br#"{"type":"Point","coordinates":[0,0]}"#, &point(), &layer(mapping)).is_err());
    }

    #[test]
    fn test_unavailable_service_is_indeterminate() {
        let fetcher = Routes::new().with(URL, 503, "busy").into_fetcher();
        let mut diagnostics = Diagnostics::new();
        let result = check(&fetcher, &point(), &layer(AttributeMapping::Field("nombre".into())), &mut diagnostics);

        assert_eq!(result.outcome, AffectionOutcome::ServiceUnavailable);
        assert_eq!(result.text(), "Indeterminado: ENP (servicio no disponible)");
        assert_eq!(diagnostics.warnings().count(), 1);
    }

    #[test]
    fn test_garbage_body_is_data_error() {
        let fetcher = Routes::new().with(URL, 200, "not json").into_fetcher();
        let mut diagnostics = Diagnostics::new();
        let result = check(&fetcher, &point(), &layer(AttributeMapping::Field("nombre".into())), &mut diagnostics);
        assert_eq!(result.text(), "Indeterminado: ENP (error de datos)");
    }

    #[test]
    fn test_report_text_uses_default_sentence() {
        let result = AffectionResult {
            key: "enp".into(),
            name: "ENP".into(),
            outcome: AffectionOutcome::NotAffected,
        };
        assert_eq!(result.text(), "No afecta a ENP");
        assert_eq!(
            result.report_text("No afecta a ningún Espacio Natural Protegido"),
            "No afecta a ningún Espacio Natural Protegido"
        );
    }

    #[test]
    fn test_target_geometry_falls_back_to_point() {
        let coordinate = Coordinate::new(660_000.0, 4_190_000.0);
        assert!(matches!(target_geometry(None, coordinate), Geometry::Point(_)));
        let empty = MultiPolygon::<f64>::new(vec![]);
        assert!(matches!(target_geometry(Some(&empty), coordinate), Geometry::Point(_)));
    }
}
