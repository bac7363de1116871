//! Lecture des formes (.shp) et des attributs (.dbf)

use std::collections::HashMap;
use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::dbase::FieldValue;
use shapefile::{PolygonRing, Shape};
use tracing::debug;

use crate::types::Parcel;
use crate::CatastroError;

/// Lit toutes les formes polygonales et leurs attributs
///
/// Les formes non polygonales sont ignorées et signalées dans la liste
/// d'erreurs non fatales.
pub fn read(shp_path: &Path) -> Result<(Vec<Parcel>, Vec<CatastroError>), CatastroError> {
    let file = shp_path.display().to_string();
    let mut reader = shapefile::Reader::from_path(shp_path)
        .map_err(|e| CatastroError::shapefile(&file, e))?;

    let mut parcels = Vec::new();
    let mut errors = Vec::new();

    for (index, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result.map_err(|e| CatastroError::shapefile(&file, e))?;

        let Some(geometry) = shape_to_multipolygon(&shape) else {
            errors.push(CatastroError::UnsupportedShape {
                index,
                shape_type: shape.shapetype().to_string(),
            });
            continue;
        };

        let fields: HashMap<String, FieldValue> = record.into();
        let properties = fields
            .into_iter()
            .filter_map(|(name, value)| field_to_text(&value).map(|text| (name, text)))
            .collect();

        parcels.push(Parcel {
            id: index,
            geometry,
            properties,
        });
    }

    debug!(file = %file, parcels = parcels.len(), skipped = errors.len(), "Shapefile read");
    Ok((parcels, errors))
}

/// Convertit une forme polygonale (2D, M ou Z) en MultiPolygon
fn shape_to_multipolygon(shape: &Shape) -> Option<MultiPolygon<f64>> {
    match shape {
        Shape::Polygon(p) => Some(rings_to_multipolygon(p.rings(), |pt| Coord { x: pt.x, y: pt.y })),
        Shape::PolygonM(p) => Some(rings_to_multipolygon(p.rings(), |pt| Coord { x: pt.x, y: pt.y })),
        Shape::PolygonZ(p) => Some(rings_to_multipolygon(p.rings(), |pt| Coord { x: pt.x, y: pt.y })),
        _ => None,
    }
}

/// Regroupe les anneaux: chaque anneau extérieur porte les trous qui le suivent
fn rings_to_multipolygon<P>(
    rings: &[PolygonRing<P>],
    to_coord: impl Fn(&P) -> Coord<f64>,
) -> MultiPolygon<f64> {
    let mut polygons = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes: Vec<LineString<f64>> = Vec::new();

    for ring in rings {
        let line: LineString<f64> = ring.points().iter().map(&to_coord).collect();
        match ring {
            PolygonRing::Outer(_) => {
                if let Some(previous) = exterior.take() {
                    polygons.push(Polygon::new(previous, std::mem::take(&mut holes)));
                }
                exterior = Some(line);
            }
            PolygonRing::Inner(_) => holes.push(line),
        }
    }

    if let Some(last) = exterior {
        polygons.push(Polygon::new(last, holes));
    }

    MultiPolygon::new(polygons)
}

/// Valeur d'attribut en texte (None pour les champs vides)
fn field_to_text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Character(Some(s)) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        FieldValue::Numeric(Some(n)) => Some(number_to_text(*n)),
        FieldValue::Float(Some(f)) => Some(number_to_text(f64::from(*f))),
        FieldValue::Double(d) => Some(number_to_text(*d)),
        FieldValue::Integer(i) => Some(i.to_string()),
        FieldValue::Logical(Some(b)) => Some(b.to_string()),
        _ => None,
    }
}

/// Les nombres entiers s'écrivent sans décimales (MASA=12 et non 12.0)
fn number_to_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapefile::Point;

    fn square(x0: f64, y0: f64, side: f64) -> Vec<Point> {
        // Sens horaire = anneau extérieur en shapefile
        vec![
            Point::new(x0, y0),
            Point::new(x0, y0 + side),
            Point::new(x0 + side, y0 + side),
            Point::new(x0 + side, y0),
            Point::new(x0, y0),
        ]
    }

    #[test]
    fn test_holes_attach_to_preceding_exterior() {
        let rings = vec![
            PolygonRing::Outer(square(0.0, 0.0, 10.0)),
            PolygonRing::Inner(square(2.0, 2.0, 2.0)),
            PolygonRing::Outer(square(20.0, 0.0, 5.0)),
        ];
        let mp = rings_to_multipolygon(&rings, |pt| Coord { x: pt.x, y: pt.y });

        assert_eq!(mp.0.len(), 2);
        assert_eq!(mp.0[0].interiors().len(), 1);
        assert!(mp.0[1].interiors().is_empty());
    }

    #[test]
    fn test_number_to_text() {
        assert_eq!(number_to_text(12.0), "12");
        assert_eq!(number_to_text(12.5), "12.5");
    }

    #[test]
    fn test_field_to_text() {
        assert_eq!(
            field_to_text(&FieldValue::Character(Some(" 0045 ".into()))),
            Some("0045".to_string())
        );
        assert_eq!(field_to_text(&FieldValue::Character(Some("   ".into()))), None);
        assert_eq!(field_to_text(&FieldValue::Numeric(Some(7.0))), Some("7".to_string()));
        assert_eq!(field_to_text(&FieldValue::Numeric(None)), None);
    }

    #[test]
    fn test_read_missing_file() {
        assert!(read(Path::new("nonexistent.shp")).is_err());
    }
}
