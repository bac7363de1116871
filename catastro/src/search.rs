//! Recherche linéaire de parcelles
//!
//! Les couches communales comptent quelques milliers de parcelles, un
//! parcours complet suffit.

use geo::{Contains, Point};

use crate::types::{Parcel, ParcelLayer};

/// Première parcelle contenant strictement le point (le bord n'en fait pas partie)
pub fn containing<'a>(layer: &'a ParcelLayer, point: &Point<f64>) -> Option<&'a Parcel> {
    layer.parcels.iter().find(|p| p.geometry.contains(point))
}

/// Parcelle désignée par ses numéros de polygone (MASA) et de parcelle (PARCELA)
pub fn by_ids<'a>(layer: &'a ParcelLayer, masa: &str, parcela: &str) -> Option<&'a Parcel> {
    layer.parcels.iter().find(|p| {
        p.masa().is_some_and(|m| same_id(m, masa)) && p.parcela().is_some_and(|n| same_id(n, parcela))
    })
}

/// Compare deux identifiants: numériquement s'ils sont entiers ("007" == "7"),
/// sinon en texte après suppression des blancs
pub fn same_id(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x == y,
        _ => a.eq_ignore_ascii_case(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Projection;
    use geo::{polygon, MultiPolygon};
    use std::collections::HashMap;

    fn parcel(id: usize, x0: f64, masa: &str, parcela: &str) -> Parcel {
        let square = polygon![
            (x: x0, y: 4_200_000.0),
            (x: x0 + 100.0, y: 4_200_000.0),
            (x: x0 + 100.0, y: 4_200_100.0),
            (x: x0, y: 4_200_100.0),
            (x: x0, y: 4_200_000.0),
        ];
        let properties = HashMap::from([
            ("MASA".to_string(), masa.to_string()),
            ("PARCELA".to_string(), parcela.to_string()),
        ]);
        Parcel {
            id,
            geometry: MultiPolygon::new(vec![square]),
            properties,
        }
    }

    fn layer() -> ParcelLayer {
        ParcelLayer {
            parcels: vec![
                parcel(0, 600_000.0, "12", "45"),
                parcel(1, 600_200.0, "12", "46"),
            ],
            projection: Projection::default(),
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_containing() {
        let layer = layer();
        let found = containing(&layer, &Point::new(600_250.0, 4_200_050.0)).unwrap();
        assert_eq!(found.parcela(), Some("46"));

        assert!(containing(&layer, &Point::new(600_150.0, 4_200_050.0)).is_none());
        // Sur le bord
        assert!(containing(&layer, &Point::new(600_000.0, 4_200_050.0)).is_none());
    }

    #[test]
    fn test_by_ids() {
        let layer = layer();
        assert_eq!(by_ids(&layer, "012", " 45").map(|p| p.id), Some(0));
        assert!(by_ids(&layer, "12", "47").is_none());
    }

    #[test]
    fn test_same_id() {
        assert!(same_id("0007", "7"));
        assert!(same_id("a12 ", "A12"));
        assert!(!same_id("7", "8"));
    }
}
