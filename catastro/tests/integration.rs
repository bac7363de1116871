//! Tests d'intégration sur des jeux shapefile synthétiques

use std::path::Path;

use catastro::reproject::Reprojector;
use catastro::{load, search, Coordinate, ShapeSet};
use shapefile::dbase::{FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing};

const PRJ_25830: &str = r#"PROJCS["ETRS_1989_UTM_Zone_30N",GEOGCS["GCS_ETRS_1989",DATUM["D_ETRS_1989",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",-3.0],PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;

const PRJ_4326: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

/// Carré orienté dans le sens horaire (anneau extérieur)
fn square(x0: f64, y0: f64, side: f64) -> Vec<Point> {
    vec![
        Point::new(x0, y0),
        Point::new(x0, y0 + side),
        Point::new(x0 + side, y0 + side),
        Point::new(x0 + side, y0),
        Point::new(x0, y0),
    ]
}

fn write_set(dir: &Path, base: &str, prj: &str, parcels: &[(Vec<Point>, &str, &str)]) {
    let table = TableWriterBuilder::new()
        .add_character_field("MASA".try_into().unwrap(), 10)
        .add_character_field("PARCELA".try_into().unwrap(), 10);

    let mut writer = shapefile::Writer::from_path(dir.join(format!("{}.shp", base)), table).unwrap();
    for (ring, masa, parcela) in parcels {
        let polygon = Polygon::with_rings(vec![PolygonRing::Outer(ring.clone())]);
        let mut record = Record::default();
        record.insert("MASA".to_string(), FieldValue::Character(Some(masa.to_string())));
        record.insert(
            "PARCELA".to_string(),
            FieldValue::Character(Some(parcela.to_string())),
        );
        writer.write_shape_and_record(&polygon, &record).unwrap();
    }
    drop(writer);

    std::fs::write(dir.join(format!("{}.prj", base)), prj).unwrap();
    std::fs::write(dir.join(format!("{}.cpg", base)), "UTF-8").unwrap();
}

#[test]
fn test_locate_point_in_synthetic_municipality() {
    let dir = tempfile::tempdir().unwrap();
    write_set(
        dir.path(),
        "ABANILLA",
        PRJ_25830,
        &[
            (square(660_000.0, 4_230_000.0, 200.0), "3", "101"),
            (square(660_300.0, 4_230_000.0, 200.0), "3", "102"),
        ],
    );

    let set = ShapeSet::read_dir(dir.path(), "ABANILLA").unwrap();
    let layer = load(&set).unwrap();

    assert_eq!(layer.parcels.len(), 2);
    assert_eq!(layer.projection.epsg, 25830);
    assert!(layer.errors.is_empty());

    let inside = Coordinate::new(660_400.0, 4_230_100.0).point();
    let parcel = search::containing(&layer, &inside).unwrap();
    assert_eq!(parcel.masa(), Some("3"));
    assert_eq!(parcel.parcela(), Some("102"));

    let far = Coordinate::new(700_000.0, 4_400_000.0).point();
    assert!(search::containing(&layer, &far).is_none());

    assert_eq!(search::by_ids(&layer, "03", "101").map(|p| p.id), Some(0));
}

#[test]
fn test_geographic_set_is_reprojected() {
    // Parcelle d'environ 1 km autour d'un point de Murcia, en degrés
    let to_geo = Reprojector::new(25830, 4326).unwrap();
    let (lon, lat) = to_geo.transform_point(664_000.0, 4_205_000.0);

    let dir = tempfile::tempdir().unwrap();
    write_set(
        dir.path(),
        "PARCELA",
        PRJ_4326,
        &[(square(lon - 0.005, lat - 0.005, 0.01), "7", "12")],
    );

    let set = ShapeSet::read_dir(dir.path(), "PARCELA").unwrap();
    let layer = load(&set).unwrap();
    assert_eq!(layer.projection.epsg, 25830);

    let parcel = search::containing(&layer, &Coordinate::new(664_000.0, 4_205_000.0).point());
    assert_eq!(parcel.and_then(|p| p.parcela()), Some("12"));
}

#[test]
fn test_missing_dbf_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_set(
        dir.path(),
        "LORCA",
        PRJ_25830,
        &[(square(600_000.0, 4_170_000.0, 50.0), "1", "1")],
    );
    std::fs::remove_file(dir.path().join("LORCA.dbf")).unwrap();

    assert!(ShapeSet::read_dir(dir.path(), "LORCA").is_err());
}

#[test]
fn test_windows_1252_attributes_are_decoded() {
    let dir = tempfile::tempdir().unwrap();
    write_set(
        dir.path(),
        "CIEZA",
        PRJ_25830,
        &[(square(620_000.0, 4_230_000.0, 100.0), "5", "CANADA")],
    );

    // Réécrit la valeur avec un Ñ en Windows-1252, sans changer la largeur
    let dbf_path = dir.path().join("CIEZA.dbf");
    let mut dbf = std::fs::read(&dbf_path).unwrap();
    let at = dbf.windows(6).position(|w| w == b"CANADA").unwrap();
    dbf[at + 2] = 0xD1;
    std::fs::write(&dbf_path, dbf).unwrap();
    std::fs::write(dir.path().join("CIEZA.cpg"), "1252").unwrap();

    let set = ShapeSet::read_dir(dir.path(), "CIEZA").unwrap();
    let layer = load(&set).unwrap();

    assert_eq!(layer.parcels.len(), 1);
    assert_eq!(layer.parcels[0].masa(), Some("5"));
    assert_eq!(layer.parcels[0].parcela(), Some("CAÑADA"));
}
