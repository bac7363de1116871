//! # catastro
//!
//! Chargement des jeux shapefile du cadastre rustique (Región de Murcia,
//! Castilla-La Mancha) et recherche de parcelles.
//!
//! ## Features
//!
//! - Jeu shapefile en mémoire (shp, shx, dbf, prj, cpg) matérialisé dans un
//!   répertoire temporaire pour la lecture
//! - Détection de la projection depuis le `.prj` (ETRS89/WGS84, UTM 28 à 31)
//! - Attributs décodés selon le `.cpg` (UTF-8, Windows-1252, Latin-1)
//! - Reprojection en Rust pur vers ETRS89 / UTM 30N (EPSG:25830)
//! - Recherche linéaire par point ou par numéros MASA / PARCELA
//! - Types `geo` pour l'interopérabilité avec l'écosystème Rust géospatial
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catastro::{load, search, Coordinate, ShapeSet};
//! use std::path::Path;
//!
//! let set = ShapeSet::read_dir(Path::new("CATASTRO"), "ABANILLA")?;
//! let layer = load(&set)?;
//!
//! let point = Coordinate::new(660_000.0, 4_230_000.0).point();
//! if let Some(parcel) = search::containing(&layer, &point) {
//!     println!("Polígono {:?}, parcela {:?}", parcel.masa(), parcel.parcela());
//! }
//! ```

pub mod envelope;
pub mod error;
pub mod parser;
pub mod reproject;
pub mod search;
pub mod shapeset;
pub mod types;

pub use envelope::{Envelope, ETRS89_UTM30};
pub use error::CatastroError;
pub use shapeset::ShapeSet;
pub use types::{Coordinate, Parcel, ParcelLayer, Projection, WORKING_EPSG};

use tracing::debug;

use crate::reproject::Reprojector;

/// Charge un jeu shapefile et ramène ses géométries en EPSG:25830.
///
/// # Errors
///
/// Retourne `CatastroError` si le jeu est illisible, si le `.prj` déclare une
/// projection inconnue ou si la reprojection n'est pas gérée.
pub fn load(set: &ShapeSet) -> Result<ParcelLayer, CatastroError> {
    // 1. Projection déclarée
    let source = parser::prj::parse(&set.prj)?;

    // 2. Lecture depuis le répertoire temporaire
    let encoding = set.encoding_label().as_deref().and_then(parser::dbf::encoding_for);
    let materialized = match encoding {
        Some(_) => ShapeSet {
            dbf: parser::dbf::mask_non_ascii(&set.dbf),
            ..set.clone()
        }
        .materialize()?,
        None => set.materialize()?,
    };
    let (mut parcels, errors) = parser::shp::read(materialized.shp_path())?;

    // 3. Champs texte dans l'encodage du .cpg
    if let Some(encoding) = encoding {
        let records = parser::dbf::character_fields(&set.dbf, encoding, &set.base_name)?;
        for parcel in &mut parcels {
            if let Some(fields) = records.get(parcel.id) {
                parcel
                    .properties
                    .extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        debug!(set = %set.base_name, encoding = encoding.name(), "Character fields decoded");
    }

    // 4. Reprojection vers le système de travail
    let mut projection = source;
    if projection.epsg != WORKING_EPSG {
        let reproj = Reprojector::new(projection.epsg, WORKING_EPSG)?;
        for parcel in &mut parcels {
            parcel.geometry = reproj.transform(&parcel.geometry);
        }
        debug!(set = %set.base_name, from = projection.epsg, "Reprojected to EPSG:25830");
        projection = Projection::default();
    }

    Ok(ParcelLayer {
        parcels,
        projection,
        errors,
    })
}
