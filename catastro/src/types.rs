//! Types de données pour le crate catastro

use geo::{MultiPolygon, Point};
use std::collections::HashMap;

use crate::CatastroError;

/// Système de travail : ETRS89 / UTM zone 30N
pub const WORKING_EPSG: u32 = 25830;

/// Champ du numéro de polygone (masa)
pub const FIELD_MASA: &str = "MASA";

/// Champ du numéro de parcelle
pub const FIELD_PARCELA: &str = "PARCELA";

/// Coordonnée projetée (ETRS89 / UTM 30N, mètres)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.x, self.y)
    }
}

/// Une parcelle cadastrale avec sa géométrie et ses attributs
#[derive(Debug, Clone)]
pub struct Parcel {
    /// Identifiant (index de l'enregistrement dans le shapefile)
    pub id: usize,

    /// Géométrie, toujours dans le système de la couche
    pub geometry: MultiPolygon<f64>,

    /// Attributs du .dbf normalisés en texte
    pub properties: HashMap<String, String>,
}

impl Parcel {
    /// Numéro de polygone (MASA)
    pub fn masa(&self) -> Option<&str> {
        self.properties.get(FIELD_MASA).map(String::as_str)
    }

    /// Numéro de parcelle (PARCELA)
    pub fn parcela(&self) -> Option<&str> {
        self.properties.get(FIELD_PARCELA).map(String::as_str)
    }
}

/// Résultat du chargement d'un jeu shapefile cadastral
#[derive(Debug)]
pub struct ParcelLayer {
    /// Parcelles dans l'ordre du fichier
    pub parcels: Vec<Parcel>,

    /// Projection des géométries de `parcels`
    pub projection: Projection,

    /// Erreurs non fatales (formes ignorées)
    pub errors: Vec<CatastroError>,
}

/// Informations de projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    /// Code EPSG
    pub epsg: u32,

    /// Nom déclaré dans le .prj
    pub name: String,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            epsg: WORKING_EPSG,
            name: "ETRS89 / UTM zone 30N".to_string(),
        }
    }
}
