//! Configuration des régions (presets embarqués) et réglages d'exécution

mod settings;

pub use settings::Settings;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Communauté autonome couverte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    /// Región de Murcia (un jeu cadastral par municipalité)
    Murcia,
    /// Castilla-La Mancha (provinces puis municipalités)
    CastillaLaMancha,
}

impl Region {
    /// Nom affiché
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Murcia => "Región de Murcia",
            Self::CastillaLaMancha => "Castilla-La Mancha",
        }
    }

    /// Identifiant du preset embarqué
    pub fn preset_name(self) -> &'static str {
        match self {
            Self::Murcia => "murcia",
            Self::CastillaLaMancha => "castilla-la-mancha",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', ' '], "-").as_str() {
            "murcia" | "carm" | "region-de-murcia" => Ok(Self::Murcia),
            "castilla-la-mancha" | "clm" | "jccm" => Ok(Self::CastillaLaMancha),
            _ => Err(format!(
                "Invalid region: {}. Use: murcia, castilla-la-mancha",
                s
            )),
        }
    }
}

/// Configuration complète d'une région
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegionConfig {
    pub region: Region,

    /// Source des jeux shapefile cadastraux
    pub cadastre: CadastreSource,

    /// Provinces (vide si la région n'en a pas besoin)
    #[serde(default)]
    pub provinces: Vec<String>,

    /// Catalogue fixe des municipalités (vide si listé dynamiquement)
    #[serde(default)]
    pub municipalities: Vec<Municipality>,

    /// Catalogue ordonné des couches d'affection
    #[serde(default)]
    pub layers: Vec<LayerDescriptor>,

    /// Couches WMS de référence de la carte interactive
    #[serde(default)]
    pub map: MapConfig,

    /// Texte réglementaire, un paragraphe par entrée
    #[serde(default)]
    pub regulatory_text: Vec<String>,

    /// Date de mise à jour de la réglementation (en toutes lettres)
    pub regulation_date: String,

    /// Ligne de contact en fin de rapport
    pub contact: String,
}

/// Où trouver les jeux shapefile
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CadastreSource {
    /// `{base_url}/{FICHIER}.{ext}`
    Municipal { base_url: String },

    /// `{base_url}/{PROVINCE}/{MUNICIPALITÉ}/PARCELA.{ext}`, répertoires listés par `listing_url`
    Provincial {
        base_url: String,
        listing_url: String,
    },
}

/// Municipalité du catalogue fixe
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Municipality {
    /// Nom affiché (ex: "ALHAMA DE MURCIA")
    pub name: String,

    /// Nom de base des fichiers, dérivé du nom si absent
    #[serde(default)]
    pub file: Option<String>,
}

impl Municipality {
    /// Nom de base des fichiers ("ALHAMA_DE_MURCIA")
    pub fn file_name(&self) -> String {
        self.file
            .clone()
            .unwrap_or_else(|| file_name_for(&self.name))
    }
}

/// Nom de fichier cadastral: majuscules, espaces en `_`, sans accents
pub fn file_name_for(name: &str) -> String {
    name.trim()
        .to_uppercase()
        .chars()
        .map(|c| match c {
            ' ' => '_',
            'Á' | 'À' | 'Â' | 'Ä' => 'A',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'Ó' | 'Ò' | 'Ô' | 'Ö' => 'O',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            other => other,
        })
        .collect()
}

/// Descripteur d'une couche d'affection (WFS GeoJSON)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayerDescriptor {
    /// Clé courte (ex: "zepa")
    pub key: String,

    /// Nom affiché dans les résultats (ex: "ZEPA")
    pub name: String,

    /// URL GetFeature complète
    pub url: String,

    /// Attributs extraits des entités intersectées
    pub mapping: AttributeMapping,

    /// Phrase du rapport quand la couche n'affecte pas la parcelle
    pub default_text: String,
}

/// Extraction des attributs d'une couche
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeMapping {
    /// Un seul champ, valeurs distinctes jointes par ", "
    Field(String),

    /// Liste de `champ:libellé`, un bloc par entité
    Fields(Vec<String>),
}

impl AttributeMapping {
    /// Paires (champ, libellé); le libellé vaut le champ s'il est absent
    pub fn labeled_fields(&self) -> Vec<(&str, &str)> {
        match self {
            Self::Field(field) => vec![(field.as_str(), field.as_str())],
            Self::Fields(fields) => fields
                .iter()
                .map(|spec| spec.split_once(':').unwrap_or((spec.as_str(), spec.as_str())))
                .collect(),
        }
    }
}

/// Configuration de la carte interactive
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MapConfig {
    /// Point d'entrée WMS des couches de référence
    #[serde(default)]
    pub wms_url: String,

    /// Préfixe des URL GetLegendGraphic (le nom de couche est ajouté, encodé)
    #[serde(default)]
    pub legend_url: String,

    #[serde(default)]
    pub overlays: Vec<Overlay>,
}

/// Couche WMS semi-transparente
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Overlay {
    /// Nom dans le contrôle de couches
    pub name: String,

    /// Nom de couche WMS (ex: "SIG_LUP_SITES_CARM:RN2000")
    pub layer: String,

    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    0.25
}

impl RegionConfig {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge la configuration embarquée d'une région
    pub fn from_preset(region: Region) -> Result<Self> {
        match region {
            Region::Murcia => Self::load_embedded(include_str!("presets/murcia.json")),
            Region::CastillaLaMancha => {
                Self::load_embedded(include_str!("presets/castilla_la_mancha.json"))
            }
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Remplace le catalogue de couches par celui d'un fichier JSON (tableau de descripteurs)
    pub fn with_catalog_file(mut self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read catalog file: {}", path.display()))?;
        self.layers = serde_json::from_str(&content).context("Failed to parse catalog JSON")?;
        Ok(self)
    }

    /// Récupère une couche par sa clé
    pub fn layer(&self, key: &str) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.key.eq_ignore_ascii_case(key))
    }

    /// Province connue (comparaison insensible à la casse), sous sa forme canonique
    pub fn province(&self, name: &str) -> Option<&str> {
        self.provinces
            .iter()
            .find(|p| p.eq_ignore_ascii_case(name.trim()))
            .map(String::as_str)
    }

    /// Municipalité du catalogue fixe, par nom affiché ou nom de fichier
    pub fn municipality(&self, name: &str) -> Option<&Municipality> {
        let wanted = file_name_for(name);
        self.municipalities
            .iter()
            .find(|m| m.file_name() == wanted || file_name_for(&m.name) == wanted)
    }
}
