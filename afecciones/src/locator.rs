//! Localisation d'une parcelle cadastrale
//!
//! Recherche par coordonnées: parcours linéaire des municipalités candidates,
//! téléchargement de leur jeu shapefile et test d'inclusion du point.
//! Sélection directe: relecture du jeu d'une municipalité par MASA / PARCELA.

use geo::{Centroid, MultiPolygon};
use tracing::{debug, info, warn};

use catastro::shapeset::EXTENSIONS;
use catastro::{search, Coordinate, ParcelLayer, ShapeSet, ETRS89_UTM30};

use crate::config::{file_name_for, CadastreSource, Region, RegionConfig};
use crate::error::LocateError;
use crate::http::{encode_segment, FetchPolicy, Fetcher};
use crate::municipalities::{list_municipalities, provinces_to_scan};

/// Nom de base des jeux provinciaux
const PROVINCIAL_BASE_NAME: &str = "PARCELA";

/// Référence d'une parcelle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelRef {
    pub region: Region,
    pub province: Option<String>,
    /// Nom affiché de la municipalité
    pub municipality: String,
    /// Numéro de polygone (MASA)
    pub masa: String,
    /// Numéro de parcelle (PARCELA)
    pub parcela: String,
}

impl ParcelRef {
    /// Chemin administratif: nom de fichier (`ALHAMA_DE_MURCIA`) ou `PROVINCIA/MUNICIPIO`
    pub fn admin_path(&self) -> String {
        match &self.province {
            Some(province) => format!("{}/{}", province, self.municipality),
            None => file_name_for(&self.municipality),
        }
    }
}

/// Parcelle localisée avec sa géométrie (EPSG:25830)
#[derive(Debug, Clone)]
pub struct LocatedParcel {
    pub reference: ParcelRef,
    pub coordinate: Coordinate,
    pub geometry: MultiPolygon<f64>,
}

/// Municipalité candidate d'une recherche
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub province: Option<String>,
    pub municipality: String,
    /// Nom de base des fichiers
    pub file: String,
}

/// Stratégie de recherche: essai des candidats dans l'ordre, premier succès retenu
pub struct LinearScan;

impl LinearScan {
    pub fn find<C, T>(
        candidates: impl IntoIterator<Item = C>,
        mut probe: impl FnMut(&C) -> Option<T>,
    ) -> Option<(C, T)> {
        for candidate in candidates {
            if let Some(found) = probe(&candidate) {
                return Some((candidate, found));
            }
        }
        None
    }
}

/// Localisateur lié à une région et à un point d'accès réseau
pub struct Locator<'a> {
    fetcher: &'a Fetcher,
    config: &'a RegionConfig,
}

impl<'a> Locator<'a> {
    pub fn new(fetcher: &'a Fetcher, config: &'a RegionConfig) -> Self {
        Self { fetcher, config }
    }

    /// Trouve la parcelle qui contient `coordinate`
    ///
    /// Les coordonnées hors enveloppe sont rejetées avant tout accès réseau.
    /// Une municipalité illisible compte comme « pas ici ».
    pub fn locate(
        &self,
        coordinate: Coordinate,
        province: Option<&str>,
    ) -> Result<LocatedParcel, LocateError> {
        ETRS89_UTM30.validate(&coordinate)?;
        let point = coordinate.point();
        let candidates = self.candidates(province)?;

        let found = LinearScan::find(candidates, |candidate| {
            let layer = match self.load_layer(candidate) {
                Ok(layer) => layer,
                Err(e) => {
                    debug!(municipality = %candidate.municipality, error = %e, "Skipping municipality");
                    return None;
                }
            };
            search::containing(&layer, &point).map(|parcel| {
                (
                    parcel.masa().unwrap_or_default().to_string(),
                    parcel.parcela().unwrap_or_default().to_string(),
                    parcel.geometry.clone(),
                )
            })
        });

        let Some((candidate, (masa, parcela, geometry))) = found else {
            info!(x = coordinate.x, y = coordinate.y, "No parcel found");
            return Err(LocateError::NotFound {
                x: coordinate.x,
                y: coordinate.y,
            });
        };

        let reference = self.reference(candidate, masa, parcela);
        info!(path = %reference.admin_path(), masa = %reference.masa, parcela = %reference.parcela, "Parcel located");
        Ok(LocatedParcel {
            reference,
            coordinate,
            geometry,
        })
    }

    /// Sélection directe par municipalité, MASA et PARCELA
    ///
    /// Sans coordonnée, le centroïde de la parcelle est utilisé.
    pub fn select(
        &self,
        province: Option<&str>,
        municipality: &str,
        masa: &str,
        parcela: &str,
        coordinate: Option<Coordinate>,
    ) -> Result<LocatedParcel, LocateError> {
        if let Some(coordinate) = &coordinate {
            ETRS89_UTM30.validate(coordinate)?;
        }

        let candidate = self.candidate(province, municipality)?;
        let reference = self.reference(candidate, masa.trim().to_string(), parcela.trim().to_string());
        let geometry = self.parcel_geometry(&reference)?;

        let coordinate = match coordinate {
            Some(c) => c,
            None => geometry
                .centroid()
                .map(|c| Coordinate::new(c.x(), c.y()))
                .ok_or_else(|| LocateError::cadastre(&reference.municipality, "empty parcel geometry"))?,
        };

        Ok(LocatedParcel {
            reference,
            coordinate,
            geometry,
        })
    }

    /// Géométrie d'une parcelle connue, relue depuis son jeu shapefile
    pub fn parcel_geometry(&self, reference: &ParcelRef) -> Result<MultiPolygon<f64>, LocateError> {
        let candidate = self.candidate(reference.province.as_deref(), &reference.municipality)?;
        let layer = self.load_layer(&candidate)?;

        search::by_ids(&layer, &reference.masa, &reference.parcela)
            .map(|parcel| parcel.geometry.clone())
            .ok_or_else(|| LocateError::ParcelNotFound {
                municipality: reference.admin_path(),
                masa: reference.masa.clone(),
                parcela: reference.parcela.clone(),
            })
    }

    /// URL d'un fichier du jeu d'une municipalité
    pub fn shapefile_url(&self, candidate: &Candidate, ext: &str) -> String {
        match &self.config.cadastre {
            CadastreSource::Municipal { base_url } => format!(
                "{}/{}.{}",
                base_url.trim_end_matches('/'),
                encode_segment(&candidate.file),
                ext
            ),
            CadastreSource::Provincial { base_url, .. } => format!(
                "{}/{}/{}/{}.{}",
                base_url.trim_end_matches('/'),
                encode_segment(candidate.province.as_deref().unwrap_or_default()),
                encode_segment(&candidate.file),
                PROVINCIAL_BASE_NAME,
                ext
            ),
        }
    }

    /// Télécharge et charge le jeu shapefile d'une municipalité
    pub fn load_layer(&self, candidate: &Candidate) -> Result<ParcelLayer, LocateError> {
        let mut parts = Vec::with_capacity(EXTENSIONS.len());
        for ext in EXTENSIONS {
            let url = self.shapefile_url(candidate, ext);
            let body = self
                .fetcher
                .fetch(&url, FetchPolicy::SHAPEFILE)
                .map_err(|e| LocateError::cadastre(&candidate.municipality, e))?;
            parts.push((ext.to_string(), body.to_vec()));
        }

        let base_name = match candidate.province {
            Some(_) => PROVINCIAL_BASE_NAME,
            None => candidate.file.as_str(),
        };
        let set = ShapeSet::from_parts(base_name, parts)
            .map_err(|e| LocateError::cadastre(&candidate.municipality, e))?;
        let layer = catastro::load(&set).map_err(|e| LocateError::cadastre(&candidate.municipality, e))?;

        if !layer.errors.is_empty() {
            warn!(municipality = %candidate.municipality, skipped = layer.errors.len(), "Non-polygon shapes skipped");
        }
        Ok(layer)
    }

    /// Candidats d'une recherche par coordonnées, listés à la demande
    fn candidates(
        &self,
        province: Option<&str>,
    ) -> Result<Box<dyn Iterator<Item = Candidate> + 'a>, LocateError> {
        match &self.config.cadastre {
            CadastreSource::Municipal { .. } => {
                let list: Vec<Candidate> = self
                    .config
                    .municipalities
                    .iter()
                    .map(|m| Candidate {
                        province: None,
                        municipality: m.name.clone(),
                        file: m.file_name(),
                    })
                    .collect();
                Ok(Box::new(list.into_iter()))
            }
            CadastreSource::Provincial { .. } => {
                let provinces = provinces_to_scan(self.config, province)?;
                let fetcher = self.fetcher;
                let config = self.config;
                Ok(Box::new(provinces.into_iter().flat_map(move |province| {
                    let names = match list_municipalities(fetcher, config, Some(province)) {
                        Ok(names) => names,
                        Err(e) => {
                            warn!(province = %province, error = %e, "Skipping province");
                            Vec::new()
                        }
                    };
                    names.into_iter().map(move |name| Candidate {
                        province: Some(province.to_string()),
                        file: name.clone(),
                        municipality: name,
                    })
                })))
            }
        }
    }

    /// Candidat d'une sélection directe
    fn candidate(&self, province: Option<&str>, municipality: &str) -> Result<Candidate, LocateError> {
        match &self.config.cadastre {
            CadastreSource::Municipal { .. } => {
                let m = self
                    .config
                    .municipality(municipality)
                    .ok_or_else(|| LocateError::UnknownMunicipality(municipality.to_string()))?;
                Ok(Candidate {
                    province: None,
                    municipality: m.name.clone(),
                    file: m.file_name(),
                })
            }
            CadastreSource::Provincial { .. } => {
                let province = province
                    .ok_or_else(|| LocateError::MissingProvince(self.config.region.to_string()))?;
                let province = self
                    .config
                    .province(province)
                    .ok_or_else(|| LocateError::UnknownProvince(province.to_string()))?;
                let name = municipality.trim();
                if name.is_empty() {
                    return Err(LocateError::UnknownMunicipality(municipality.to_string()));
                }
                Ok(Candidate {
                    province: Some(province.to_string()),
                    municipality: name.to_string(),
                    file: name.to_string(),
                })
            }
        }
    }

    fn reference(&self, candidate: Candidate, masa: String, parcela: String) -> ParcelRef {
        ParcelRef {
            region: self.config.region,
            province: candidate.province,
            municipality: candidate.municipality,
            masa,
            parcela,
        }
    }
}
