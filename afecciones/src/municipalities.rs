//! Liste des municipalités d'une région

use serde::Deserialize;
use tracing::debug;

use crate::config::{CadastreSource, Region, RegionConfig};
use crate::error::LocateError;
use crate::http::{encode_segment, FetchPolicy, Fetcher};

/// Entrée de l'API de listing de dépôt (`GET .../contents/{path}`)
#[derive(Debug, Deserialize)]
struct ListingEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Municipalités d'une région, triées sans tenir compte de la casse
///
/// Région à catalogue fixe: aucun accès réseau, `province` est ignorée.
/// Région à provinces: un seul appel à l'API de listing, seuls les
/// répertoires sont retenus.
pub fn list_municipalities(
    fetcher: &Fetcher,
    config: &RegionConfig,
    province: Option<&str>,
) -> Result<Vec<String>, LocateError> {
    let listing_url = match &config.cadastre {
        CadastreSource::Municipal { .. } => {
            let mut names: Vec<String> =
                config.municipalities.iter().map(|m| m.name.clone()).collect();
            sort_names(&mut names);
            return Ok(names);
        }
        CadastreSource::Provincial { listing_url, .. } => listing_url,
    };

    let province = province
        .ok_or_else(|| LocateError::MissingProvince(config.region.to_string()))?;
    let province = config
        .province(province)
        .ok_or_else(|| LocateError::UnknownProvince(province.to_string()))?;

    let url = format!(
        "{}/{}",
        listing_url.trim_end_matches('/'),
        encode_segment(province)
    );
    let body = fetcher
        .fetch(&url, FetchPolicy::DIRECT)
        .map_err(|e| LocateError::listing(province, e))?;

    let mut names = parse_listing(&body).map_err(|e| LocateError::listing(province, e))?;
    sort_names(&mut names);
    debug!(province = %province, count = names.len(), "Municipalities listed");
    Ok(names)
}

/// Répertoires d'une réponse de listing
fn parse_listing(body: &[u8]) -> Result<Vec<String>, serde_json::Error> {
    let entries: Vec<ListingEntry> = serde_json::from_slice(body)?;
    Ok(entries
        .into_iter()
        .filter(|e| e.kind == "dir")
        .map(|e| e.name)
        .collect())
}

fn sort_names(names: &mut [String]) {
    names.sort_by_key(|n| n.to_lowercase());
}

/// Provinces à parcourir pour une recherche par coordonnées
pub fn provinces_to_scan<'a>(config: &'a RegionConfig, province: Option<&str>) -> Result<Vec<&'a str>, LocateError> {
    match (config.region, province) {
        (Region::Murcia, _) => Ok(Vec::new()),
        (_, Some(p)) => config
            .province(p)
            .map(|p| vec![p])
            .ok_or_else(|| LocateError::UnknownProvince(p.to_string())),
        (_, None) => Ok(config.provinces.iter().map(String::as_str).collect()),
    }
}
