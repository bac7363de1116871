//! Parser pour les fichiers PRJ (projection, WKT ESRI/OGC)

use memchr::memmem;

use crate::types::Projection;
use crate::CatastroError;

/// Datums reconnus: (motif normalisé, préfixe EPSG UTM nord, EPSG géographique)
const DATUMS: &[(&str, u32, u32)] = &[
    ("etrs1989", 25800, 4258),
    ("etrs89", 25800, 4258),
    ("etrf89", 25800, 4258),
    ("wgs1984", 32600, 4326),
    ("wgs84", 32600, 4326),
];

/// Parse un fichier PRJ pour extraire la projection
///
/// Un fichier vide correspond au système de travail (EPSG:25830).
pub fn parse(data: &[u8]) -> Result<Projection, CatastroError> {
    if data.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Projection::default());
    }

    // Système projeté en priorité, sinon géographique
    let (name, projected) = match quoted_name_after(data, b"PROJCS[") {
        Some(name) => (name, true),
        None => match quoted_name_after(data, b"GEOGCS[") {
            Some(name) => (name, false),
            None => {
                return Err(CatastroError::UnknownProjection(
                    String::from_utf8_lossy(data).trim().to_string(),
                ))
            }
        },
    };

    let normalized = normalize(&name);

    let Some(&(_, utm_base, geographic)) = DATUMS
        .iter()
        .find(|(pattern, _, _)| normalized.contains(pattern))
    else {
        return Err(CatastroError::UnknownProjection(name));
    };

    if !projected {
        return Ok(Projection {
            epsg: geographic,
            name,
        });
    }

    match utm_zone(&normalized) {
        // Seules les zones nord de la péninsule sont pertinentes (28 à 31)
        Some((zone, false)) if (28..=31).contains(&zone) => Ok(Projection {
            epsg: utm_base + zone,
            name,
        }),
        _ => Err(CatastroError::UnknownProjection(name)),
    }
}

/// Extrait la chaîne entre guillemets qui suit `tag`
fn quoted_name_after(data: &[u8], tag: &[u8]) -> Option<String> {
    let pos = memmem::find(data, tag)?;
    let rest = &data[pos + tag.len()..];
    let open = memchr::memchr(b'"', rest)?;
    let close = memchr::memchr(b'"', &rest[open + 1..])?;
    let name = &rest[open + 1..open + 1 + close];
    Some(String::from_utf8_lossy(name).trim().to_string())
}

/// Minuscules, seulement les caractères alphanumériques
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Zone UTM et hémisphère depuis un nom normalisé ("...utmzone30n")
fn utm_zone(normalized: &str) -> Option<(u32, bool)> {
    let pos = normalized.find("utmzone")?;
    let rest = &normalized[pos + "utmzone".len()..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let zone: u32 = digits.parse().ok()?;
    let south = rest[digits.len()..].starts_with('s');
    Some((zone, south))
}
