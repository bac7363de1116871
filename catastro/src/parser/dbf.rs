//! Champs texte du .dbf dans l'encodage déclaré par le .cpg
//!
//! Le lecteur shapefile décode les champs caractère en UTF-8. Pour les jeux
//! en Windows-1252 ou Latin-1, ces champs sont relus depuis les octets bruts.

use std::collections::HashMap;

use encoding_rs::Encoding;
use memchr::memchr;
use tracing::warn;

use crate::CatastroError;

const HEADER_LEN: usize = 32;
const DESCRIPTOR_LEN: usize = 32;
const DESCRIPTOR_END: u8 = 0x0D;

/// Encodage à appliquer pour un libellé `.cpg`, `None` pour UTF-8
pub fn encoding_for(label: &str) -> Option<&'static Encoding> {
    let label = label.trim();
    match label.to_uppercase().as_str() {
        "" | "UTF-8" | "UTF8" | "65001" => None,
        // ISO-8859-1 est lu en Windows-1252, qui l'englobe
        "1252" | "ANSI 1252" | "CP1252" | "WINDOWS-1252" | "88591" | "8859-1" | "ISO 88591"
        | "ISO-8859-1" | "ISO8859-1" | "LATIN1" => Some(encoding_rs::WINDOWS_1252),
        "885915" | "8859-15" | "ISO 885915" | "ISO-8859-15" => Some(encoding_rs::ISO_8859_15),
        other => match Encoding::for_label(other.as_bytes()) {
            Some(encoding) if encoding != encoding_rs::UTF_8 => Some(encoding),
            Some(_) => None,
            None => {
                warn!(encoding = %label, "Unknown attribute encoding, reading as UTF-8");
                None
            }
        },
    }
}

/// Champ caractère: nom, décalage dans l'enregistrement, longueur
struct CharField {
    name: String,
    offset: usize,
    length: usize,
}

fn header(dbf: &[u8], name: &str) -> Result<(usize, usize, usize), CatastroError> {
    if dbf.len() < HEADER_LEN {
        return Err(CatastroError::shapefile(format!("{}.dbf", name), "truncated header"));
    }
    let records = u32::from_le_bytes([dbf[4], dbf[5], dbf[6], dbf[7]]) as usize;
    let header_len = u16::from_le_bytes([dbf[8], dbf[9]]) as usize;
    let record_len = u16::from_le_bytes([dbf[10], dbf[11]]) as usize;
    Ok((records, header_len, record_len))
}

fn char_fields(dbf: &[u8], header_len: usize) -> Vec<CharField> {
    let mut fields = Vec::new();
    // Premier octet de l'enregistrement: indicateur de suppression
    let mut offset = 1;
    let mut pos = HEADER_LEN;
    let end = header_len.min(dbf.len());

    while pos + DESCRIPTOR_LEN <= end && dbf[pos] != DESCRIPTOR_END {
        let descriptor = &dbf[pos..pos + DESCRIPTOR_LEN];
        let name_end = memchr(0, &descriptor[..11]).unwrap_or(11);
        let length = descriptor[16] as usize;
        if descriptor[11] == b'C' {
            fields.push(CharField {
                name: String::from_utf8_lossy(&descriptor[..name_end]).trim().to_string(),
                offset,
                length,
            });
        }
        offset += length;
        pos += DESCRIPTOR_LEN;
    }
    fields
}

/// Valeurs non vides des champs caractère, un dictionnaire par enregistrement
///
/// Les enregistrements gardent l'ordre du fichier, donc celui des formes.
pub fn character_fields(
    dbf: &[u8],
    encoding: &'static Encoding,
    name: &str,
) -> Result<Vec<HashMap<String, String>>, CatastroError> {
    let (records, header_len, record_len) = header(dbf, name)?;
    let fields = char_fields(dbf, header_len);

    let mut out = Vec::with_capacity(records);
    for index in 0..records {
        let start = header_len + index * record_len;
        let Some(record) = dbf.get(start..start + record_len) else {
            return Err(CatastroError::shapefile(
                format!("{}.dbf", name),
                format!("record {} truncated", index),
            ));
        };

        let mut values = HashMap::new();
        for field in &fields {
            let Some(raw) = record.get(field.offset..field.offset + field.length) else {
                continue;
            };
            let (text, _) = encoding.decode_without_bom_handling(raw);
            let text = text.trim();
            if !text.is_empty() {
                values.insert(field.name.clone(), text.to_string());
            }
        }
        out.push(values);
    }
    Ok(out)
}

/// Copie du .dbf où les octets non ASCII des enregistrements deviennent `_`
///
/// Le lecteur shapefile ne voit alors que de l'UTF-8 valide; les champs
/// caractère sont ensuite remplacés par [`character_fields`].
pub fn mask_non_ascii(dbf: &[u8]) -> Vec<u8> {
    let mut out = dbf.to_vec();
    if out.len() < HEADER_LEN {
        return out;
    }
    let header_len = u16::from_le_bytes([out[8], out[9]]) as usize;
    if let Some(records) = out.get_mut(header_len..) {
        for byte in records.iter_mut().filter(|b| !b.is_ascii()) {
            *byte = b'_';
        }
    }
    out
}
