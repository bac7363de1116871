//! Rapport PDF « Informe preliminar de Afecciones Forestales »
//!
//! [`build`] calcule les pages (déterministe), [`assemble`] les rend en PDF
//! et écrit `informe_<8 hex>.pdf`.

pub mod columns;
pub mod layout;
pub mod pdf;
pub mod text;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use catastro::Coordinate;

use crate::session::artifact_file_name;
use layout::{Align, ImageSource, Layout, Page, MARGIN, PRINTABLE_WIDTH, SECTION_FILL};
use text::{string_width, wrap_chars, Font};

pub const TITLE: &str = "Informe preliminar de Afecciones Forestales";

/// Largeur (caractères) des valeurs des champs
const VALUE_WRAP: usize = 60;

/// Largeur du libellé d'un champ
const LABEL_WIDTH: f32 = 50.0;

const FIELD_LINE: f32 = 7.0;
const COLUMN_GAP: f32 = 5.0;
const COLUMN_LINE: f32 = 6.0;

const NOT_SPECIFIED: &str = "No especificado";
const NOT_AVAILABLE: &str = "No disponible";

/// Données du demandeur (formulaire)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub nombre: String,
    pub apellidos: String,
    pub dni: String,
    pub direccion: String,
    pub telefono: String,
    pub email: String,
    /// Objet de la demande
    pub objeto: String,
}

/// Ligne de la section des affections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffectionLine {
    pub name: String,
    pub text: String,
}

/// Entrées du rapport
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub date: NaiveDate,
    pub applicant: &'a Applicant,
    pub municipality: &'a str,
    pub masa: &'a str,
    pub parcela: &'a str,
    pub coordinate: Coordinate,
    pub affections: &'a [AffectionLine],
    pub regulatory_text: &'a [String],
    pub regulation_date: &'a str,
    pub contact: &'a str,
    pub logo: Option<ImageSource>,
    pub map_image: Option<ImageSource>,
}

/// Calcule les pages du rapport
pub fn build(input: &ReportInput<'_>) -> Vec<Page> {
    let mut layout = Layout::new(input.logo.clone());
    layout.add_page();

    layout.row(12.0, TITLE, Font::bold(16.0), Align::Center, None);
    layout.ln(10.0);

    // 1. Demandeur
    section(&mut layout, "1. Datos del solicitante");
    let applicant = input.applicant;
    let date = input.date.format("%d/%m/%Y").to_string();
    for (label, value) in [
        ("Fecha informe", date.as_str()),
        ("Nombre", applicant.nombre.as_str()),
        ("Apellidos", applicant.apellidos.as_str()),
        ("DNI", applicant.dni.as_str()),
        ("Dirección", applicant.direccion.as_str()),
        ("Teléfono", applicant.telefono.as_str()),
        ("Email", applicant.email.as_str()),
    ] {
        field(&mut layout, label, value, NOT_SPECIFIED);
    }

    layout.ln(2.0);
    layout.row(FIELD_LINE, "Objeto de la solicitud:", Font::bold(11.0), Align::Left, None);
    let objeto = or_default(&applicant.objeto, NOT_SPECIFIED);
    for line in wrap_chars(objeto, VALUE_WRAP) {
        layout.row(FIELD_LINE, &line, Font::regular(11.0), Align::Left, None);
    }

    // 2. Localisation
    section(&mut layout, "2. Localización");
    field(&mut layout, "Municipio", input.municipality, NOT_AVAILABLE);
    field(&mut layout, "Polígono", input.masa, NOT_AVAILABLE);
    field(&mut layout, "Parcela", input.parcela, NOT_AVAILABLE);
    layout.row(
        10.0,
        &format!(
            "Coordenadas ETRS89: X = {:.2}, Y = {:.2}",
            input.coordinate.x, input.coordinate.y
        ),
        Font::bold(11.0),
        Align::Left,
        None,
    );

    match &input.map_image {
        Some(map) => {
            layout.ln(5.0);
            layout.row(FIELD_LINE, "Mapa de localización:", Font::bold(11.0), Align::Center, None);
            layout.image(map, PRINTABLE_WIDTH * 0.5);
        }
        None => layout.row(
            FIELD_LINE,
            "No se pudo generar el mapa de localización.",
            Font::regular(11.0),
            Align::Left,
            None,
        ),
    }

    // 3. Affections
    layout.add_page();
    layout.ln(10.0);
    section(&mut layout, "3. Afecciones detectadas");
    for line in input.affections {
        layout.row(6.0, &format!("{}:", line.name), Font::bold(10.0), Align::Left, None);
        layout.paragraph(MARGIN, PRINTABLE_WIDTH, 6.0, &line.text, Font::regular(10.0));
        layout.ln(2.0);
    }

    // Texte réglementaire sur deux colonnes
    if !input.regulatory_text.is_empty() {
        layout.ln(5.0);
        regulatory_columns(&mut layout, input.regulatory_text);
    }

    layout.ln(10.0);
    let closing = format!(
        "La normativa de referencia esta actualizada a fecha de {}, y sera revisada trimestralmente.\n\nPara mas informacion:\n{}",
        input.regulation_date, input.contact
    );
    layout.paragraph(MARGIN, PRINTABLE_WIDTH, COLUMN_LINE, &closing, Font::regular(9.0));

    layout.finish()
}

/// Calcule, rend et écrit le rapport dans `dir`
pub fn assemble(input: &ReportInput<'_>, dir: &Path) -> Result<PathBuf> {
    let pages = build(input);
    let bytes = pdf::render(&pages, TITLE)?;

    std::fs::create_dir_all(dir)
        .context(format!("Failed to create output dir: {}", dir.display()))?;
    let path = dir.join(artifact_file_name("informe", "pdf"));
    std::fs::write(&path, bytes).context(format!("Failed to write report: {}", path.display()))?;

    info!(path = %path.display(), pages = pages.len(), "Report written");
    Ok(path)
}

/// Bandeau de titre de section
fn section(layout: &mut Layout, title: &str) {
    layout.row(10.0, title, Font::bold(13.0), Align::Left, Some(SECTION_FILL));
    layout.ln(2.0);
}

/// « Libellé: valeur », valeur découpée à 60 caractères
fn field(layout: &mut Layout, label: &str, value: &str, fallback: &str) {
    let lines = wrap_chars(or_default(value, fallback), VALUE_WRAP);
    let value_x = MARGIN + LABEL_WIDTH;
    let value_w = PRINTABLE_WIDTH - LABEL_WIDTH;

    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            layout.cell(MARGIN, LABEL_WIDTH, FIELD_LINE, &format!("{}:", label), Font::bold(12.0), Align::Left, None);
        }
        layout.cell(value_x, value_w, FIELD_LINE, line, Font::regular(12.0), Align::Left, None);
        layout.ln(FIELD_LINE);
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value.trim()
    }
}

/// Paragraphes répartis par hauteur estimée, colonne droite repartant du même point
fn regulatory_columns(layout: &mut Layout, paragraphs: &[String]) {
    let font = Font::regular(9.0);
    let column_width = (PRINTABLE_WIDTH - COLUMN_GAP) / 2.0;
    let placement = columns::balance(paragraphs, column_width, COLUMN_LINE, |s| string_width(s, font));

    let start = layout.position();
    let mut ends = Vec::with_capacity(2);
    for (x, indices) in [
        (MARGIN, &placement.left),
        (MARGIN + column_width + COLUMN_GAP, &placement.right),
    ] {
        layout.set_position(start);
        for &index in indices {
            layout.paragraph(x, column_width, COLUMN_LINE, &paragraphs[index], font);
        }
        ends.push(layout.position());
    }

    // Reprise sous la colonne la plus longue
    if let Some(end) = ends
        .into_iter()
        .max_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)))
    {
        layout.set_position(end);
    }
}
