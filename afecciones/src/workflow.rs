//! Parcours complet d'une demande
//!
//! Localisation (sélecteur), puis soumission du formulaire: contrôle des
//! champs, vérification des affections, cartes et rapport.

use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{info, warn};

use catastro::{Coordinate, ETRS89_UTM30};

use crate::affection::{self, AffectionResult};
use crate::config::{RegionConfig, Settings};
use crate::diagnostics::Diagnostics;
use crate::error::WorkflowError;
use crate::http::Fetcher;
use crate::locator::Locator;
use crate::map::{self, StaticMapRequest};
use crate::report::{self, layout::ImageSource, AffectionLine, Applicant, ReportInput};
use crate::session::{Artifacts, Page, Session};

/// Résultat d'une soumission réussie
#[derive(Debug)]
pub struct ReportOutcome {
    pub results: Vec<AffectionResult>,
    pub map_html: PathBuf,
    pub report_pdf: PathBuf,
    /// Vignette incluse dans le rapport
    pub static_map: bool,
}

/// Champs obligatoires du demandeur
pub fn validate_applicant(applicant: &Applicant) -> Result<(), WorkflowError> {
    for (name, value) in [
        ("nombre", &applicant.nombre),
        ("apellidos", &applicant.apellidos),
        ("dni", &applicant.dni),
    ] {
        if value.trim().is_empty() {
            return Err(WorkflowError::MissingField(name));
        }
    }
    Ok(())
}

/// Champs obligatoires et coordonnées, contrôlés avant tout accès réseau
pub fn validate_request(applicant: &Applicant, coordinate: Coordinate) -> Result<(), WorkflowError> {
    validate_applicant(applicant)?;
    if coordinate.x == 0.0 || coordinate.y == 0.0 || ETRS89_UTM30.validate(&coordinate).is_err() {
        return Err(WorkflowError::InvalidCoordinates {
            x: coordinate.x,
            y: coordinate.y,
        });
    }
    Ok(())
}

/// Services partagés par les étapes d'une demande
pub struct Workflow<'a> {
    config: &'a RegionConfig,
    settings: &'a Settings,
    fetcher: &'a Fetcher,
}

impl<'a> Workflow<'a> {
    pub fn new(config: &'a RegionConfig, settings: &'a Settings, fetcher: &'a Fetcher) -> Self {
        Self {
            config,
            settings,
            fetcher,
        }
    }

    fn locator(&self) -> Locator<'a> {
        Locator::new(self.fetcher, self.config)
    }

    /// Sélecteur, recherche par coordonnées
    pub fn locate(
        &self,
        session: &mut Session,
        coordinate: Coordinate,
        province: Option<&str>,
    ) -> Result<(), WorkflowError> {
        session.reset();
        let parcel = self.locator().locate(coordinate, province)?;
        session.confirm_location(parcel);
        Ok(())
    }

    /// Sélecteur, choix direct de la parcelle
    pub fn select(
        &self,
        session: &mut Session,
        province: Option<&str>,
        municipality: &str,
        masa: &str,
        parcela: &str,
        coordinate: Option<Coordinate>,
    ) -> Result<(), WorkflowError> {
        session.reset();
        let parcel = self
            .locator()
            .select(province, municipality, masa, parcela, coordinate)?;
        session.confirm_location(parcel);
        Ok(())
    }

    /// Soumission du formulaire
    ///
    /// Les artefacts précédents sont supprimés d'abord; un formulaire invalide
    /// est rejeté avant tout accès réseau.
    pub fn submit(
        &self,
        session: &mut Session,
        applicant: &Applicant,
        date: NaiveDate,
        diagnostics: &mut Diagnostics,
    ) -> Result<ReportOutcome, WorkflowError> {
        session.clear_artifacts();

        let Some(coordinate) = session.parcel().map(|p| p.coordinate) else {
            session.navigate(Page::ReportPage);
            return Err(WorkflowError::NoParcel);
        };
        validate_request(applicant, coordinate)?;
        let located = session.request_report()?.clone();

        let (lon, lat) = map::to_geographic(coordinate).map_err(|_| WorkflowError::InvalidCoordinates {
            x: coordinate.x,
            y: coordinate.y,
        })?;

        // Géométrie relue depuis le cadastre, sinon celle de la localisation
        let geometry = match self.locator().parcel_geometry(&located.reference) {
            Ok(geometry) => geometry,
            Err(e) => {
                warn!(error = %e, "Parcel geometry unavailable, using located geometry");
                located.geometry.clone()
            }
        };
        let target = affection::target_geometry(Some(&geometry), coordinate);

        if self.config.layers.is_empty() {
            diagnostics.warning(
                None,
                format!("Catálogo de afecciones vacío para {}", self.config.region),
            );
        }
        let results = affection::check_all(self.fetcher, &target, &self.config.layers, diagnostics);

        // Carte interactive
        let labels: Vec<String> = results.iter().map(AffectionResult::text).collect();
        let properties = [
            ("MASA", located.reference.masa.as_str()),
            ("PARCELA", located.reference.parcela.as_str()),
        ];
        let html = map::render_interactive(
            lon,
            lat,
            Some(&geometry),
            &properties,
            &labels,
            &self.config.map,
        )
        .map_err(|e| WorkflowError::artifact(format!("{:#}", e)))?;
        let map_html = map::write_interactive(&html, &self.settings.output_dir)
            .map_err(|e| WorkflowError::artifact(format!("{:#}", e)))?;

        // Vignette (gardée en vie jusqu'à l'écriture du rapport)
        let static_map = match map::render_static(
            self.fetcher,
            &self.settings.tile_url,
            coordinate,
            StaticMapRequest::default(),
        ) {
            Ok(image) => Some(image),
            Err(e) => {
                diagnostics.error(Some("mapa"), format!("No se pudo generar el mapa de localización: {}", e));
                None
            }
        };
        let map_image = static_map.as_ref().and_then(|m| ImageSource::probe(m.path()));

        let logo = self.settings.logo.as_deref().and_then(|path| {
            let logo = ImageSource::probe(path);
            if logo.is_none() {
                diagnostics.warning(Some("logo"), format!("Error al cargar logo: {}", path.display()));
            }
            logo
        });

        let affections: Vec<AffectionLine> = self
            .config
            .layers
            .iter()
            .zip(&results)
            .map(|(layer, result)| AffectionLine {
                name: layer.name.clone(),
                text: result.report_text(&layer.default_text),
            })
            .collect();

        let input = ReportInput {
            date,
            applicant,
            municipality: &located.reference.municipality,
            masa: &located.reference.masa,
            parcela: &located.reference.parcela,
            coordinate,
            affections: &affections,
            regulatory_text: &self.config.regulatory_text,
            regulation_date: self
                .settings
                .regulation_date
                .as_deref()
                .unwrap_or(&self.config.regulation_date),
            contact: &self.config.contact,
            logo,
            map_image: map_image.clone(),
        };
        let report_pdf = report::assemble(&input, &self.settings.output_dir)
            .map_err(|e| WorkflowError::artifact(format!("{:#}", e)))?;

        session.set_artifacts(Artifacts {
            map_html: Some(map_html.clone()),
            report_pdf: Some(report_pdf.clone()),
        });

        let affected = results.iter().filter(|r| r.is_affected()).count();
        info!(layers = results.len(), affected, report = %report_pdf.display(), "Request completed");

        Ok(ReportOutcome {
            results,
            map_html,
            report_pdf,
            static_map: map_image.is_some(),
        })
    }
}
