//! Contexte de session et navigation entre pages
//!
//! Sélecteur → Formulaire → Rapport. L'accès à une page qui exige une
//! parcelle localisée, sans parcelle en session, renvoie au sélecteur.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::WorkflowError;
use crate::locator::LocatedParcel;

/// Page courante
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// Choix de la région et localisation de la parcelle
    Selector,
    /// Formulaire du demandeur
    RegionDetailForm,
    /// Résultats, carte et rapport
    ReportPage,
}

/// Artefacts de la dernière demande
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    pub map_html: Option<PathBuf>,
    pub report_pdf: Option<PathBuf>,
}

impl Artifacts {
    fn paths(&self) -> impl Iterator<Item = &Path> {
        self.map_html
            .iter()
            .chain(self.report_pdf.iter())
            .map(PathBuf::as_path)
    }
}

/// Contexte d'un utilisateur
#[derive(Debug)]
pub struct Session {
    page: Page,
    parcel: Option<LocatedParcel>,
    artifacts: Artifacts,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Nom d'artefact `<préfixe>_<8 hex aléatoires>.<ext>`
pub fn artifact_file_name(prefix: &str, ext: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}.{}", prefix, &id[..8], ext)
}

impl Session {
    pub fn new() -> Self {
        Self {
            page: Page::Selector,
            parcel: None,
            artifacts: Artifacts::default(),
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn parcel(&self) -> Option<&LocatedParcel> {
        self.parcel.as_ref()
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    /// Parcelle confirmée: passage au formulaire
    pub fn confirm_location(&mut self, parcel: LocatedParcel) {
        info!(path = %parcel.reference.admin_path(), "Location confirmed");
        self.parcel = Some(parcel);
        self.page = Page::RegionDetailForm;
    }

    /// Navigation directe; sans parcelle, retour au sélecteur
    pub fn navigate(&mut self, target: Page) -> Page {
        self.page = match target {
            Page::Selector => Page::Selector,
            _ if self.parcel.is_none() => {
                warn!(page = ?target, "No parcel in session, redirecting to selector");
                Page::Selector
            }
            other => other,
        };
        self.page
    }

    /// Confirmation « générer le rapport »: passage à la page de rapport
    pub fn request_report(&mut self) -> Result<&LocatedParcel, WorkflowError> {
        if self.navigate(Page::ReportPage) != Page::ReportPage {
            return Err(WorkflowError::NoParcel);
        }
        self.parcel.as_ref().ok_or(WorkflowError::NoParcel)
    }

    pub fn set_artifacts(&mut self, artifacts: Artifacts) {
        self.artifacts = artifacts;
    }

    /// Supprime les fichiers de la demande précédente et oublie leurs chemins
    pub fn clear_artifacts(&mut self) {
        for path in self.artifacts.paths() {
            match std::fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "Artifact removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove artifact"),
            }
        }
        self.artifacts = Artifacts::default();
    }

    /// Nouvelle recherche: oublie la parcelle et les artefacts
    pub fn reset(&mut self) {
        self.clear_artifacts();
        self.parcel = None;
        self.page = Page::Selector;
    }
}
