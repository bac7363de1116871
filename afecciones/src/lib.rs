//! # afecciones
//!
//! Rapports préliminaires d'affections forestales pour une parcelle
//! cadastrale rustique (Región de Murcia, Castilla-La Mancha).
//!
//! ## Features
//!
//! - Localisation de la parcelle par coordonnées ETRS89 / UTM 30N ou par
//!   numéros de polygone et de parcelle
//! - Vérification d'intersection avec les couches WFS du catalogue régional
//!   (relances, cache disque, avertissements dédupliqués)
//! - Carte interactive Leaflet (HTML) et vignette raster
//! - Rapport PDF A4 paginé
//!
//! ## Usage CLI
//!
//! ```bash
//! # Localiser une parcelle
//! afecciones localizar --region murcia --x 660000 --y 4190000
//!
//! # Municipalités d'une province
//! afecciones municipios --region castilla-la-mancha --provincia ALBACETE
//!
//! # Rapport complet
//! afecciones informe --region murcia --x 660000 --y 4190000 \
//!     --nombre Ana --apellidos García --dni 12345678Z --salida ./informes
//! ```

pub mod affection;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod http;
pub mod locator;
pub mod map;
pub mod municipalities;
pub mod report;
pub mod session;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use config::{Region, RegionConfig, Settings};
pub use diagnostics::Diagnostics;
pub use error::{FetchError, LocateError, MapError, WorkflowError};
pub use http::{Fetcher, Transport};
pub use locator::{LocatedParcel, Locator, ParcelRef};
pub use report::Applicant;
pub use session::{Page, Session};
pub use workflow::{ReportOutcome, Workflow};
