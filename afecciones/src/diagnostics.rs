//! Avertissements et erreurs d'une demande de rapport
//!
//! Collecteur passé à travers la localisation et les vérifications
//! d'affection. Chaque service en échec n'est signalé qu'une fois par demande.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::warn;

/// Niveau de sévérité
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    /// Sortie dégradée (service indisponible, logo manquant...)
    Warning,
    /// Étape abandonnée (carte statique, rapport)
    Error,
}

/// Message destiné à l'utilisateur
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub level: Level,
    /// Origine (clé de service, fichier...)
    pub source: Option<String>,
    pub message: String,
}

/// Collecteur par demande
#[derive(Debug, Default, Serialize)]
pub struct Diagnostics {
    pub notices: Vec<Notice>,

    /// Services déjà signalés indisponibles
    #[serde(skip)]
    warned_services: HashSet<String>,
}

/// Dernier segment du chemin d'une URL (requête comprise), clé de déduplication
pub fn service_key(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signale un service indisponible, une seule fois par clé
    ///
    /// Retourne `true` si l'avertissement vient d'être émis.
    pub fn service_unavailable(&mut self, url: &str) -> bool {
        let key = service_key(url);
        if !self.warned_services.insert(key.to_string()) {
            return false;
        }
        let message = format!("Servicio no disponible: {}", key);
        warn!(service = %key, "Service unavailable");
        self.notices.push(Notice {
            level: Level::Warning,
            source: Some(key.to_string()),
            message,
        });
        true
    }

    /// Enregistre un avertissement
    pub fn warning(&mut self, source: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        warn!(source = ?source, "{}", message);
        self.notices.push(Notice {
            level: Level::Warning,
            source: source.map(str::to_string),
            message,
        });
    }

    /// Enregistre une erreur
    pub fn error(&mut self, source: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        warn!(source = ?source, "{}", message);
        self.notices.push(Notice {
            level: Level::Error,
            source: source.map(str::to_string),
            message,
        });
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(|n| n.level == Level::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(|n| n.level == Level::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    /// Affiche les messages sur la console
    pub fn display(&self) {
        if self.notices.is_empty() {
            return;
        }
        println!("\n--- AVISOS ({}) ---", self.notices.len());
        for notice in &self.notices {
            match &notice.source {
                Some(source) if !notice.message.contains(source.as_str()) => {
                    println!("  {:?} [{}] {}", notice.level, source, notice.message)
                }
                _ => println!("  {:?} {}", notice.level, notice.message),
            }
        }
    }

    /// Sauvegarde les messages en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact
    pub fn summary(&self) -> String {
        format!(
            "{} warnings, {} errors",
            self.warnings().count(),
            self.errors().count()
        )
    }
}
