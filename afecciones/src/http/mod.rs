//! Téléchargements HTTP: transport, relances et cache à durée de vie

mod cache;
mod retry;

pub use cache::Cache;
pub use retry::RetryPolicy;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::FetchError;

/// Réponse HTTP brute
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Accès réseau, remplaçable dans les tests
pub trait Transport {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// Transport réel (client reqwest bloquant, rustls)
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(settings: &Settings) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.http_timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::transport(url, e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| FetchError::transport(url, e))?
            .to_vec();
        Ok(HttpResponse { status, body })
    }
}

/// Politique d'un téléchargement: durée de vie en cache et relances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Durée de vie en cache (None = jamais mis en cache)
    pub ttl: Option<Duration>,

    /// Relancer sur 429/5xx et erreurs réseau
    pub retry: bool,
}

impl FetchPolicy {
    /// Couches WFS: une semaine, avec relances
    pub const WFS: Self = Self {
        ttl: Some(Duration::from_secs(7 * 24 * 3600)),
        retry: true,
    };

    /// Jeux shapefile cadastraux: une heure, sans relance
    pub const SHAPEFILE: Self = Self {
        ttl: Some(Duration::from_secs(3600)),
        retry: false,
    };

    /// Tuiles de fond de carte: une semaine, sans relance
    pub const TILE: Self = Self {
        ttl: Some(Duration::from_secs(7 * 24 * 3600)),
        retry: false,
    };

    /// Sans cache ni relance (listes de répertoires)
    pub const DIRECT: Self = Self {
        ttl: None,
        retry: false,
    };
}

/// Encode un segment de chemin d'URL (espaces, `#`, `?`, `%`)
pub fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        match c {
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '%' => out.push_str("%25"),
            '?' => out.push_str("%3F"),
            c => out.push(c),
        }
    }
    out
}

/// Point d'accès unique au réseau: transport + cache + relances
pub struct Fetcher {
    transport: Box<dyn Transport>,
    cache: Cache,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(transport: Box<dyn Transport>, cache: Cache, retry: RetryPolicy) -> Self {
        Self {
            transport,
            cache,
            retry,
        }
    }

    /// Fetcher réseau configuré depuis les réglages
    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        let transport = ReqwestTransport::new(settings)?;
        Ok(Self::new(
            Box::new(transport),
            Cache::new(settings.cache_dir.clone()),
            RetryPolicy::default(),
        ))
    }

    /// Télécharge `url` (2xx uniquement), via le cache si la politique l'autorise
    ///
    /// Les échecs ne sont jamais mis en cache.
    pub fn fetch(&self, url: &str, policy: FetchPolicy) -> Result<Arc<Vec<u8>>, FetchError> {
        if let Some(ttl) = policy.ttl {
            if let Some(body) = self.cache.get(url, ttl) {
                debug!(url = %url, "Cache hit");
                return Ok(body);
            }
        }

        let body = if policy.retry {
            self.retry.run(url, |_| self.get_ok(url))?
        } else {
            self.get_ok(url)?
        };

        let body = Arc::new(body);
        if policy.ttl.is_some() {
            self.cache.put(url, Arc::clone(&body));
        }
        Ok(body)
    }

    /// GET unique, statut non 2xx converti en erreur
    fn get_ok(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.transport.get(url)?;
        if (200..300).contains(&response.status) {
            Ok(response.body)
        } else {
            warn!(url = %url, status = response.status, "HTTP error");
            Err(FetchError::Status {
                url: url.to_string(),
                status: response.status,
            })
        }
    }
}
