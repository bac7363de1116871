//! Transport simulé pour les tests unitaires

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::FetchError;
use crate::http::{Cache, Fetcher, HttpResponse, RetryPolicy, Transport};

/// Réponses par URL exacte, `fallback` (404 par défaut) pour toute autre URL
#[derive(Default)]
pub struct Routes {
    routes: HashMap<String, (u16, Vec<u8>)>,
    fallback: Option<(u16, Vec<u8>)>,
    log: Rc<RefCell<Vec<String>>>,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.routes.insert(url.to_string(), (status, body.into()));
        self
    }

    pub fn fallback(mut self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.fallback = Some((status, body.into()));
        self
    }

    /// Journal partagé des URL demandées
    pub fn log(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.log)
    }

    pub fn into_fetcher(self) -> Fetcher {
        Fetcher::new(Box::new(self), Cache::new(None), RetryPolicy::immediate(3))
    }
}

impl Transport for Routes {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.log.borrow_mut().push(url.to_string());
        let (status, body) = self
            .routes
            .get(url)
            .or(self.fallback.as_ref())
            .cloned()
            .unwrap_or((404, b"Not Found".to_vec()));
        Ok(HttpResponse { status, body })
    }
}
