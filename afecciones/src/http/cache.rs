//! Cache des téléchargements: mémoire du processus et répertoire optionnel
//!
//! Les fichiers disque sont nommés par le hash BLAKE3 de l'URL; leur fraîcheur
//! est jugée sur la date de modification.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

struct Entry {
    stored_at: SystemTime,
    body: Arc<Vec<u8>>,
}

/// Cache à durée de vie, indexé par URL
pub struct Cache {
    memory: Mutex<HashMap<String, Entry>>,
    dir: Option<PathBuf>,
}

impl Cache {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            dir,
        }
    }

    /// Clé disque d'une URL
    pub fn key(url: &str) -> String {
        blake3::hash(url.as_bytes()).to_hex().to_string()
    }

    fn disk_path(&self, url: &str) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.bin", Self::key(url))))
    }

    /// Contenu encore frais pour `url`
    pub fn get(&self, url: &str, ttl: Duration) -> Option<Arc<Vec<u8>>> {
        if let Ok(memory) = self.memory.lock() {
            if let Some(entry) = memory.get(url) {
                if is_fresh(entry.stored_at, ttl) {
                    return Some(Arc::clone(&entry.body));
                }
            }
        }

        let path = self.disk_path(url)?;
        let stored_at = std::fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        if !is_fresh(stored_at, ttl) {
            return None;
        }
        let body = Arc::new(std::fs::read(&path).ok()?);
        debug!(url = %url, path = %path.display(), "Disk cache hit");

        if let Ok(mut memory) = self.memory.lock() {
            memory.insert(
                url.to_string(),
                Entry {
                    stored_at,
                    body: Arc::clone(&body),
                },
            );
        }
        Some(body)
    }

    /// Enregistre un téléchargement réussi
    pub fn put(&self, url: &str, body: Arc<Vec<u8>>) {
        if let Some(path) = self.disk_path(url) {
            if let Err(e) = write_file(&path, &body) {
                warn!(path = %path.display(), error = %e, "Failed to write cache file");
            }
        }

        if let Ok(mut memory) = self.memory.lock() {
            memory.insert(
                url.to_string(),
                Entry {
                    stored_at: SystemTime::now(),
                    body,
                },
            );
        }
    }
}

fn is_fresh(stored_at: SystemTime, ttl: Duration) -> bool {
    // Une date dans le futur compte comme fraîche
    stored_at.elapsed().map(|age| age < ttl).unwrap_or(true)
}

fn write_file(path: &Path, body: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_roundtrip() {
        let cache = Cache::new(None);
        assert!(cache.get("u", Duration::from_secs(60)).is_none());
        cache.put("u", Arc::new(vec![1, 2, 3]));
        assert_eq!(
            cache.get("u", Duration::from_secs(60)).as_deref(),
            Some(&vec![1, 2, 3])
        );
    }

    #[test]
    fn test_expired_entry() {
        let cache = Cache::new(None);
        cache.put("u", Arc::new(vec![1]));
        assert!(cache.get("u", Duration::ZERO).is_none());
    }

    #[test]
    fn test_disk_cache_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let first = Cache::new(Some(dir.path().to_path_buf()));
        first.put("https://example.org/wfs?a=1", Arc::new(b"geojson".to_vec()));

        let expected = dir
            .path()
            .join(format!("{}.bin", Cache::key("https://example.org/wfs?a=1")));
        assert!(expected.exists());

        let second = Cache::new(Some(dir.path().to_path_buf()));
        let body = second
            .get("https://example.org/wfs?a=1", Duration::from_secs(3600))
            .unwrap();
        assert_eq!(body.as_slice(), b"geojson");
    }

    #[test]
    fn test_key_is_stable_hex() {
        let key = Cache::key("https://example.org");
        assert_eq!(key.len(), 64);
        assert_eq!(key, Cache::key("https://example.org"));
    }
}
