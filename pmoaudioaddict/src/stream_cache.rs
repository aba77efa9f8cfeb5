//! Resolved stream URL cache
//!
//! Resolving a stream URL costs one request per channel, so resolved URLs
//! are kept per (service, tier, channel key) and reused until the caller
//! forces a refresh. Resolved URLs embed the listen key, so the cache
//! remembers which key they were resolved with and empties itself when a
//! different one is bound. The cache can be persisted to YAML so it
//! survives across invocations.

use crate::error::Result;
use crate::services::Service;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Cache key: (service, tier, channel key)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamKey {
    pub service: Service,
    pub tier: String,
    pub channel: String,
}

impl StreamKey {
    pub fn new(service: Service, tier: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            service,
            tier: tier.into(),
            channel: channel.into(),
        }
    }
}

/// On-disk form of one entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedStreamUrl {
    service: Service,
    tier: String,
    channel: String,
    url: String,
}

/// On-disk form of the whole cache
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoredCache {
    listen_key: Option<String>,
    streams: Vec<CachedStreamUrl>,
}

/// Map of resolved stream URLs with explicit invalidation
#[derive(Debug, Clone, Default)]
pub struct StreamUrlCache {
    listen_key: Option<String>,
    entries: HashMap<StreamKey, String>,
}

impl StreamUrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &StreamKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: StreamKey, url: String) {
        self.entries.insert(key, url);
    }

    pub fn remove(&mut self, key: &StreamKey) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry of a service
    pub fn invalidate_service(&mut self, service: Service) {
        self.entries.retain(|k, _| k.service != service);
    }

    /// Drop every entry of one (service, tier)
    pub fn invalidate_tier(&mut self, service: Service, tier: &str) {
        self.entries
            .retain(|k, _| !(k.service == service && k.tier == tier));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Listen key the cached URLs were resolved with
    pub fn listen_key(&self) -> Option<&str> {
        self.listen_key.as_deref()
    }

    /// Bind the cache to `listen_key`, dropping every entry if it differs
    /// from the bound one. Returns whether entries were dropped.
    pub fn bind_listen_key(&mut self, listen_key: Option<&str>) -> bool {
        if self.listen_key.as_deref() == listen_key {
            return false;
        }

        let dropped = !self.entries.is_empty();
        if dropped {
            info!(entries = self.entries.len(), "Listen key changed, dropping stream cache");
            self.entries.clear();
        }
        self.listen_key = listen_key.map(str::to_string);
        dropped
    }

    /// Load a cache saved with [`save`](Self::save); a missing file yields an empty cache
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No stream cache file, starting empty");
            return Ok(Self::new());
        }

        let data = fs::read_to_string(path)?;
        let stored: StoredCache = serde_yaml::from_str(&data)?;
        let entries = stored
            .streams
            .into_iter()
            .map(|e| (StreamKey::new(e.service, e.tier, e.channel), e.url))
            .collect::<HashMap<_, _>>();

        info!(path = %path.display(), entries = entries.len(), "Loaded stream cache");
        Ok(Self {
            listen_key: stored.listen_key,
            entries,
        })
    }

    /// Write the cache as YAML, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut streams: Vec<CachedStreamUrl> = self
            .entries
            .iter()
            .map(|(k, url)| CachedStreamUrl {
                service: k.service,
                tier: k.tier.clone(),
                channel: k.channel.clone(),
                url: url.clone(),
            })
            .collect();
        streams.sort_by(|a, b| {
            (a.service, &a.tier, &a.channel).cmp(&(b.service, &b.tier, &b.channel))
        });

        let stored = StoredCache {
            listen_key: self.listen_key.clone(),
            streams,
        };
        fs::write(path, serde_yaml::to_string(&stored)?)?;
        Ok(())
    }
}
