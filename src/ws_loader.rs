//! Web service transport used by the batch loaders
//!
//! A [`WsLoader`] resolves a server-relative path to the response body and tells
//! whether that body came from the local cache. [`SonarQubeClient`] always goes
//! to the server; [`CachedWsLoader`] puts a response cache in front of it for
//! embedders that keep the loader alive across loads.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::{SonarQubeClient, SonarQubeError};

/// A loaded value and whether it was served from the local cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsLoaderResult<T> {
    pub result: T,
    pub from_cache: bool,
}

impl<T> WsLoaderResult<T> {
    pub fn new(result: T, from_cache: bool) -> Self {
        Self { result, from_cache }
    }

    pub fn fresh(result: T) -> Self {
        Self::new(result, false)
    }

    pub fn cached(result: T) -> Self {
        Self::new(result, true)
    }

    /// Replace the payload, keeping the cache origin
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WsLoaderResult<U> {
        WsLoaderResult {
            result: f(self.result),
            from_cache: self.from_cache,
        }
    }
}

/// Capability to fetch a server-relative path as text
#[async_trait]
pub trait WsLoader: Send + Sync {
    async fn load_string(&self, path: &str) -> Result<WsLoaderResult<String>, SonarQubeError>;
}

/// How [`CachedWsLoader`] combines the server and the local cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStrategy {
    /// Ask the server, fall back to the cache when it cannot be reached
    #[default]
    ServerFirst,
    /// Use the cache when it has the entry, otherwise ask the server
    CacheFirst,
    ServerOnly,
    CacheOnly,
}

impl FromStr for LoadStrategy {
    type Err = SonarQubeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "server_first" => Ok(Self::ServerFirst),
            "cache_first" => Ok(Self::CacheFirst),
            "server_only" => Ok(Self::ServerOnly),
            "cache_only" => Ok(Self::CacheOnly),
            _ => Err(SonarQubeError::Config(format!(
                "unknown load strategy '{s}' (expected server_first, cache_first, server_only or cache_only)"
            ))),
        }
    }
}

impl fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ServerFirst => "server_first",
            Self::CacheFirst => "cache_first",
            Self::ServerOnly => "server_only",
            Self::CacheOnly => "cache_only",
        };
        f.write_str(s)
    }
}

/// Response store keyed by server-relative path
pub trait ResponseCache: Send + Sync {
    fn get(&self, path: &str) -> Option<String>;
    fn put(&self, path: &str, body: &str);
}

/// Process-local cache; lives as long as the loader that owns it
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, path: &str) -> Option<String> {
        self.entries.lock().ok()?.get(path).cloned()
    }

    fn put(&self, path: &str, body: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(path.to_string(), body.to_string());
        }
    }
}

/// HTTP transport with a read-through response cache
pub struct CachedWsLoader<C: ResponseCache = MemoryCache> {
    client: SonarQubeClient,
    cache: C,
    strategy: LoadStrategy,
}

impl CachedWsLoader<MemoryCache> {
    pub fn new(client: SonarQubeClient, strategy: LoadStrategy) -> Self {
        Self::with_cache(client, MemoryCache::new(), strategy)
    }
}

impl<C: ResponseCache> CachedWsLoader<C> {
    pub fn with_cache(client: SonarQubeClient, cache: C, strategy: LoadStrategy) -> Self {
        Self {
            client,
            cache,
            strategy,
        }
    }

    pub fn strategy(&self) -> LoadStrategy {
        self.strategy
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    async fn load_from_server(&self, path: &str) -> Result<String, SonarQubeError> {
        let body = self.client.get_text(path).await?;
        self.cache.put(path, &body);
        Ok(body)
    }

    fn load_from_cache(&self, path: &str) -> Result<String, SonarQubeError> {
        self.cache
            .get(path)
            .ok_or_else(|| SonarQubeError::Http(format!("{path} not found in cache")))
    }
}

/// Connection failures, timeouts and 5xx; the cases where a cached body may stand in
fn server_unavailable(err: &SonarQubeError) -> bool {
    match err {
        SonarQubeError::Http(_) => true,
        SonarQubeError::Api { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Plain HTTP transport: every load goes to the server
#[async_trait]
impl WsLoader for SonarQubeClient {
    async fn load_string(&self, path: &str) -> Result<WsLoaderResult<String>, SonarQubeError> {
        self.get_text(path).await.map(WsLoaderResult::fresh)
    }
}

#[async_trait]
impl<C: ResponseCache> WsLoader for CachedWsLoader<C> {
    async fn load_string(&self, path: &str) -> Result<WsLoaderResult<String>, SonarQubeError> {
        match self.strategy {
            LoadStrategy::ServerOnly => self.load_from_server(path).await.map(WsLoaderResult::fresh),
            LoadStrategy::CacheOnly => self.load_from_cache(path).map(WsLoaderResult::cached),
            LoadStrategy::CacheFirst => match self.cache.get(path) {
                Some(body) => {
                    tracing::debug!(path = %path, "served from cache");
                    Ok(WsLoaderResult::cached(body))
                }
                None => self.load_from_server(path).await.map(WsLoaderResult::fresh),
            },
            LoadStrategy::ServerFirst => match self.load_from_server(path).await {
                Ok(body) => Ok(WsLoaderResult::fresh(body)),
                Err(err) if server_unavailable(&err) => match self.cache.get(path) {
                    Some(body) => {
                        tracing::warn!(path = %path, error = %err, "server unavailable, using cached response");
                        Ok(WsLoaderResult::cached(body))
                    }
                    None => Err(err),
                },
                // 4xx is the server's answer (auth, unknown project), never masked by the cache
                Err(err) => Err(err),
            },
        }
    }
}
