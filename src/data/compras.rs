//! Public-procurement open-data API client.
//!
//! One GET per distinct filter tuple: results are memoized in an explicit
//! keyed store (`FetchCache`) whose clock and eviction policy are injectable,
//! so tests can count network calls deterministically.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use crate::domain::{FilterSet, RawTable};
use crate::error::AppError;

pub const BASE_URL: &str = "https://datosabiertos.compraspublicas.gob.ec/PLATAFORMA/api/get_analysis";

/// Connection settings, from `.env` / environment and CLI overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    /// No timeout unless configured.
    pub timeout: Option<Duration>,
    pub cache: CachePolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            timeout: None,
            cache: CachePolicy::default(),
        }
    }
}

impl ApiConfig {
    /// Read `COMPRAS_API_URL`, `COMPRAS_TIMEOUT_SECS` and `COMPRAS_CACHE_TTL_SECS`.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Ok(url) = std::env::var("COMPRAS_API_URL") {
            if !url.trim().is_empty() {
                config.base_url = url.trim().to_string();
            }
        }
        config.timeout = env_secs("COMPRAS_TIMEOUT_SECS")?;
        config.cache.ttl = env_secs("COMPRAS_CACHE_TTL_SECS")?;
        Ok(config)
    }
}

fn env_secs(key: &str) -> Result<Option<Duration>, AppError> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<u64>()
            .map(|s| Some(Duration::from_secs(s)))
            .map_err(|_| AppError::new(2, format!("Invalid {key} '{raw}': expected whole seconds."))),
        _ => Ok(None),
    }
}

/// Result of one fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The API answered with a non-success status.
    NoData { status: u16 },
    /// Success; the table may have zero rows.
    Records(RawTable),
}

/// A status + body pair, independent of the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// The single network call the fetcher makes.
pub trait Transport {
    fn get(&self, url: &str, query: &[(&'static str, String)]) -> Result<HttpResponse, AppError>;
}

/// Blocking `reqwest` transport.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, AppError> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, query: &[(&'static str, String)]) -> Result<HttpResponse, AppError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| AppError::new(4, format!("Procurement API request failed: {e}")))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| AppError::new(4, format!("Failed to read procurement API response: {e}")))?;
        Ok(HttpResponse { status, body })
    }
}

/// Time source for cache expiry.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Expiry and size limits for memoized fetches. The default keeps everything
/// for the lifetime of the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Option<Duration>,
    /// When full, the oldest entry is evicted.
    pub capacity: Option<usize>,
}

struct CacheEntry {
    stored_at: Instant,
    outcome: FetchOutcome,
}

/// Memoized fetch results keyed by the filter tuple.
pub struct FetchCache<C: Clock = SystemClock> {
    clock: C,
    policy: CachePolicy,
    entries: HashMap<FilterSet, CacheEntry>,
}

impl<C: Clock> FetchCache<C> {
    pub fn new(clock: C, policy: CachePolicy) -> Self {
        Self {
            clock,
            policy,
            entries: HashMap::new(),
        }
    }

    pub fn get(&mut self, key: &FilterSet) -> Option<FetchOutcome> {
        let now = self.clock.now();
        let expired = match (self.entries.get(key), self.policy.ttl) {
            (None, _) => return None,
            (Some(entry), Some(ttl)) => now.saturating_duration_since(entry.stored_at) >= ttl,
            (Some(_), None) => false,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| e.outcome.clone())
    }

    pub fn insert(&mut self, key: FilterSet, outcome: FetchOutcome) {
        if let Some(cap) = self.policy.capacity {
            if cap == 0 {
                return;
            }
            while self.entries.len() >= cap && !self.entries.contains_key(&key) {
                let oldest = self
                    .entries
                    .iter()
                    .min_by_key(|(_, e)| e.stored_at)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(k) => {
                        self.entries.remove(&k);
                    }
                    None => break,
                }
            }
        }
        let stored_at = self.clock.now();
        self.entries.insert(key, CacheEntry { stored_at, outcome });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetcher with memoization.
pub struct ComprasClient<T: Transport = HttpTransport, C: Clock = SystemClock> {
    transport: T,
    base_url: String,
    cache: FetchCache<C>,
}

impl ComprasClient {
    pub fn from_config(config: &ApiConfig) -> Result<Self, AppError> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::with_parts(
            transport,
            config.base_url.clone(),
            FetchCache::new(SystemClock, config.cache),
        ))
    }
}

impl<T: Transport, C: Clock> ComprasClient<T, C> {
    pub fn with_parts(transport: T, base_url: impl Into<String>, cache: FetchCache<C>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            cache,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cache(&self) -> &FetchCache<C> {
        &self.cache
    }

    /// Fetch records for `filters`, reusing a cached result when present.
    ///
    /// Transport and decode failures are errors and are not cached.
    pub fn fetch(&mut self, filters: &FilterSet) -> Result<FetchOutcome, AppError> {
        if let Some(hit) = self.cache.get(filters) {
            debug!(?filters, "fetch cache hit");
            return Ok(hit);
        }

        let params = filters.query_params();
        info!(url = %self.base_url, ?params, "requesting procurement records");
        let resp = self.transport.get(&self.base_url, &params)?;

        let outcome = if resp.status != 200 {
            warn!(status = resp.status, "procurement API returned no data");
            FetchOutcome::NoData { status: resp.status }
        } else {
            let table = RawTable::from_json_str(&resp.body)
                .map_err(|e| AppError::new(4, format!("Failed to parse procurement API response: {e}")))?;
            info!(rows = table.len(), columns = table.columns.len(), "procurement records received");
            FetchOutcome::Records(table)
        };

        self.cache.insert(filters.clone(), outcome.clone());
        Ok(outcome)
    }

    /// `fetch` from the four selector texts a UI shell hands over.
    pub fn fetch_inputs(
        &mut self,
        year: &str,
        region: &str,
        contract_type: &str,
        keyword: &str,
    ) -> Result<FetchOutcome, AppError> {
        let filters = FilterSet::from_inputs(year, region, contract_type, keyword)?;
        self.fetch(&filters)
    }
}
