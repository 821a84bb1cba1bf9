//! Remote data sources.

pub mod compras;

pub use compras::{
    ApiConfig, CachePolicy, Clock, ComprasClient, FetchCache, FetchOutcome, HttpResponse, HttpTransport,
    SystemClock, Transport, BASE_URL,
};
