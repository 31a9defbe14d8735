//! Client data-access layer
//!
//! [`DataClient`] pairs the REST client with a query cache. Reads go through
//! the cache under query keys that mirror the resource paths; mutations
//! invalidate the affected keys on success and raise a destructive toast on
//! failure. Nothing is retried.

mod cache;
mod error;
mod http;
mod mutations;
mod queries;
mod toast;

pub use cache::{CacheOptions, QueryCache, QueryKey, DEFAULT_STALE_TIME};
pub use error::{ClientError, ClientResult};
pub use http::ApiClient;
pub use mutations::{InFlight, MutationControl};
pub use toast::{Toast, Toaster, ToastVariant};

use std::sync::Arc;

pub const MARKETS_KEY: &str = "/api/markets";
pub const USERS_KEY: &str = "/api/users";

/// Cached reads and guarded writes against the registry
pub struct DataClient {
    api: ApiClient,
    cache: Arc<QueryCache>,
    toaster: Arc<Toaster>,
    create_market_control: MutationControl,
    place_bet_control: MutationControl,
    resolve_market_control: MutationControl,
    create_user_control: MutationControl,
    update_wallet_control: MutationControl,
}

impl DataClient {
    pub fn new(api: ApiClient, cache: Arc<QueryCache>, toaster: Arc<Toaster>) -> Self {
        Self {
            api,
            cache,
            toaster,
            create_market_control: MutationControl::new("create market"),
            place_bet_control: MutationControl::new("place bet"),
            resolve_market_control: MutationControl::new("resolve market"),
            create_user_control: MutationControl::new("create user"),
            update_wallet_control: MutationControl::new("update wallet"),
        }
    }

    /// Build from configuration: API base URL and stale time
    pub fn from_config(config: &crate::Config) -> ClientResult<Self> {
        Ok(Self::new(
            ApiClient::new(config.api_base_url.clone())?,
            Arc::new(QueryCache::with_stale_time(config.query_stale_time)),
            Arc::new(Toaster::new()),
        ))
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn toaster(&self) -> &Arc<Toaster> {
        &self.toaster
    }
}
