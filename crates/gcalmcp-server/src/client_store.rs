//! Per-token client store.
//!
//! Clients are memoized for the lifetime of the process, keyed by a SHA-256
//! digest of the bearer token so raw tokens are not kept as map keys.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use tracing::debug;

use gcalmcp_google::{AuthorizedClient, GoogleClient, GoogleConfig, ProviderResult};

/// Builds a client for a bearer token.
pub type ClientFactory =
    Arc<dyn Fn(&str) -> ProviderResult<Arc<dyn AuthorizedClient>> + Send + Sync>;

/// Keyed store of authorized clients.
pub struct ClientStore {
    factory: ClientFactory,
    clients: Mutex<HashMap<String, Arc<dyn AuthorizedClient>>>,
}

impl std::fmt::Debug for ClientStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientStore")
            .field("clients", &self.len())
            .finish_non_exhaustive()
    }
}

impl ClientStore {
    /// A store building clients with `factory`.
    pub fn new(factory: ClientFactory) -> Self {
        Self {
            factory,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// A store of [`GoogleClient`]s sharing `config`.
    pub fn google(config: GoogleConfig) -> Self {
        Self::new(Arc::new(
            move |token: &str| -> ProviderResult<Arc<dyn AuthorizedClient>> {
                Ok(Arc::new(GoogleClient::new(&config, token)?))
            },
        ))
    }

    /// Returns the client for `token`, creating it on first use.
    pub fn get(&self, token: &str) -> ProviderResult<Arc<dyn AuthorizedClient>> {
        let key = token_key(token);
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(client) = clients.get(&key) {
            return Ok(Arc::clone(client));
        }

        let client = (self.factory)(token)?;
        debug!(clients = clients.len() + 1, "created client for new token");
        clients.insert(key, Arc::clone(&client));
        Ok(client)
    }

    /// Number of memoized clients.
    pub fn len(&self) -> usize {
        self.clients.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns true if no client was created yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn token_key(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}
