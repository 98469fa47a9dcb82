//! # Client Factory
//!
//! Memoizes [`RecordsClient`]s per (token, environment, log level) tuple.
//!
//! The cache is read-mostly: lookups take a shared read lock, and a client is only built
//! under the write lock after re-checking the entry, so concurrent first requests for the
//! same tuple end up sharing a single client.
use super::{
    client::{ClientBuildError, RecordsClient},
    types::{ClientSettings, LogLevel},
};
use parking_lot::RwLock;
use std::{
    collections::{HashMap, hash_map::Entry},
    fmt,
    sync::Arc,
};

#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    token: String,
    environment: Option<String>,
    log_level: LogLevel,
}

impl fmt::Debug for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientKey")
            .field("token", &"<redacted>")
            .field("environment", &self.environment)
            .field("log_level", &self.log_level)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct ClientFactory {
    settings: ClientSettings,
    clients: RwLock<HashMap<ClientKey, Arc<RecordsClient>>>,
}

impl ClientFactory {
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            settings,
            clients: RwLock::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Returns the client for the given tuple, building it on first use.
    ///
    /// Identical tuples always return the same `Arc`.
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<RecordsClient>)` - The shared client.
    /// * `Err(ClientBuildError)` - If `token` is empty or the client cannot be configured.
    ///   Failed builds are not cached.
    pub fn get_client(
        &self,
        token: &str,
        environment: Option<&str>,
        log_level: LogLevel,
    ) -> Result<Arc<RecordsClient>, ClientBuildError> {
        if token.trim().is_empty() {
            return Err(ClientBuildError::MissingToken);
        }

        let key = ClientKey {
            token: token.to_string(),
            environment: environment.map(str::to_string),
            log_level,
        };

        if let Some(client) = self.clients.read().get(&key) {
            return Ok(Arc::clone(client));
        }

        let mut clients = self.clients.write();

        match clients.entry(key) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let client = RecordsClient::new(&self.settings, token, environment, log_level)?;
                tracing::debug!(key = ?entry.key(), "built records client");
                Ok(Arc::clone(entry.insert(Arc::new(client))))
            }
        }
    }

    /// Number of distinct clients built so far.
    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
