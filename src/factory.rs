//! Configuration-keyed client registry
//!
//! Clients are shared by configuration: asking twice for structurally equal
//! configurations yields the same handle. Registries never evict; the
//! process-wide one returned by [`global`] keeps every client it created for
//! the life of the process, so recordings made through it must be ended
//! explicitly with [`PlaybackClient::end_recording`].

use std::sync::Arc;

use parking_lot::{const_mutex, Mutex};
use tracing::debug;

use crate::config::ClientConfig;
use crate::network::Transport;
use crate::playback::PlaybackClient;
use crate::Result;

/// Shared handle to a registered client
pub type ClientHandle = Arc<tokio::sync::Mutex<PlaybackClient>>;

type TransportBuilder = Box<dyn Fn(&ClientConfig) -> Result<Box<dyn Transport>> + Send + Sync>;

static GLOBAL: Mutex<ClientRegistry> = const_mutex(ClientRegistry::new());

/// Process-wide registry
pub fn global() -> &'static Mutex<ClientRegistry> {
    &GLOBAL
}

/// Registry of clients keyed by configuration
pub struct ClientRegistry {
    instances: Vec<(ClientConfig, ClientHandle)>,
    transport_builder: Option<TransportBuilder>,
}

impl ClientRegistry {
    /// Empty registry whose clients use the hyper transport
    #[must_use]
    pub const fn new() -> Self {
        Self {
            instances: Vec::new(),
            transport_builder: None,
        }
    }

    /// Empty registry whose clients use transports made by `builder`
    #[must_use]
    pub fn with_transport_builder<F>(builder: F) -> Self
    where
        F: Fn(&ClientConfig) -> Result<Box<dyn Transport>> + Send + Sync + 'static,
    {
        Self {
            instances: Vec::new(),
            transport_builder: Some(Box::new(builder)),
        }
    }

    /// Client for `config`, created on first request
    ///
    /// # Errors
    ///
    /// Returns error if a new client cannot be created; nothing is registered then
    pub fn get_instance(&mut self, config: &ClientConfig) -> Result<ClientHandle> {
        if let Some((_, handle)) = self.instances.iter().find(|(existing, _)| existing == config) {
            debug!("Reusing client for {:?} configuration", config.mode);
            return Ok(Arc::clone(handle));
        }

        let client = match &self.transport_builder {
            Some(builder) => PlaybackClient::from_parts(config.clone(), builder(config)?)?,
            None => PlaybackClient::new(config.clone())?,
        };

        let handle = Arc::new(tokio::sync::Mutex::new(client));
        self.instances.push((config.clone(), Arc::clone(&handle)));
        debug!(
            "Registered client #{} for {:?} configuration",
            self.instances.len(),
            config.mode
        );

        Ok(handle)
    }

    /// Number of registered clients
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no client is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Forget every registered client
    pub fn clear(&mut self) {
        self.instances.clear();
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::network::fake::ScriptedTransport;
    use crate::network::{RequestOptions, Response};
    use crate::storage::RecordingStore;
    use crate::PlaybackError;
    use hyper::Method;
    use tempfile::TempDir;

    fn fake_registry() -> ClientRegistry {
        ClientRegistry::with_transport_builder(|_| {
            Ok(Box::new(ScriptedTransport::new(vec![Ok(Response::new(200))])) as Box<dyn Transport>)
        })
    }

    #[test]
    fn test_equal_configs_share_instance() {
        let mut registry = fake_registry();
        let config = ClientConfig::new(Mode::Live).with_option("base_uri", "http://a.test");

        let first = registry.get_instance(&config).unwrap();
        let second = registry.get_instance(&config.clone()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_differing_configs_get_distinct_instances() {
        let dir = TempDir::new().unwrap();
        let mut registry = fake_registry();
        let base = ClientConfig::new(Mode::Live);

        let variants = vec![
            base.clone(),
            base.clone().with_option("base_uri", "http://a.test"),
            base.clone().with_record_file_name("other.json"),
            base.clone().with_record_location(dir.path()),
            ClientConfig::new(Mode::Record).with_record_location(dir.path()),
        ];

        let handles: Vec<ClientHandle> = variants
            .iter()
            .map(|config| registry.get_instance(config).unwrap())
            .collect();

        for (i, a) in handles.iter().enumerate() {
            for b in &handles[i + 1..] {
                assert!(!Arc::ptr_eq(a, b));
            }
        }
        assert_eq!(registry.len(), variants.len());
    }

    #[test]
    fn test_failed_creation_is_not_registered() {
        let dir = TempDir::new().unwrap();
        let mut registry = fake_registry();
        let config = ClientConfig::new(Mode::Playback).with_record_location(dir.path());

        assert!(matches!(
            registry.get_instance(&config),
            Err(PlaybackError::RecordingNotFound(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clear_releases_clients() {
        let dir = TempDir::new().unwrap();
        let mut registry = fake_registry();
        let config = ClientConfig::new(Mode::Record).with_record_location(dir.path());

        let handle = registry.get_instance(&config).unwrap();
        drop(handle);
        registry.clear();

        assert!(registry.is_empty());
        // Last handle gone, so the empty recording was flushed on drop
        assert!(RecordingStore::load(&dir.path().join("saveState.json"))
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_shared_handle_drives_one_queue() {
        let dir = TempDir::new().unwrap();
        let mut registry = fake_registry();
        let config = ClientConfig::new(Mode::Record).with_record_location(dir.path());

        let handle = registry.get_instance(&config).unwrap();
        handle
            .lock()
            .await
            .request(Method::GET, "/widgets", RequestOptions::new())
            .await
            .unwrap();

        let again = registry.get_instance(&config).unwrap();
        assert_eq!(again.lock().await.pending(), 1);
    }

    #[test]
    fn test_global_registry_dedups() {
        let config = ClientConfig::new(Mode::Live)
            .with_option("registry_test", "test_global_registry_dedups");

        let first = global().lock().get_instance(&config).unwrap();
        let second = global().lock().get_instance(&config).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }
}
