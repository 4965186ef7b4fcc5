//! Instance Registry Module
//!
//! Maps identity keys to cache manager instances. Owned by the application
//! composition root; every lookup and reset runs under one lock so that an
//! instance is constructed, replaced or removed atomically.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::cache::CacheManager;
use crate::config::CacheConfig;
use crate::error::Result;
use crate::identity::{Identity, IdentityKey, IdentityProvider};
use crate::store::{JsonFileStoreFactory, MemoryStoreFactory, StoreFactory};

// == Instance Registry ==
/// Process-wide registry of cache managers, one per identity key.
pub struct InstanceRegistry {
    instances: Mutex<HashMap<IdentityKey, Arc<CacheManager>>>,
    factory: Arc<dyn StoreFactory>,
    identity_provider: Arc<dyn IdentityProvider>,
    config: CacheConfig,
}

impl InstanceRegistry {
    // == Constructors ==
    /// Creates an empty registry.
    ///
    /// # Arguments
    /// * `factory` - Opens the persistent store of each identity
    /// * `identity_provider` - Supplies the current account when none is passed
    /// * `config` - Settings applied to every constructed instance
    pub fn new(
        factory: Arc<dyn StoreFactory>,
        identity_provider: Arc<dyn IdentityProvider>,
        config: CacheConfig,
    ) -> Self {
        Self {
            instances: Mutex::new(HashMap::new()),
            factory,
            identity_provider,
            config,
        }
    }

    /// Creates a registry whose stores follow `config`: JSON-file stores
    /// under `store_dir` when set, in-memory stores otherwise.
    pub fn from_config(config: CacheConfig, identity_provider: Arc<dyn IdentityProvider>) -> Self {
        let factory: Arc<dyn StoreFactory> = match &config.store_dir {
            Some(dir) => Arc::new(JsonFileStoreFactory::new(dir.clone())),
            None => Arc::new(MemoryStoreFactory::new()),
        };
        Self::new(factory, identity_provider, config)
    }

    /// Derives the identity key, falling back to the current account.
    ///
    /// Ok(None) means no account is available.
    fn resolve_key(
        &self,
        identity: Option<&Identity>,
        community_id: Option<&str>,
    ) -> Result<Option<IdentityKey>> {
        let identity = match identity {
            Some(identity) => identity.clone(),
            None => match self.identity_provider.current_account() {
                Some(current) => current,
                None => return Ok(None),
            },
        };
        IdentityKey::derive(&identity, community_id).map(Some)
    }

    /// Returns the instance for `key`, constructing it if needed.
    /// Caller must hold the instances lock.
    fn get_or_create(
        &self,
        instances: &mut HashMap<IdentityKey, Arc<CacheManager>>,
        key: &IdentityKey,
    ) -> Option<Arc<CacheManager>> {
        if let Some(instance) = instances.get(key) {
            return Some(instance.clone());
        }

        let store = match self.factory.open(key) {
            Ok(store) => store,
            Err(e) => {
                warn!("Cache unavailable for identity {}: {}", key, e);
                return None;
            }
        };
        let instance = Arc::new(
            CacheManager::new(store).with_default_stale_after(self.config.default_stale_after_ms),
        );
        instance.reset_in_memory_cache();
        instances.insert(key.clone(), instance.clone());
        info!("Created cache manager for identity {}", key);
        Some(instance)
    }

    // == Get Instance ==
    /// Returns the cache manager for `identity` in `community_id`.
    ///
    /// With no identity the current account is used, and with no
    /// `community_id` the identity's own community. Ok(None) means the
    /// cache is unavailable (no account, or its store could not be opened).
    ///
    /// # Errors
    /// `CacheError::InvalidArgument` if the identity has a blank user id.
    pub fn get_instance(
        &self,
        identity: Option<&Identity>,
        community_id: Option<&str>,
    ) -> Result<Option<Arc<CacheManager>>> {
        let key = match self.resolve_key(identity, community_id)? {
            Some(key) => key,
            None => return Ok(None),
        };
        let mut instances = self.instances.lock();
        Ok(self.get_or_create(&mut instances, &key))
    }

    // == Soft Reset ==
    /// Clears the instance's overlay and forgets the instance. Persisted
    /// data is kept. No-op if there is no such instance.
    pub fn soft_reset(&self, identity: Option<&Identity>, community_id: Option<&str>) -> Result<()> {
        let key = match self.resolve_key(identity, community_id)? {
            Some(key) => key,
            None => return Ok(()),
        };
        let mut instances = self.instances.lock();
        if let Some(instance) = instances.remove(&key) {
            instance.reset_in_memory_cache();
            info!("Soft reset cache manager for identity {}", key);
        }
        Ok(())
    }

    // == Hard Reset ==
    /// Clears the instance's overlay, drops every collection it created
    /// (master registry included) and forgets the instance.
    ///
    /// The instance is constructed first if needed, so durable data left by
    /// an earlier process is purged as well.
    pub fn hard_reset(&self, identity: Option<&Identity>, community_id: Option<&str>) -> Result<()> {
        let key = match self.resolve_key(identity, community_id)? {
            Some(key) => key,
            None => return Ok(()),
        };
        let mut instances = self.instances.lock();
        if let Some(instance) = self.get_or_create(&mut instances, &key) {
            instance.clean();
            instances.remove(&key);
            info!("Hard reset cache manager for identity {}", key);
        }
        Ok(())
    }

    // == Introspection ==
    /// True if an instance is currently registered for the identity.
    pub fn contains(&self, identity: &Identity, community_id: Option<&str>) -> Result<bool> {
        let key = IdentityKey::derive(identity, community_id)?;
        Ok(self.instances.lock().contains_key(&key))
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.instances.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
