use crate::CitycastError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Database, Keyspace, PersistMode};
use std::path::Path;
use std::sync::Mutex;
use tokio::task;

/// Key under which the tracked city list is persisted
pub const CITIES_KEY: &str = "weatherCities";

/// Persistence for the tracked city list
#[async_trait]
pub trait CityStore: Send + Sync {
    /// Load the persisted list. An absent entry yields an empty list.
    async fn load(&self) -> Result<Vec<String>>;
    /// Replace the persisted list
    async fn save(&self, cities: &[String]) -> Result<()>;
}

/// City list stored as a JSON array in an on-disk fjall keyspace
pub struct FjallCityStore {
    db: Database,
    store: Keyspace,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

impl FjallCityStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = Database::builder(path)
            .open()
            .with_context(|| format!("Failed to open city store at {}", path.display()))?;
        let items = db.keyspace("cities", fjall::KeyspaceCreateOptions::default)?;
        Ok(FjallCityStore { db, store: items })
    }
}

#[async_trait]
impl CityStore for FjallCityStore {
    #[tracing::instrument(name = "load_cities", level = "debug", skip(self))]
    async fn load(&self) -> Result<Vec<String>> {
        let store = self.store.clone();
        let key = CITIES_KEY.as_bytes().to_vec();
        let maybe_bytes = task::spawn_blocking(move || get_from_store(store, key)).await??;

        let Some(bytes) = maybe_bytes else {
            tracing::debug!("No persisted city list");
            return Ok(Vec::new());
        };
        let cities: Vec<String> = serde_json::from_slice(&bytes).map_err(|e| {
            CitycastError::storage(format!("Persisted city list is not a JSON array: {e}"))
        })?;
        tracing::debug!("Loaded {} persisted cities", cities.len());
        Ok(cities)
    }

    #[tracing::instrument(name = "save_cities", level = "debug", skip(self))]
    async fn save(&self, cities: &[String]) -> Result<()> {
        let db = self.db.clone();
        let store = self.store.clone();
        let key = CITIES_KEY.as_bytes().to_vec();
        let bytes = serde_json::to_vec(cities)?;
        task::spawn_blocking(move || {
            store.insert(key, bytes)?;
            db.persist(PersistMode::SyncData)
        })
        .await??;
        Ok(())
    }
}

/// Non-durable store, used when nothing should touch the disk
#[derive(Debug, Default)]
pub struct MemoryCityStore {
    cities: Mutex<Option<Vec<String>>>,
}

impl MemoryCityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cities<I, S>(cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cities: Mutex::new(Some(cities.into_iter().map(Into::into).collect())),
        }
    }
}

#[async_trait]
impl CityStore for MemoryCityStore {
    async fn load(&self) -> Result<Vec<String>> {
        let cities = self
            .cities
            .lock()
            .map_err(|_| anyhow::anyhow!("City store lock poisoned"))?;
        Ok(cities.clone().unwrap_or_default())
    }

    async fn save(&self, cities: &[String]) -> Result<()> {
        let mut stored = self
            .cities
            .lock()
            .map_err(|_| anyhow::anyhow!("City store lock poisoned"))?;
        *stored = Some(cities.to_vec());
        Ok(())
    }
}
