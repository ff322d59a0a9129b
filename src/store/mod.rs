pub mod backend;

use std::{collections::BTreeMap, sync::Arc};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::{
    error::AppError,
    models::{
        trip::Trip,
        user::{UserAccount, UserRecord},
    },
};

pub use backend::{FileBackend, MemoryBackend, StorageBackend};

pub const USERS_DOC: &str = "users.json";
pub const TRIPS_DOC: &str = "trips.json";

/// Accounts keyed by username. BTreeMap keeps cross-user iteration
/// deterministic (username order).
pub type UserMap = BTreeMap<String, UserAccount>;
/// Each user's trips in insertion order.
pub type TripMap = BTreeMap<String, Vec<Trip>>;

/// Repository over the two JSON documents. A corrupt document is treated
/// as empty state rather than an error; the app keeps running with no
/// users or trips instead of crashing.
#[derive(Clone)]
pub struct JsonStore {
    backend: Arc<dyn StorageBackend>,
}

impl JsonStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub async fn load_users(&self) -> Result<UserMap, AppError> {
        let records: BTreeMap<String, UserRecord> = self.load_doc(USERS_DOC).await?;
        Ok(records
            .into_iter()
            .map(|(name, record)| (name, UserAccount::from(record)))
            .collect())
    }

    pub async fn save_users(&self, users: &UserMap) -> Result<(), AppError> {
        self.save_doc(USERS_DOC, users).await
    }

    pub async fn load_trips(&self) -> Result<TripMap, AppError> {
        self.load_doc(TRIPS_DOC).await
    }

    pub async fn save_trips(&self, trips: &TripMap) -> Result<(), AppError> {
        self.save_doc(TRIPS_DOC, trips).await
    }

    async fn load_doc<T>(&self, doc: &str) -> Result<BTreeMap<String, T>, AppError>
    where
        T: DeserializeOwned,
    {
        let Some(raw) = self.backend.read(doc).await? else {
            return Ok(BTreeMap::new());
        };
        if raw.is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_slice(&raw) {
            Ok(map) => Ok(map),
            Err(err) => {
                warn!("unparseable document {doc}, starting empty: {err}");
                Ok(BTreeMap::new())
            }
        }
    }

    async fn save_doc<T>(&self, doc: &str, map: &BTreeMap<String, T>) -> Result<(), AppError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(map).map_err(|err| AppError::Other(err.into()))?;
        self.backend.write(doc, &data).await
    }
}
