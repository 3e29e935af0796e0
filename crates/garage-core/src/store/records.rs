use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{VehicleDetailRecord, VehicleImage, VehicleSummary};

use super::{FileStore, KeyValueStore, MemoryStore, StoreError};

/// Key for the serialized vehicle list
const VEHICLE_LIST_KEY: &str = "garage_vehicles";

/// Key for the automatic validation sentinel
const VALIDATION_FLAG_KEY: &str = "garage_vehicles_validated";

const DETAIL_PREFIX: &str = "vehicle_details_";
const IMAGE_PREFIX: &str = "vehicle_image_";

/// The logical namespaces of the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKey<'a> {
    VehicleList,
    ValidationFlag,
    Detail(&'a str),
    Image(&'a str),
}

impl StoreKey<'_> {
    pub fn as_key(&self) -> String {
        match self {
            StoreKey::VehicleList => VEHICLE_LIST_KEY.to_string(),
            StoreKey::ValidationFlag => VALIDATION_FLAG_KEY.to_string(),
            StoreKey::Detail(reg) => format!("{}{}", DETAIL_PREFIX, reg),
            StoreKey::Image(reg) => format!("{}{}", IMAGE_PREFIX, reg),
        }
    }
}

/// A value plus the time it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

/// Sentinel recording when the last automatic validation pass finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMarker {
    pub validated_at: DateTime<Utc>,
}

impl ValidationMarker {
    pub fn now() -> Self {
        Self {
            validated_at: Utc::now(),
        }
    }

    pub fn is_older_than(&self, window: Duration) -> bool {
        Utc::now() - self.validated_at >= window
    }
}

/// Typed access to the garage's persisted records.
///
/// This is the only code that builds storage keys or touches the backend.
/// Clone is cheap and clones share the same backend.
#[derive(Clone)]
pub struct RecordStore {
    backend: Arc<dyn KeyValueStore>,
}

impl RecordStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// A store persisted under `dir`.
    pub fn open_dir(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self::new(Arc::new(FileStore::open(dir)?)))
    }

    /// The raw backend, for callers that need to inspect stored text.
    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    fn load<T: DeserializeOwned>(&self, key: StoreKey<'_>) -> Result<Option<T>, StoreError> {
        let key = key.as_key();
        let Some(contents) = self.backend.get(&key)? else {
            return Ok(None);
        };
        let value = serde_json::from_str(&contents)
            .map_err(|e| StoreError::serialization(&key, e))?;
        Ok(Some(value))
    }

    fn save<T: Serialize + ?Sized>(&self, key: StoreKey<'_>, value: &T) -> Result<(), StoreError> {
        let key = key.as_key();
        let contents = serde_json::to_string(value).map_err(|e| StoreError::serialization(&key, e))?;
        self.backend.set(&key, &contents)?;
        debug!(key = %key, bytes = contents.len(), "Saved record");
        Ok(())
    }

    fn remove(&self, key: StoreKey<'_>) -> Result<(), StoreError> {
        let key = key.as_key();
        self.backend.remove(&key)?;
        debug!(key = %key, "Removed record");
        Ok(())
    }

    // ===== Vehicle list =====

    pub fn load_vehicles(&self) -> Result<Option<Vec<VehicleSummary>>, StoreError> {
        self.load(StoreKey::VehicleList)
    }

    pub fn save_vehicles(&self, vehicles: &[VehicleSummary]) -> Result<(), StoreError> {
        self.save(StoreKey::VehicleList, vehicles)
    }

    // ===== Detail cache =====

    pub fn load_detail(
        &self,
        registration: &str,
    ) -> Result<Option<CachedData<VehicleDetailRecord>>, StoreError> {
        self.load(StoreKey::Detail(registration))
    }

    /// Replace the cached record for `registration` and return what was written.
    pub fn save_detail(
        &self,
        registration: &str,
        record: VehicleDetailRecord,
    ) -> Result<CachedData<VehicleDetailRecord>, StoreError> {
        let cached = CachedData::new(record);
        self.save(StoreKey::Detail(registration), &cached)?;
        Ok(cached)
    }

    pub fn remove_detail(&self, registration: &str) -> Result<(), StoreError> {
        self.remove(StoreKey::Detail(registration))
    }

    // ===== Images =====

    pub fn load_image(&self, registration: &str) -> Result<Option<VehicleImage>, StoreError> {
        self.load(StoreKey::Image(registration))
    }

    pub fn save_image(&self, registration: &str, image: &VehicleImage) -> Result<(), StoreError> {
        self.save(StoreKey::Image(registration), image)
    }

    pub fn remove_image(&self, registration: &str) -> Result<(), StoreError> {
        self.remove(StoreKey::Image(registration))
    }

    // ===== Validation sentinel =====

    pub fn load_validation_marker(&self) -> Result<Option<ValidationMarker>, StoreError> {
        self.load(StoreKey::ValidationFlag)
    }

    pub fn save_validation_marker(&self, marker: &ValidationMarker) -> Result<(), StoreError> {
        self.save(StoreKey::ValidationFlag, marker)
    }

    pub fn clear_validation_marker(&self) -> Result<(), StoreError> {
        self.remove(StoreKey::ValidationFlag)
    }
}
