//! Detail view state for one vehicle.
//!
//! A session shows the cached provider record when there is one and only
//! goes to the provider on a cache miss or an explicit refresh. Fetches for
//! the same registration are serialized through a shared `FetchGate`.

use tracing::{debug, info, warn};

use crate::api::VehicleLookup;
use crate::collection::VehicleCollection;
use crate::error::{GarageError, Result};
use crate::fetch::FetchGate;
use crate::models::{VehicleDetailRecord, VehicleImage, VehicleSummary};
use crate::store::{CachedData, RecordStore};

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading,
    Ready(CachedData<VehicleDetailRecord>),
    Failed(GarageError),
}

/// A detail fetch detached from its session, so it can run on another task.
/// Hand the result back with `VehicleDetailSession::finish_fetch`.
#[derive(Clone)]
pub struct DetailFetch {
    registration: String,
    /// Skip the cache re-check and always go to the provider
    refresh: bool,
    store: RecordStore,
    gate: FetchGate,
}

impl DetailFetch {
    pub fn registration(&self) -> &str {
        &self.registration
    }

    pub fn is_refresh(&self) -> bool {
        self.refresh
    }

    /// Fetch and cache the record while holding the registration's permit.
    pub async fn run<L: VehicleLookup>(self, lookup: &L) -> Result<CachedData<VehicleDetailRecord>> {
        let registration = self.registration.as_str();
        let _permit = self.gate.acquire(registration).await;

        // Another session may have filled the cache while we waited
        if !self.refresh {
            if let Some(cached) = self.store.load_detail(registration)? {
                debug!(registration = %registration, "Detail cache filled while waiting");
                return Ok(cached);
            }
        }

        let record = lookup.fetch_details(registration).await?;
        let cached = self.store.save_detail(registration, record)?;
        if self.refresh {
            info!(registration = %registration, "Refreshed vehicle details");
        } else {
            info!(registration = %registration, "Fetched and cached vehicle details");
        }
        Ok(cached)
    }
}

pub struct VehicleDetailSession {
    registration: String,
    state: DetailState,
    image: Option<VehicleImage>,
    store: RecordStore,
    gate: FetchGate,
}

impl VehicleDetailSession {
    pub fn new(registration: &str, store: RecordStore, gate: FetchGate) -> Self {
        Self {
            registration: registration.trim().to_string(),
            state: DetailState::Loading,
            image: None,
            store,
            gate,
        }
    }

    pub fn registration(&self) -> &str {
        &self.registration
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    /// The record on display, if loaded.
    pub fn detail(&self) -> Option<&CachedData<VehicleDetailRecord>> {
        match &self.state {
            DetailState::Ready(cached) => Some(cached),
            _ => None,
        }
    }

    pub fn image(&self) -> Option<&VehicleImage> {
        self.image.as_ref()
    }

    fn require_registration(&self) -> Result<&str> {
        if self.registration.is_empty() {
            Err(GarageError::MissingRegistration)
        } else {
            Ok(&self.registration)
        }
    }

    /// Show the cached record, fetching it only if nothing is cached.
    pub async fn open<L: VehicleLookup>(&mut self, lookup: &L) -> &DetailState {
        if let Some(fetch) = self.begin_open() {
            let result = fetch.run(lookup).await;
            self.finish_fetch(result);
        }
        &self.state
    }

    /// Fetch fresh details regardless of the cache and replace the cached record.
    pub async fn refresh<L: VehicleLookup>(&mut self, lookup: &L) -> &DetailState {
        if let Some(fetch) = self.begin_refresh() {
            let result = fetch.run(lookup).await;
            self.finish_fetch(result);
        }
        &self.state
    }

    /// Start opening the view. A cache hit (or a failure reading the cache)
    /// settles the state at once; on a miss the state is `Loading` and the
    /// returned fetch must be run.
    pub fn begin_open(&mut self) -> Option<DetailFetch> {
        self.state = DetailState::Loading;
        let cached = self
            .require_registration()
            .and_then(|registration| {
                self.store
                    .load_detail(registration)
                    .map_err(GarageError::from)
            });

        match cached {
            Ok(Some(cached)) => {
                debug!(registration = %self.registration, age = %cached.age_display(), "Detail cache hit");
                self.state = DetailState::Ready(cached);
                None
            }
            Ok(None) => Some(self.detail_fetch(false)),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    /// Put the view into `Loading` and return the fetch that refreshes it.
    pub fn begin_refresh(&mut self) -> Option<DetailFetch> {
        self.state = DetailState::Loading;
        match self.require_registration() {
            Ok(_) => Some(self.detail_fetch(true)),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    /// Apply the result of a fetch started by `begin_open` or `begin_refresh`.
    pub fn finish_fetch(&mut self, result: Result<CachedData<VehicleDetailRecord>>) -> &DetailState {
        match result {
            Ok(cached) => self.state = DetailState::Ready(cached),
            Err(e) => self.fail(e),
        }
        &self.state
    }

    fn detail_fetch(&self, refresh: bool) -> DetailFetch {
        DetailFetch {
            registration: self.registration.clone(),
            refresh,
            store: self.store.clone(),
            gate: self.gate.clone(),
        }
    }

    fn fail(&mut self, err: GarageError) {
        warn!(registration = %self.registration, error = %err, "Failed to load vehicle details");
        self.state = DetailState::Failed(err);
    }

    // ===== Images =====

    /// Read the attached photo, if any, into the session.
    pub fn load_image(&mut self) -> Result<Option<&VehicleImage>> {
        let image = self.store.load_image(self.require_registration()?)?;
        self.image = image;
        Ok(self.image.as_ref())
    }

    /// Attach `data` as this vehicle's photo, replacing any previous one.
    pub fn attach_image(&mut self, data: Vec<u8>) -> Result<&VehicleImage> {
        let registration = self.require_registration()?;
        if data.is_empty() {
            return Err(GarageError::UnsupportedImage("file is empty".to_string()));
        }
        let image = VehicleImage::from_bytes(data)
            .ok_or_else(|| GarageError::UnsupportedImage("unrecognised format".to_string()))?;

        self.store.save_image(registration, &image)?;
        info!(
            registration = %registration,
            media_type = %image.media_type,
            bytes = image.size_bytes(),
            "Attached vehicle image"
        );
        Ok(self.image.insert(image))
    }

    pub fn remove_image(&mut self) -> Result<()> {
        let registration = self.require_registration()?;
        self.store.remove_image(registration)?;
        debug!(registration = %registration, "Removed vehicle image");
        self.image = None;
        Ok(())
    }

    /// Remove this vehicle from `collection`. Cached details and the photo stay.
    pub fn remove(&self, collection: &mut VehicleCollection) -> Result<Option<VehicleSummary>> {
        let registration = self.require_registration()?;
        collection.remove_registration(registration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::LookupError;
    use crate::store::StoreError;
    use crate::testing::{record, MockLookup};

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

    fn session(registration: &str, store: &RecordStore) -> VehicleDetailSession {
        VehicleDetailSession::new(registration, store.clone(), FetchGate::new())
    }

    #[tokio::test]
    async fn test_open_uses_cache_without_lookup() {
        let store = RecordStore::in_memory();
        let cached = store
            .save_detail("ABC123", record("ABC123", "ROVER", "BLUE", 2004))
            .unwrap();
        let lookup = MockLookup::new();

        let mut session = session("ABC123", &store);
        let state = session.open(&lookup).await.clone();

        assert_eq!(state, DetailState::Ready(cached));
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_open_fetches_and_caches_on_miss() {
        let store = RecordStore::in_memory();
        let lookup = MockLookup::new().with_record(record("SW03PER", "FORD", "SILVER", 2003));

        let mut session = session("SW03PER", &store);
        session.open(&lookup).await;

        let stored = store.load_detail("SW03PER").unwrap().unwrap();
        assert_eq!(stored.data, record("SW03PER", "FORD", "SILVER", 2003));
        assert_eq!(session.state(), &DetailState::Ready(stored));
        assert_eq!(lookup.calls(), 1);

        // A second view hits the cache
        let mut again = VehicleDetailSession::new("SW03PER", store.clone(), FetchGate::new());
        again.open(&lookup).await;
        assert_eq!(lookup.calls(), 1);
        assert_eq!(again.detail(), session.detail());
    }

    #[tokio::test]
    async fn test_open_trims_registration() {
        let store = RecordStore::in_memory();
        let lookup = MockLookup::new().with_record(record("SW03PER", "FORD", "SILVER", 2003));

        let mut session = session("  SW03PER ", &store);
        assert_eq!(session.registration(), "SW03PER");
        session.open(&lookup).await;
        assert!(session.detail().is_some());
    }

    #[tokio::test]
    async fn test_refresh_always_fetches_and_overwrites() {
        let store = RecordStore::in_memory();
        store
            .save_detail("ABC123", record("ABC123", "ROVER", "BLUE", 2004))
            .unwrap();
        let lookup = MockLookup::new().with_record(record("ABC123", "ROVER", "RED", 2004));

        let mut session = session("ABC123", &store);
        session.open(&lookup).await;
        assert_eq!(lookup.calls(), 0);

        session.refresh(&lookup).await;
        assert_eq!(lookup.calls(), 1);

        let stored = store.load_detail("ABC123").unwrap().unwrap();
        assert_eq!(stored.data, record("ABC123", "ROVER", "RED", 2004));
        assert_eq!(session.state(), &DetailState::Ready(stored));
    }

    #[tokio::test]
    async fn test_begin_open_on_miss_stays_loading_until_finished() {
        let store = RecordStore::in_memory();
        let lookup = MockLookup::new().with_record(record("SW03PER", "FORD", "SILVER", 2003));

        let mut session = session("SW03PER", &store);
        let fetch = session.begin_open().expect("cache miss needs a fetch");
        assert_eq!(session.state(), &DetailState::Loading);
        assert_eq!(fetch.registration(), "SW03PER");
        assert!(!fetch.is_refresh());

        let result = tokio::spawn({
            let lookup = std::sync::Arc::new(lookup);
            async move { fetch.run(lookup.as_ref()).await }
        })
        .await
        .unwrap();
        session.finish_fetch(result);

        let stored = store.load_detail("SW03PER").unwrap().unwrap();
        assert_eq!(session.state(), &DetailState::Ready(stored));
    }

    #[test]
    fn test_begin_open_settles_on_cache_hit() {
        let store = RecordStore::in_memory();
        let cached = store
            .save_detail("ABC123", record("ABC123", "ROVER", "BLUE", 2004))
            .unwrap();

        let mut session = session("ABC123", &store);
        assert!(session.begin_open().is_none());
        assert_eq!(session.state(), &DetailState::Ready(cached));

        let fetch = session.begin_refresh().expect("refresh always fetches");
        assert!(fetch.is_refresh());
        assert_eq!(session.state(), &DetailState::Loading);
    }

    #[tokio::test]
    async fn test_lookup_failure_sets_failed_state() {
        let store = RecordStore::in_memory();
        let lookup = MockLookup::new().with_error("NOPE1", LookupError::NotFound);

        let mut session = session("NOPE1", &store);
        let state = session.open(&lookup).await.clone();

        assert_eq!(state, DetailState::Failed(GarageError::Lookup(LookupError::NotFound)));
        assert!(session.detail().is_none());
        assert!(store.load_detail("NOPE1").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cached_record_in_store() {
        let store = RecordStore::in_memory();
        store
            .save_detail("ABC123", record("ABC123", "ROVER", "BLUE", 2004))
            .unwrap();
        let lookup = MockLookup::new().with_error("ABC123", LookupError::ProviderUnavailable);

        let mut session = session("ABC123", &store);
        session.refresh(&lookup).await;

        assert!(matches!(session.state(), DetailState::Failed(_)));
        assert!(store.load_detail("ABC123").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_registration_fails_without_lookup() {
        let store = RecordStore::in_memory();
        let lookup = MockLookup::new();

        let mut session = session("   ", &store);
        let state = session.open(&lookup).await.clone();

        assert_eq!(state, DetailState::Failed(GarageError::MissingRegistration));
        assert_eq!(lookup.calls(), 0);
        assert_eq!(session.attach_image(PNG_BYTES.to_vec()).unwrap_err(), GarageError::MissingRegistration);
    }

    #[tokio::test]
    async fn test_corrupt_cache_fails_then_refresh_heals() {
        let store = RecordStore::in_memory();
        store.backend().set("vehicle_details_ABC123", "{broken").unwrap();
        let lookup = MockLookup::new().with_record(record("ABC123", "ROVER", "BLUE", 2004));

        let mut session = session("ABC123", &store);
        session.open(&lookup).await;
        assert!(matches!(
            session.state(),
            DetailState::Failed(GarageError::Storage(StoreError::Serialization { .. }))
        ));

        session.refresh(&lookup).await;
        assert!(session.detail().is_some());
        assert!(store.load_detail("ABC123").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_sessions_share_one_fetch() {
        let store = RecordStore::in_memory();
        let gate = FetchGate::new();
        let lookup = MockLookup::new().with_record(record("SW03PER", "FORD", "SILVER", 2003));

        let mut first = VehicleDetailSession::new("SW03PER", store.clone(), gate.clone());
        let mut second = VehicleDetailSession::new("SW03PER", store.clone(), gate.clone());

        tokio::join!(first.open(&lookup), second.open(&lookup));

        assert_eq!(lookup.calls(), 1);
        assert_eq!(lookup.peak_concurrency(), 1);
        assert_eq!(first.detail(), second.detail());
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_are_serialized() {
        let store = RecordStore::in_memory();
        let gate = FetchGate::new();
        let lookup = MockLookup::new().with_record(record("SW03PER", "FORD", "SILVER", 2003));

        let mut first = VehicleDetailSession::new("SW03PER", store.clone(), gate.clone());
        let mut second = VehicleDetailSession::new("SW03PER", store.clone(), gate.clone());

        tokio::join!(first.refresh(&lookup), second.refresh(&lookup));

        assert_eq!(lookup.calls(), 2);
        assert_eq!(lookup.peak_concurrency(), 1);
    }

    // ===== Images =====

    #[test]
    fn test_attach_and_remove_image() {
        let store = RecordStore::in_memory();
        let mut session = session("ABC123", &store);
        assert_eq!(session.load_image().unwrap(), None);

        let attached = session.attach_image(PNG_BYTES.to_vec()).unwrap().clone();
        assert_eq!(attached.media_type, "image/png");
        assert_eq!(session.image(), Some(&attached));

        // Visible to a later session
        let mut later = VehicleDetailSession::new("ABC123", store.clone(), FetchGate::new());
        assert_eq!(later.load_image().unwrap(), Some(&attached));

        session.remove_image().unwrap();
        assert_eq!(session.image(), None);
        assert_eq!(store.load_image("ABC123").unwrap(), None);
    }

    #[test]
    fn test_attach_rejects_non_images() {
        let store = RecordStore::in_memory();
        let mut session = session("ABC123", &store);

        assert_eq!(
            session.attach_image(Vec::new()).unwrap_err(),
            GarageError::UnsupportedImage("file is empty".to_string())
        );
        assert_eq!(
            session.attach_image(b"plain text".to_vec()).unwrap_err(),
            GarageError::UnsupportedImage("unrecognised format".to_string())
        );
        assert_eq!(store.load_image("ABC123").unwrap(), None);
    }

    // ===== Remove =====

    #[test]
    fn test_remove_vehicle_keeps_cached_data() {
        let store = RecordStore::in_memory();
        store
            .save_vehicles(&[VehicleSummary::new(1, "ABC123"), VehicleSummary::new(2, "XYZ789")])
            .unwrap();
        store
            .save_detail("ABC123", record("ABC123", "ROVER", "BLUE", 2004))
            .unwrap();
        let mut collection = VehicleCollection::load(store.clone()).unwrap();
        collection.select(1);

        let mut session = session("ABC123", &store);
        session.attach_image(PNG_BYTES.to_vec()).unwrap();
        let removed = session.remove(&mut collection).unwrap();

        assert_eq!(removed.map(|v| v.id), Some(1));
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.selected(), None);
        assert!(store.load_detail("ABC123").unwrap().is_some());
        assert!(store.load_image("ABC123").unwrap().is_some());
    }
}
