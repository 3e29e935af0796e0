//! Application state management for the garage TUI.
//!
//! `App` owns the vehicle collection, the open detail session and all UI
//! state. Every provider lookup (adding a vehicle, opening or refreshing the
//! detail view, bulk validation) runs on a spawned task and reports back over
//! an mpsc channel that the main loop drains on every tick.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use garage_core::{
    run_validation, ApiClient, CachedData, Config, DetailFetch, DetailState, FetchGate,
    GarageError, LookupError, RecordStore, ValidationOutcome, ValidationState, VehicleCollection,
    VehicleDetailRecord, VehicleDetailSession, VehicleSummary,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for registration input.
/// UK plates are at most 8 characters including the space.
const MAX_REGISTRATION_LENGTH: usize = 16;

/// Maximum length for the image path input.
const MAX_PATH_LENGTH: usize = 1024;

/// Subdirectory of the data directory holding the record store.
const STORE_DIR: &str = "store";

// ============================================================================
// UI State Types
// ============================================================================

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Garage,
    Detail,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    AddingVehicle,
    AttachingImage,
    ConfirmingRemove,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from spawned tasks back to the main loop.
enum BackgroundResult {
    /// Every vehicle has been checked against the provider
    Validation(Vec<ValidationOutcome>),
    /// Lookup for a vehicle being added finished
    Added {
        registration: String,
        result: std::result::Result<VehicleDetailRecord, LookupError>,
    },
    /// Detail fetch for an open or refreshed view finished
    Detail {
        registration: String,
        refresh: bool,
        result: garage_core::Result<CachedData<VehicleDetailRecord>>,
    },
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub api: ApiClient,
    pub store: RecordStore,
    pub gate: FetchGate,
    pub collection: VehicleCollection,

    // UI state
    pub state: AppState,
    pub view: View,
    pub cursor: usize,
    pub input: String,
    pub detail: Option<VehicleDetailSession>,
    pub status_message: Option<String>,

    // Background task channel
    background_rx: mpsc::Receiver<BackgroundResult>,
    background_tx: mpsc::Sender<BackgroundResult>,
}

impl App {
    /// Open the on-disk store under the configured data directory.
    pub fn new(config: Config) -> Result<Self> {
        let data_dir = config.data_dir()?;
        let store_dir = data_dir.join(STORE_DIR);
        debug!(?store_dir, "Store directory configured");

        let store = RecordStore::open_dir(&store_dir)
            .with_context(|| format!("Failed to open store at {}", store_dir.display()))?;
        let api = ApiClient::from_config(&config)?;
        Self::with_parts(config, store, api)
    }

    pub fn with_parts(config: Config, store: RecordStore, api: ApiClient) -> Result<Self> {
        let gate = FetchGate::new();
        let collection = VehicleCollection::load_with_gate(store.clone(), gate.clone())
            .context("Failed to load the garage")?;
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Ok(Self {
            config,
            api,
            store,
            gate,
            collection,

            state: AppState::Normal,
            view: View::Garage,
            cursor: 0,
            input: String::new(),
            detail: None,
            status_message: None,

            background_rx: rx,
            background_tx: tx,
        })
    }

    /// Vehicle under the cursor in the garage list.
    pub fn vehicle_at_cursor(&self) -> Option<&VehicleSummary> {
        self.collection.vehicles().get(self.cursor)
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.collection.len().saturating_sub(1));
    }

    fn report_error(&mut self, err: &GarageError) {
        self.status_message = Some(err.to_string());
    }

    // =========================================================================
    // Garage view
    // =========================================================================

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.collection.len() {
            self.cursor += 1;
        }
    }

    /// Select the vehicle under the cursor, or deselect it if already selected.
    pub fn toggle_select(&mut self) {
        let Some(id) = self.vehicle_at_cursor().map(|v| v.id) else {
            return;
        };
        if self.collection.selected_id() == Some(id) {
            self.collection.clear_selection();
        } else {
            self.collection.select(id);
        }
    }

    pub fn start_add(&mut self) {
        self.input.clear();
        self.state = AppState::AddingVehicle;
    }

    pub fn cancel_input(&mut self) {
        self.input.clear();
        self.state = AppState::Normal;
    }

    /// Look up the typed registration in the background and add it when
    /// the result arrives.
    pub fn submit_add(&mut self) {
        let input = std::mem::take(&mut self.input);
        self.state = AppState::Normal;

        let registration = match self.collection.begin_add(&input) {
            Ok(registration) => registration,
            Err(e) => {
                self.report_error(&e);
                return;
            }
        };

        debug!(registration = %registration, "Looking up vehicle to add");
        self.status_message = Some(format!("Looking up {}...", registration));

        let api = self.api.clone();
        let gate = self.gate.clone();
        let tx = self.background_tx.clone();
        tokio::spawn(async move {
            let result = gate.fetch(&api, &registration).await;
            Self::send_result(&tx, BackgroundResult::Added { registration, result }).await;
        });
    }

    fn apply_added(
        &mut self,
        registration: &str,
        result: std::result::Result<VehicleDetailRecord, LookupError>,
    ) {
        match self.collection.finish_add(registration, result) {
            Ok(vehicle) => {
                self.cursor = self.collection.len().saturating_sub(1);
                self.status_message = Some(format!("Added {}", vehicle.registration_number));
            }
            Err(e) => self.report_error(&e),
        }
    }

    /// Remove the vehicle under the cursor.
    pub fn remove_at_cursor(&mut self) {
        let Some(id) = self.vehicle_at_cursor().map(|v| v.id) else {
            return;
        };
        match self.collection.remove(id) {
            Ok(Some(removed)) => {
                self.clamp_cursor();
                self.status_message = Some(format!("Removed {}", removed.registration_number));
            }
            Ok(None) => {}
            Err(e) => self.report_error(&e),
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check every vehicle in the background.
    pub fn start_validation(&mut self) {
        let Some(targets) = self.collection.begin_validation() else {
            self.status_message = Some("Validation already running...".to_string());
            return;
        };
        if targets.is_empty() {
            // Nothing to check, but the run still counts
            self.apply_validation(Vec::new());
            return;
        }

        info!(count = targets.len(), "Starting validation");
        let api = self.api.clone();
        let gate = self.gate.clone();
        let tx = self.background_tx.clone();
        tokio::spawn(async move {
            let outcomes = run_validation(&api, &gate, targets).await;
            Self::send_result(&tx, BackgroundResult::Validation(outcomes)).await;
        });
        self.status_message = Some("Validating vehicles...".to_string());
    }

    /// Run the automatic validation pass if it is due.
    pub fn start_auto_validation(&mut self) {
        match self
            .collection
            .should_auto_validate(self.config.revalidate_after())
        {
            Ok(true) => self.start_validation(),
            Ok(false) => debug!("Automatic validation not due"),
            Err(e) => {
                warn!(error = %e, "Could not read validation marker");
                self.report_error(&e);
            }
        }
    }

    pub fn validation_running(&self) -> bool {
        self.collection.validation_state() == ValidationState::Running
    }

    fn apply_validation(&mut self, outcomes: Vec<ValidationOutcome>) {
        match self.collection.finish_validation(outcomes) {
            Ok(report) => {
                self.clamp_cursor();
                self.status_message = Some(if report.invalid == 0 {
                    format!("Validated {} vehicles", report.valid)
                } else {
                    format!(
                        "Validated {} vehicles, {} failed",
                        report.valid + report.invalid,
                        report.invalid
                    )
                });
            }
            Err(e) => self.report_error(&e),
        }
    }

    /// Helper to send background results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<BackgroundResult>, result: BackgroundResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send background result - channel closed");
        }
    }

    /// Check for completed background tasks and process results
    pub async fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.background_rx.try_recv() {
            results.push(result);
        }

        for result in results {
            self.process_background_result(result);
        }
    }

    fn process_background_result(&mut self, result: BackgroundResult) {
        match result {
            BackgroundResult::Validation(outcomes) => self.apply_validation(outcomes),
            BackgroundResult::Added {
                registration,
                result,
            } => self.apply_added(&registration, result),
            BackgroundResult::Detail {
                registration,
                refresh,
                result,
            } => self.apply_detail(&registration, refresh, result),
        }
    }

    // =========================================================================
    // Detail view
    // =========================================================================

    /// Open the detail view for the vehicle under the cursor. A cached
    /// record shows at once; otherwise the view shows `Loading` until the
    /// background fetch reports back.
    pub fn open_detail(&mut self) {
        let Some(registration) = self
            .vehicle_at_cursor()
            .map(|v| v.registration_number.clone())
        else {
            return;
        };

        let mut session =
            VehicleDetailSession::new(&registration, self.store.clone(), self.gate.clone());
        if let Err(e) = session.load_image() {
            warn!(registration = %registration, error = %e, "Failed to load vehicle image");
            self.report_error(&e);
        }
        if let Some(fetch) = session.begin_open() {
            self.spawn_detail_fetch(fetch);
        }

        self.detail = Some(session);
        self.view = View::Detail;
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
        self.view = View::Garage;
        self.state = AppState::Normal;
    }

    /// Fetch fresh details for the open vehicle in the background.
    pub fn refresh_detail(&mut self) {
        let Some(session) = self.detail.as_mut() else {
            return;
        };
        if session.state() == &DetailState::Loading {
            self.status_message = Some("Already loading...".to_string());
            return;
        }

        match session.begin_refresh() {
            Some(fetch) => {
                self.status_message = Some(format!("Refreshing {}...", fetch.registration()));
                self.spawn_detail_fetch(fetch);
            }
            None => {
                if let DetailState::Failed(e) = session.state() {
                    self.status_message = Some(e.to_string());
                }
            }
        }
    }

    fn spawn_detail_fetch(&self, fetch: DetailFetch) {
        let api = self.api.clone();
        let tx = self.background_tx.clone();
        tokio::spawn(async move {
            let registration = fetch.registration().to_string();
            let refresh = fetch.is_refresh();
            let result = fetch.run(&api).await;
            Self::send_result(
                &tx,
                BackgroundResult::Detail {
                    registration,
                    refresh,
                    result,
                },
            )
            .await;
        });
    }

    /// Apply a finished detail fetch to the open view. Results for a view
    /// that was closed, or already settled, are dropped.
    fn apply_detail(
        &mut self,
        registration: &str,
        refresh: bool,
        result: garage_core::Result<CachedData<VehicleDetailRecord>>,
    ) {
        let Some(session) = self
            .detail
            .as_mut()
            .filter(|s| s.registration() == registration && s.state() == &DetailState::Loading)
        else {
            debug!(registration = %registration, "Dropping detail result for a closed view");
            return;
        };

        let message = match session.finish_fetch(result) {
            DetailState::Ready(_) if refresh => Some(format!("Refreshed {}", registration)),
            DetailState::Failed(e) => Some(e.to_string()),
            _ => None,
        };
        if message.is_some() {
            self.status_message = message;
        }
    }

    pub fn start_attach_image(&mut self) {
        if self.detail.is_some() {
            self.input.clear();
            self.state = AppState::AttachingImage;
        }
    }

    /// Read the typed path and attach it as the vehicle's photo.
    pub fn submit_attach_image(&mut self) {
        let path = std::mem::take(&mut self.input);
        self.state = AppState::Normal;
        let Some(session) = self.detail.as_mut() else {
            return;
        };

        let path = Path::new(path.trim());
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read image file");
                self.status_message = Some(format!("Could not read {}: {}", path.display(), e));
                return;
            }
        };

        let message = match session.attach_image(data) {
            Ok(image) => format!("Attached {} image", image.media_type),
            Err(e) => e.to_string(),
        };
        self.status_message = Some(message);
    }

    pub fn remove_image(&mut self) {
        let Some(session) = self.detail.as_mut() else {
            return;
        };
        if session.image().is_none() {
            return;
        }
        let message = match session.remove_image() {
            Ok(()) => "Image removed".to_string(),
            Err(e) => e.to_string(),
        };
        self.status_message = Some(message);
    }

    pub fn start_remove_vehicle(&mut self) {
        if self.detail.is_some() {
            self.state = AppState::ConfirmingRemove;
        }
    }

    /// Remove the open vehicle from the garage and go back to the list.
    pub fn confirm_remove_vehicle(&mut self) {
        self.state = AppState::Normal;
        let Some(session) = self.detail.as_ref() else {
            return;
        };

        match session.remove(&mut self.collection) {
            Ok(removed) => {
                let registration = session.registration().to_string();
                if removed.is_none() {
                    debug!(registration = %registration, "Vehicle was already gone");
                }
                self.close_detail();
                self.clamp_cursor();
                self.status_message = Some(format!("Removed {}", registration));
            }
            Err(e) => self.report_error(&e),
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a registration character should be accepted
pub fn can_add_registration_char(current_len: usize, c: char) -> bool {
    current_len < MAX_REGISTRATION_LENGTH && is_valid_input_char(c)
}

/// Check if a file path character should be accepted
pub fn can_add_path_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PATH_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
