//! The found-item submission workflow.
//!
//! [`SubmissionController`] owns one in-progress [`Draft`] and the
//! [`SubmitState`] of its latest submit attempt. Callers mutate the draft
//! through commands, watch the state through a `tokio::sync::watch` channel,
//! and call [`submit`](SubmissionController::submit) when the reporter is done.
//!
//! # Submit flow
//!
//! ```text
//! submit(identity)
//!   ├─ state is Loading?      → Err(AlreadySubmitting), state untouched
//!   ├─ no identity            → Error("User not logged in.")
//!   ├─ no image               → Error("Please select an image.")
//!   └─ Loading
//!        ├─ ImageResolver::read_all
//!        ├─ ObjectStorage::upload  (<key_prefix><uuid>.<ext>)
//!        ├─ ObjectStorage::public_url
//!        ├─ TableStore::insert(Record)
//!        └─ Success("Item uploaded successfully!") | Error(message)
//! ```
//!
//! Nothing is retried and nothing is rolled back. If the insert fails after a
//! successful upload, the photo stays in the bucket. Dropping the `submit`
//! future mid-flight publishes `Error("Submission cancelled.")`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use uuid::Uuid;

use crate::config::Config;
use crate::error::SubmitError;
use crate::image::FileImageResolver;
use crate::models::{Draft, DraftField, Identity, ImageRef, Record, SubmitState};
use crate::storage_local::LocalObjectStorage;
use crate::storage_s3::S3ObjectStorage;
use crate::table_rest::RestTableStore;
use crate::table_sqlite::SqliteTableStore;
use crate::traits::{ImageResolver, ObjectStorage, TableStore};

/// Message published when a record has been stored.
pub const SUCCESS_MESSAGE: &str = "Item uploaded successfully!";

/// Where uploads and records go.
#[derive(Debug, Clone)]
pub struct SubmissionTarget {
    pub bucket: String,
    /// Prepended to every generated object key.
    pub key_prefix: String,
    pub table: String,
}

impl SubmissionTarget {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bucket: config.storage.bucket.clone(),
            key_prefix: config.storage.key_prefix.clone(),
            table: config.table.name.clone(),
        }
    }

    /// Fresh object key for an upload of `image`.
    fn object_key(&self, image: &ImageRef) -> String {
        format!("{}{}.{}", self.key_prefix, Uuid::new_v4(), image.extension())
    }
}

impl Default for SubmissionTarget {
    fn default() -> Self {
        Self {
            bucket: "item-images".to_string(),
            key_prefix: "public/".to_string(),
            table: "items".to_string(),
        }
    }
}

/// Holds a found-item draft and drives its submission.
///
/// The controller is `Send + Sync`; share it through an [`Arc`] when the draft
/// is edited from one task while another awaits `submit`.
pub struct SubmissionController {
    draft: Mutex<Draft>,
    state: watch::Sender<SubmitState>,
    images: Arc<dyn ImageResolver>,
    storage: Arc<dyn ObjectStorage>,
    table: Arc<dyn TableStore>,
    target: SubmissionTarget,
}

impl SubmissionController {
    pub fn new(
        images: Arc<dyn ImageResolver>,
        storage: Arc<dyn ObjectStorage>,
        table: Arc<dyn TableStore>,
        target: SubmissionTarget,
    ) -> Self {
        let (state, _) = watch::channel(SubmitState::Idle);
        Self {
            draft: Mutex::new(Draft::default()),
            state,
            images,
            storage,
            table,
            target,
        }
    }

    /// Wire up the backends selected by `[storage]` and `[table]`, reading
    /// images from the local filesystem.
    ///
    /// The sqlite backend expects the schema from `trackback init`.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let storage: Arc<dyn ObjectStorage> = match config.storage.backend.as_str() {
            "s3" => Arc::new(S3ObjectStorage::new(&config.storage)?),
            "local" => Arc::new(LocalObjectStorage::from_config(&config.storage)?),
            other => anyhow::bail!("Unknown storage backend: '{}'", other),
        };
        let table: Arc<dyn TableStore> = match config.table.backend.as_str() {
            "sqlite" => Arc::new(SqliteTableStore::connect(config).await?),
            "rest" => Arc::new(RestTableStore::new(&config.table)?),
            other => anyhow::bail!("Unknown table backend: '{}'", other),
        };

        tracing::debug!(
            storage = %config.storage.backend,
            table = %config.table.backend,
            "submission backends ready"
        );
        Ok(Self::new(
            Arc::new(FileImageResolver),
            storage,
            table,
            SubmissionTarget::from_config(config),
        ))
    }

    pub fn target(&self) -> &SubmissionTarget {
        &self.target
    }

    /// Replace one text field. No validation happens here.
    pub fn set_field(&self, field: DraftField, value: impl Into<String>) {
        self.lock_draft().set(field, value.into());
    }

    pub fn set_image(&self, image: Option<ImageRef>) {
        self.lock_draft().image = image;
    }

    /// Snapshot of the current draft.
    pub fn draft(&self) -> Draft {
        self.lock_draft().clone()
    }

    /// Required fields that are still blank.
    pub fn validate(&self) -> Vec<DraftField> {
        self.lock_draft().blank_fields()
    }

    pub fn state(&self) -> SubmitState {
        self.state.borrow().clone()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SubmitState> {
        self.state.subscribe()
    }

    /// Clear the draft and return to `Idle`.
    ///
    /// Ignored while a submission is in flight.
    pub fn reset(&self) {
        let mut draft = self.lock_draft();
        let reset = self.state.send_if_modified(|state| {
            if state.is_loading() {
                return false;
            }
            *state = SubmitState::Idle;
            true
        });
        if reset {
            *draft = Draft::default();
        }
    }

    /// Submit the current draft on behalf of `identity`.
    ///
    /// The state moves to `Loading` (or straight to `Error` for a failed
    /// precondition) before the first await. A call made while another
    /// submission is `Loading` is rejected with
    /// [`SubmitError::AlreadySubmitting`] and does not touch the state.
    pub async fn submit(&self, identity: Option<&Identity>) -> Result<Record, SubmitError> {
        let (user, image) = self.begin(identity)?;

        tracing::info!(
            user_id = %user.id,
            image = %image,
            bucket = %self.target.bucket,
            "submitting found item"
        );

        let in_flight = InFlight::new(&self.state);
        let result = self.upload_and_insert(&user, &image).await;
        let next = match &result {
            Ok(record) => {
                tracing::info!(record_id = %record.id, image_url = %record.image_url, "found item stored");
                SubmitState::Success(SUCCESS_MESSAGE.to_string())
            }
            Err(e) => {
                tracing::error!(error = %e, "submission failed");
                SubmitState::Error(e.to_string())
            }
        };
        in_flight.finish(next);
        result
    }

    /// Guard and preconditions, applied atomically to the state channel.
    fn begin(&self, identity: Option<&Identity>) -> Result<(Identity, ImageRef), SubmitError> {
        let image = self.lock_draft().image.clone();
        let mut outcome = Err(SubmitError::AlreadySubmitting);

        self.state.send_if_modified(|state| {
            if state.is_loading() {
                return false;
            }
            outcome = match (identity, &image) {
                (None, _) => Err(SubmitError::NotAuthenticated),
                (Some(_), None) => Err(SubmitError::MissingImage),
                (Some(user), Some(image)) => Ok((user.clone(), image.clone())),
            };
            *state = match &outcome {
                Ok(_) => SubmitState::Loading,
                Err(e) => SubmitState::Error(e.to_string()),
            };
            true
        });

        if let Err(ref e) = outcome {
            tracing::warn!(error = %e, "submission rejected");
        }
        outcome
    }

    async fn upload_and_insert(&self, user: &Identity, image: &ImageRef) -> Result<Record, SubmitError> {
        let bytes = self
            .images
            .read_all(image)
            .await
            .map_err(|e| SubmitError::image_read(&e))?;

        let key = self.target.object_key(image);
        let size = bytes.len();
        self.storage
            .upload(&self.target.bucket, &key, bytes)
            .await
            .map_err(|e| SubmitError::upload(&e))?;
        let image_url = self.storage.public_url(&self.target.bucket, &key);
        tracing::debug!(key = %key, size, "image uploaded");

        // Built after the upload so edits made while it ran are included.
        let record = Record::found(&self.lock_draft(), image_url, user);

        let id = self
            .table
            .insert(&self.target.table, &record)
            .await
            .map_err(|e| SubmitError::insert(&e))?;
        Ok(record.with_id(id))
    }

    fn lock_draft(&self) -> MutexGuard<'_, Draft> {
        self.draft.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns the `Loading` state of one submit call.
///
/// If the submit future is dropped before [`finish`](Self::finish), the state
/// moves to `Error("Submission cancelled.")` so the controller can be used
/// again. Remote work already started is abandoned, not undone.
struct InFlight<'a> {
    state: &'a watch::Sender<SubmitState>,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a watch::Sender<SubmitState>) -> Self {
        Self { state, armed: true }
    }

    fn finish(mut self, next: SubmitState) {
        self.armed = false;
        self.state.send_replace(next);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::warn!("submission cancelled while in flight");
        self.state.send_if_modified(|state| {
            if !state.is_loading() {
                return false;
            }
            *state = SubmitState::Error(SubmitError::Cancelled.to_string());
            true
        });
    }
}
