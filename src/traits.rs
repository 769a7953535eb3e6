//! Collaborator traits for the submission workflow.
//!
//! The [`SubmissionController`](crate::submission::SubmissionController) never
//! talks to a concrete service. Each external dependency is a trait here, with
//! built-in implementations elsewhere in the crate:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                SubmissionController                  │
//! └───┬──────────────┬────────────────┬─────────────────┘
//!     ▼              ▼                ▼
//! ImageResolver  ObjectStorage     TableStore
//! (file)         (s3, local)       (sqlite, rest)
//! ```
//!
//! [`IdentityProvider`] and [`LocationResolver`] are consumed by the caller
//! that drives the controller: the identity is passed into `submit`, and the
//! location string is written into the draft before it.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use anyhow::Result;
//! use trackback::traits::ObjectStorage;
//!
//! pub struct NullStorage;
//!
//! #[async_trait]
//! impl ObjectStorage for NullStorage {
//!     async fn upload(&self, _bucket: &str, _key: &str, _bytes: Vec<u8>) -> Result<()> {
//!         Ok(())
//!     }
//!
//!     fn public_url(&self, bucket: &str, key: &str) -> String {
//!         format!("null://{}/{}", bucket, key)
//!     }
//! }
//! ```

use anyhow::Result;
use async_trait::async_trait;

use crate::location::Coordinates;
use crate::models::{Identity, ImageRef, Record};

/// Source of the currently authenticated user.
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, or `None` when nobody is signed in.
    fn current_user(&self) -> Option<Identity>;
}

/// Resolves an [`ImageRef`] to its bytes.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    /// Read the referenced image in full.
    ///
    /// Fails when the reference is stale or unreadable.
    async fn read_all(&self, image: &ImageRef) -> Result<Vec<u8>>;
}

/// Remote object storage for uploaded photos.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `key` in `bucket`.
    ///
    /// Keys are generated fresh for every upload; implementations do not need
    /// to handle overwrites specially.
    async fn upload(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()>;

    /// Publicly reachable URL of an object.
    fn public_url(&self, bucket: &str, key: &str) -> String;
}

/// Remote table store for item records.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Insert `record` into `table` and return the id the store assigned.
    async fn insert(&self, table: &str, record: &Record) -> Result<String>;
}

/// Turns coordinates into a human-readable place description.
#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// Best address for `coords`, `None` when the provider knows nothing.
    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Option<String>>;
}
