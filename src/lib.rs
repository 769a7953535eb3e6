//! # TrackBack
//!
//! Found-item reporting for a campus lost-and-found service.
//!
//! The core of the crate is the [`submission::SubmissionController`]: it owns
//! the draft of a found-item report, checks it, uploads the attached photo to
//! object storage, inserts the resulting record into a table store, and
//! publishes a four-state result that any number of observers can watch.
//!
//! Everything the controller talks to sits behind a trait in [`traits`], so
//! the same workflow runs against S3 + PostgREST in production, a local
//! directory + SQLite during development, or hand-written doubles in tests.
//!
//! ## Architecture
//!
//! ```text
//!  set_field / set_image           submit(identity)
//!          │                              │
//!          ▼                              ▼
//! ┌──────────────────────────────────────────────────┐
//! │              SubmissionController                │
//! │  Draft ──▶ ImageResolver ──▶ ObjectStorage       │
//! │                                  │ public_url    │
//! │                                  ▼               │
//! │                     Record ──▶ TableStore        │
//! └──────────────┬───────────────────────────────────┘
//!                ▼
//!     watch<SubmitState>: Idle → Loading → Success | Error
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Draft, record, identity and state types |
//! | [`error`] | Submission error taxonomy |
//! | [`traits`] | Collaborator traits |
//! | [`submission`] | The submission workflow controller |
//! | [`identity`] | Identity providers |
//! | [`image`] | Local image resolver |
//! | [`location`] | Location descriptions and reverse geocoding |
//! | [`storage_s3`] | S3-compatible object storage |
//! | [`storage_local`] | Local-directory object storage |
//! | [`table_sqlite`] | SQLite table store |
//! | [`table_rest`] | PostgREST table store |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`listings`] | Recent listings |

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod image;
pub mod listings;
pub mod location;
pub mod migrate;
pub mod models;
pub mod storage_local;
pub mod storage_s3;
pub mod submission;
pub mod table_rest;
pub mod table_sqlite;
pub mod traits;

#[cfg(test)]
mod test_http;
