//! Core data types for found-item reports.
//!
//! A [`Draft`] is edited field by field while the reporter fills in the form.
//! On submit it is turned into an immutable [`Record`] that references the
//! uploaded photo by URL. [`SubmitState`] is the status of the most recent
//! submit attempt.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Status written to every record produced by the found-item workflow.
pub const STATUS_FOUND: &str = "FOUND";

/// Authenticated user handle supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable unique user id, stored as [`Record::user_id`].
    pub id: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }
}

/// Opaque reference to local image data that has not been uploaded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef(PathBuf);

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Lowercased file extension of a known image type, `jpg` otherwise.
    pub fn extension(&self) -> &'static str {
        let ext = self
            .0
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => "png",
            Some("webp") => "webp",
            Some("gif") => "gif",
            Some("heic") => "heic",
            _ => "jpg",
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// A text field of the [`Draft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    ItemName,
    Category,
    Description,
    PhoneNumber,
    Date,
    Time,
    Location,
}

impl DraftField {
    pub const ALL: [DraftField; 7] = [
        DraftField::ItemName,
        DraftField::Category,
        DraftField::Description,
        DraftField::PhoneNumber,
        DraftField::Date,
        DraftField::Time,
        DraftField::Location,
    ];

    /// Form label shown next to the field.
    pub fn label(self) -> &'static str {
        match self {
            DraftField::ItemName => "Item name",
            DraftField::Category => "Category",
            DraftField::Description => "Description",
            DraftField::PhoneNumber => "Phone number",
            DraftField::Date => "Date",
            DraftField::Time => "Time",
            DraftField::Location => "Location",
        }
    }

    /// Every field except the category must be filled in.
    pub fn is_required(self) -> bool {
        !matches!(self, DraftField::Category)
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// In-progress found-item report.
///
/// Fields hold free-form text. `date` and `time` are never parsed; `location`
/// comes from reverse geocoding or a manual map pick (see [`crate::location`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub item_name: String,
    pub category: String,
    pub description: String,
    pub phone_number: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub image: Option<ImageRef>,
}

impl Draft {
    pub fn field(&self, field: DraftField) -> &str {
        match field {
            DraftField::ItemName => &self.item_name,
            DraftField::Category => &self.category,
            DraftField::Description => &self.description,
            DraftField::PhoneNumber => &self.phone_number,
            DraftField::Date => &self.date,
            DraftField::Time => &self.time,
            DraftField::Location => &self.location,
        }
    }

    pub fn set(&mut self, field: DraftField, value: String) {
        let slot = match field {
            DraftField::ItemName => &mut self.item_name,
            DraftField::Category => &mut self.category,
            DraftField::Description => &mut self.description,
            DraftField::PhoneNumber => &mut self.phone_number,
            DraftField::Date => &mut self.date,
            DraftField::Time => &mut self.time,
            DraftField::Location => &mut self.location,
        };
        *slot = value;
    }

    /// Required fields that are empty or whitespace-only, in form order.
    pub fn blank_fields(&self) -> Vec<DraftField> {
        DraftField::ALL
            .into_iter()
            .filter(|f| f.is_required() && self.field(*f).trim().is_empty())
            .collect()
    }
}

/// Found-item report as stored in the remote `items` table.
///
/// Serialized with camelCase keys. An empty `id` is left out of the payload so
/// the store can assign one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub description: String,
    pub location: String,
    pub phone_number: String,
    pub image_url: String,
    pub user_id: String,
    pub status: String,
}

impl Record {
    /// Build a found-item record. The item name is annotated with the date the
    /// item was found: `"Wallet (Found on 08/10/2025)"`.
    pub fn found(draft: &Draft, image_url: String, user: &Identity) -> Self {
        Self {
            id: String::new(),
            name: format!("{} (Found on {})", draft.item_name, draft.date),
            category: draft.category.clone(),
            description: draft.description.clone(),
            location: draft.location.clone(),
            phone_number: draft.phone_number.clone(),
            image_url,
            user_id: user.id.clone(),
            status: STATUS_FOUND.to_string(),
        }
    }

    pub fn with_id(mut self, id: String) -> Self {
        self.id = id;
        self
    }
}

/// Status of the most recent submit attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmitState {
    #[default]
    Idle,
    Loading,
    Success(String),
    Error(String),
}

impl SubmitState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SubmitState::Loading)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmitState::Success(_) | SubmitState::Error(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            SubmitState::Success(m) | SubmitState::Error(m) => Some(m),
            SubmitState::Idle | SubmitState::Loading => None,
        }
    }
}
