use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Principal;

/// Errors raised while turning client input into an item
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Validation failed: {0} is required")]
    MissingRequiredField(&'static str),

    #[error("Validation failed: {0} cannot be empty")]
    EmptyField(&'static str),

    #[error("Validation failed: `{0}` is not a valid status (expected lost or found)")]
    InvalidStatus(String),

    #[error("Validation failed: invalid date `{0}`")]
    InvalidDate(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Lost,
    Found,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Lost => "lost",
            ItemStatus::Found => "found",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "lost" => Ok(ItemStatus::Lost),
            "found" => Ok(ItemStatus::Found),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for ItemStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A lost or found report as stored and returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    #[sqlx(try_from = "String")]
    pub status: ItemStatus,
    pub date: DateTime<Utc>,
    pub owner: String,
    pub media_url: Option<String>,
}

/// Validated fields for a record that does not exist yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub title: String,
    pub description: String,
    pub location: String,
    pub status: ItemStatus,
    pub date: Option<DateTime<Utc>>,
    pub owner: String,
    pub media_url: Option<String>,
}

impl NewItem {
    /// Materialize the record under a store-assigned id.
    pub fn into_item(self, id: Uuid) -> Item {
        Item {
            id,
            title: self.title,
            description: self.description,
            location: self.location,
            status: self.status,
            date: self.date.unwrap_or_else(Utc::now),
            owner: self.owner,
            media_url: self.media_url,
        }
    }
}

/// Validated overwrites for an existing record. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: Option<ItemStatus>,
    pub date: Option<DateTime<Utc>>,
    pub media_url: Option<String>,
}

impl ItemChanges {
    pub fn with_media_url(mut self, media_url: Option<String>) -> Self {
        if media_url.is_some() {
            self.media_url = media_url;
        }
        self
    }

    /// Owner and id are not part of the change set and cannot be touched here.
    pub fn apply_to(self, item: &mut Item) {
        if let Some(title) = self.title {
            item.title = title;
        }
        if let Some(description) = self.description {
            item.description = description;
        }
        if let Some(location) = self.location {
            item.location = location;
        }
        if let Some(status) = self.status {
            item.status = status;
        }
        if let Some(date) = self.date {
            item.date = date;
        }
        if let Some(media_url) = self.media_url {
            item.media_url = Some(media_url);
        }
    }
}

/// Client-supplied item fields, from either a JSON or a multipart body.
///
/// Only these fields are ever read from a request. Anything else the client
/// sends (`owner`, `user`, `id`, `mediaUrl`, ...) is dropped.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ItemInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
}

impl ItemInput {
    /// Assign a text field by its form name. Returns false for unknown names.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "title" => &mut self.title,
            "description" => &mut self.description,
            "location" => &mut self.location,
            "status" => &mut self.status,
            "date" => &mut self.date,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Validate for creation. The owner always comes from the verified principal.
    pub fn into_new_item(self, principal: &Principal) -> Result<NewItem, ValidationError> {
        Ok(NewItem {
            title: required("title", self.title)?,
            description: required("description", self.description)?,
            location: required("location", self.location)?,
            status: parse_status(self.status)?.unwrap_or_default(),
            date: parse_date(self.date)?,
            owner: principal.subject.clone(),
            media_url: None,
        })
    }

    /// Validate for update. Present fields obey the same rules as on create.
    pub fn into_changes(self) -> Result<ItemChanges, ValidationError> {
        Ok(ItemChanges {
            title: optional("title", self.title)?,
            description: optional("description", self.description)?,
            location: optional("location", self.location)?,
            status: parse_status(self.status)?,
            date: parse_date(self.date)?,
            media_url: None,
        })
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        None => Err(ValidationError::MissingRequiredField(field)),
        Some(v) if v.trim().is_empty() => Err(ValidationError::MissingRequiredField(field)),
        Some(v) => Ok(v),
    }
}

fn optional(field: &'static str, value: Option<String>) -> Result<Option<String>, ValidationError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ValidationError::EmptyField(field)),
        other => Ok(other),
    }
}

// An empty status field (blank form input) means "not specified".
fn parse_status(value: Option<String>) -> Result<Option<ItemStatus>, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => v.parse().map(Some),
        _ => Ok(None),
    }
}

fn parse_date(value: Option<String>) -> Result<Option<DateTime<Utc>>, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => DateTime::parse_from_rfc3339(v.trim())
            .map(|d| Some(d.with_timezone(&Utc)))
            .map_err(|_| ValidationError::InvalidDate(v)),
        _ => Ok(None),
    }
}
