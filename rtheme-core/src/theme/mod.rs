//! Theme model: targets, fields, remote origin metadata

mod cache;
mod descriptor;
mod mapper;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use cache::ThemeCache;
pub use descriptor::{ThemeDescriptor, DESCRIPTOR_FILE};
pub use mapper::{field_path, FieldMapper, FileSource};

use crate::{Error, Result};

/// Owner assigned to themes imported without an explicit user
pub const SYSTEM_USER_ID: i64 = -1;

/// File extension of stylesheet fields
pub const STYLESHEET_EXTENSION: &str = "scss";

/// Rendering context a field is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Common,
    Desktop,
    Mobile,
}

impl Target {
    /// Every target, in id order
    pub const ALL: [Target; 3] = [Target::Common, Target::Desktop, Target::Mobile];

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Common => "common",
            Target::Desktop => "desktop",
            Target::Mobile => "mobile",
        }
    }

    /// Stable numeric id used in storage
    pub fn id(&self) -> i64 {
        match self {
            Target::Common => 0,
            Target::Desktop => 1,
            Target::Mobile => 2,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named slot of theme content within a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Scss,
    HeadTag,
    Header,
    AfterHeader,
    BodyTag,
    Footer,
}

impl Field {
    /// Every allowed field
    pub const ALL: [Field; 6] = [
        Field::Scss,
        Field::HeadTag,
        Field::Header,
        Field::AfterHeader,
        Field::BodyTag,
        Field::Footer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Scss => "scss",
            Field::HeadTag => "head_tag",
            Field::Header => "header",
            Field::AfterHeader => "after_header",
            Field::BodyTag => "body_tag",
            Field::Footer => "footer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }

    /// Whether this field holds a stylesheet rather than markup
    pub fn is_stylesheet(&self) -> bool {
        matches!(self, Field::Scss)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of one field slot
pub type FieldKey = (Target, Field);

/// Write side of a theme's field storage
pub trait FieldStore {
    /// Set or clear a field; `None` and empty content both clear it
    ///
    /// Returns true if the stored value changed.
    fn set_field(&mut self, target: Target, field: Field, content: Option<String>) -> bool;
}

/// Populated fields of one theme
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeFields {
    values: BTreeMap<FieldKey, String>,
}

impl ThemeFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: Target, field: Field) -> Option<&str> {
        self.values.get(&(target, field)).map(String::as_str)
    }

    /// Number of populated fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Populated fields in (target, field) order
    pub fn iter(&self) -> impl Iterator<Item = (Target, Field, &str)> {
        self.values
            .iter()
            .map(|((target, field), value)| (*target, *field, value.as_str()))
    }
}

impl FieldStore for ThemeFields {
    fn set_field(&mut self, target: Target, field: Field, content: Option<String>) -> bool {
        let key = (target, field);
        match content.filter(|c| !c.is_empty()) {
            Some(content) => {
                if self.values.get(&key) == Some(&content) {
                    false
                } else {
                    self.values.insert(key, content);
                    true
                }
            }
            None => self.values.remove(&key).is_some(),
        }
    }
}

/// Where a theme was imported from and which revision it reflects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOrigin {
    /// Normalized clone URL; fixed once the origin is created
    remote_url: String,
    /// Revision returned by the most recent successful fetch
    pub remote_revision: String,
    /// Revision the local field contents were generated from
    pub local_revision: String,
    pub about_url: Option<String>,
    pub license_url: Option<String>,
    /// Advisory drift counter maintained outside this crate
    pub commits_behind: Option<i64>,
    /// When the fields were last synchronized
    pub remote_updated_at: Option<DateTime<Utc>>,
}

impl RemoteOrigin {
    /// Origin for a theme freshly generated from `revision`
    pub fn new(remote_url: impl Into<String>, revision: impl Into<String>) -> Self {
        let revision = revision.into();
        Self {
            remote_url: remote_url.into(),
            remote_revision: revision.clone(),
            local_revision: revision,
            about_url: None,
            license_url: None,
            commits_behind: None,
            remote_updated_at: Some(Utc::now()),
        }
    }

    /// Rebuild an origin from storage
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        remote_url: String,
        remote_revision: String,
        local_revision: String,
        about_url: Option<String>,
        license_url: Option<String>,
        commits_behind: Option<i64>,
        remote_updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            remote_url,
            remote_revision,
            local_revision,
            about_url,
            license_url,
            commits_behind,
            remote_updated_at,
        }
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    /// Record a completed field sync at `revision`
    pub fn mark_synced(&mut self, revision: &str) {
        self.remote_revision = revision.to_string();
        self.local_revision = revision.to_string();
        self.commits_behind = Some(0);
        self.remote_updated_at = Some(Utc::now());
    }

    /// Whether the local fields were generated from the latest fetched revision
    ///
    /// A successful sync sets both revisions, so this only turns false when a
    /// drift check outside this crate advances `remote_revision`.
    pub fn is_up_to_date(&self) -> bool {
        self.local_revision == self.remote_revision
    }

    /// Copy pass-through metadata from a descriptor
    pub fn apply_descriptor(&mut self, descriptor: &ThemeDescriptor) {
        self.about_url = descriptor.about_url.clone();
        self.license_url = descriptor.license_url.clone();
    }
}

/// A theme and its field contents
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Storage id, `None` until persisted
    pub id: Option<i64>,
    pub name: String,
    pub user_id: i64,
    pub fields: ThemeFields,
    pub remote: Option<RemoteOrigin>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Theme {
    /// Create an unsaved theme owned by `user_id` (or the system user)
    pub fn new(name: impl Into<String>, user_id: Option<i64>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name: name.into(),
            user_id: user_id.unwrap_or(SYSTEM_USER_ID),
            fields: ThemeFields::new(),
            remote: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach the remote origin
    pub fn with_remote(mut self, remote: RemoteOrigin) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Storage id, or a `Store` error for unsaved themes
    pub fn require_id(&self) -> Result<i64> {
        self.id
            .ok_or_else(|| Error::Store(format!("Theme '{}' has not been persisted", self.name)))
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote.as_ref().map(RemoteOrigin::remote_url)
    }
}
