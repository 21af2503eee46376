//! Core data models for the avatar proxy
//!
//! These types flow between the web layer, the resolution pipeline, the
//! cache and the upstream client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resolved avatar state for a user identifier.
///
/// `avatar_hash == None` means the user has no custom avatar and a default
/// avatar should be served. Descriptors are immutable once created; a fresh
/// lookup replaces an entry rather than mutating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarDescriptor {
    pub user_id: String,
    pub avatar_hash: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl AvatarDescriptor {
    pub fn new(user_id: impl Into<String>, avatar_hash: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            avatar_hash,
            fetched_at: Utc::now(),
        }
    }

    pub fn has_custom_avatar(&self) -> bool {
        self.avatar_hash.is_some()
    }

    /// Animated avatars are marked by the upstream with an `a_` hash prefix.
    pub fn is_animated(&self) -> bool {
        matches!(&self.avatar_hash, Some(hash) if hash.starts_with("a_"))
    }
}

/// User payload as returned by the upstream directory API.
///
/// Only the fields the resolver needs; everything else in the upstream
/// response is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamUser {
    pub id: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl From<UpstreamUser> for AvatarDescriptor {
    fn from(user: UpstreamUser) -> Self {
        // An empty-string hash is the same as no hash at all.
        let avatar_hash = user.avatar.filter(|hash| !hash.is_empty());
        AvatarDescriptor::new(user.id, avatar_hash)
    }
}

/// Per-request rendering hints from the query string.
///
/// Hints are never cached alongside the descriptor; the same cached entry can
/// serve any size/extension combination.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvatarQuery {
    /// Requested image size; kept as a raw string so a non-numeric value
    /// falls back to the default size instead of failing extraction.
    pub size: Option<String>,
    /// Requested image extension, accepted as either `type` or `extension`.
    #[serde(rename = "type", alias = "extension")]
    pub extension: Option<String>,
}

/// Outcome of a successful resolution: where the image lives and how long
/// clients may cache the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAvatar {
    pub location: String,
    pub max_age: Duration,
}
