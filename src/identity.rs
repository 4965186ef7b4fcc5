//! Identity Module
//!
//! Account identities and the keys used to select a cache manager instance.

use std::fmt;

use parking_lot::RwLock;

use crate::error::{CacheError, Result};

/// Community id reserved for the internal (default) community.
///
/// Treated exactly like "no community" when deriving identity keys.
pub const INTERNAL_COMMUNITY_ID: &str = "000000000000000AAA";

// == Identity ==
/// An authenticated account as seen by the cache layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable user identifier
    pub user_id: String,
    /// Community the account is logged into, if any
    pub community_id: Option<String>,
}

impl Identity {
    /// Creates an identity without a community.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            community_id: None,
        }
    }

    /// Creates an identity bound to a community.
    pub fn with_community(user_id: impl Into<String>, community_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            community_id: Some(community_id.into()),
        }
    }
}

// == Identity Key ==
/// Derived string uniquely identifying a (user, community) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Derives the key for `identity` in `community_id`.
    ///
    /// When `community_id` is None the identity's own community is used.
    /// The internal community and blank community ids both mean "no
    /// community". The user id is taken verbatim and length-prefixed so that
    /// no two distinct (user, community) pairs produce the same key.
    ///
    /// # Errors
    /// `CacheError::InvalidArgument` if the user id is blank.
    pub fn derive(identity: &Identity, community_id: Option<&str>) -> Result<Self> {
        let user_id = identity.user_id.as_str();
        if user_id.trim().is_empty() {
            return Err(CacheError::InvalidArgument(
                "Identity user id cannot be empty".to_string(),
            ));
        }

        let community = community_id
            .or(identity.community_id.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != INTERNAL_COMMUNITY_ID)
            .unwrap_or("");

        Ok(Self(format!("{}:{}{}", user_id.len(), user_id, community)))
    }

    /// Returns the key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the key as a lowercase hex string, safe to use as a path segment.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Identity Provider ==
/// Source of the currently logged-in account.
pub trait IdentityProvider: Send + Sync {
    /// Returns the current account, or None when nobody is logged in.
    fn current_account(&self) -> Option<Identity>;
}

/// Identity provider holding a single, replaceable account.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    current: RwLock<Option<Identity>>,
}

impl StaticIdentityProvider {
    pub fn new(current: Option<Identity>) -> Self {
        Self {
            current: RwLock::new(current),
        }
    }

    /// Replaces the current account (login, logout or account switch).
    pub fn set_current(&self, identity: Option<Identity>) {
        *self.current.write() = identity;
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn current_account(&self) -> Option<Identity> {
        self.current.read().clone()
    }
}
