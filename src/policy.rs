//! Cache Policy Module
//!
//! Decides whether cached data should be reloaded for a given policy.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;

use crate::error::CacheError;

// == Cache Policy ==
/// Strategy controlling how existing cached data is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachePolicy {
    /// Ignores cache data and always loads from the source
    IgnoreCache,
    /// Always reloads, returning cache data only if the reload fails
    ReloadAndReturnCacheOnFailure,
    /// Returns cache data and never refreshes an existing cache
    ReturnCacheDontReload,
    /// Reloads and returns cache data
    ReloadAndReturnCache,
    /// Refreshes the cache once it is older than the staleness threshold
    ReloadIfExpiredAndReturnCache,
    /// Invalidates the cache without refreshing it
    InvalidateDontReload,
    /// Invalidates the cache and refreshes it
    InvalidateAndReload,
}

impl CachePolicy {
    /// Every policy, in declaration order.
    pub const ALL: [CachePolicy; 7] = [
        CachePolicy::IgnoreCache,
        CachePolicy::ReloadAndReturnCacheOnFailure,
        CachePolicy::ReturnCacheDontReload,
        CachePolicy::ReloadAndReturnCache,
        CachePolicy::ReloadIfExpiredAndReturnCache,
        CachePolicy::InvalidateDontReload,
        CachePolicy::InvalidateAndReload,
    ];

    /// Canonical name, as accepted by `FromStr`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CachePolicy::IgnoreCache => "IgnoreCache",
            CachePolicy::ReloadAndReturnCacheOnFailure => "ReloadAndReturnCacheOnFailure",
            CachePolicy::ReturnCacheDontReload => "ReturnCacheDontReload",
            CachePolicy::ReloadAndReturnCache => "ReloadAndReturnCache",
            CachePolicy::ReloadIfExpiredAndReturnCache => "ReloadIfExpiredAndReturnCache",
            CachePolicy::InvalidateDontReload => "InvalidateDontReload",
            CachePolicy::InvalidateAndReload => "InvalidateAndReload",
        }
    }

    /// Returns the fixed outcome for policies that never look at timestamps.
    fn fixed_outcome(&self) -> Option<bool> {
        match self {
            CachePolicy::IgnoreCache
            | CachePolicy::ReturnCacheDontReload
            | CachePolicy::InvalidateDontReload => Some(false),
            CachePolicy::ReloadAndReturnCache
            | CachePolicy::ReloadAndReturnCacheOnFailure
            | CachePolicy::InvalidateAndReload => Some(true),
            CachePolicy::ReloadIfExpiredAndReturnCache => None,
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CachePolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CachePolicy::ALL
            .into_iter()
            .find(|policy| policy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CacheError::InvalidArgument(format!("Unknown cache policy: {}", s)))
    }
}

// == Reload Decision ==
/// Decides whether cached data must be reloaded, evaluated at `now_ms`.
///
/// Non-expiry policies return their fixed outcome without consulting the
/// timestamps. The expiry policy reloads when the cache is missing, when
/// either `stale_after_ms` or `last_cached_ms` is not positive, or when more
/// than `stale_after_ms` has elapsed since `last_cached_ms`.
pub fn needs_reload_at(
    now_ms: i64,
    cache_exists: bool,
    policy: CachePolicy,
    last_cached_ms: i64,
    stale_after_ms: i64,
) -> bool {
    if let Some(outcome) = policy.fixed_outcome() {
        return outcome;
    }
    if !cache_exists || stale_after_ms <= 0 || last_cached_ms <= 0 {
        return true;
    }
    now_ms.saturating_sub(last_cached_ms) > stale_after_ms
}

/// Same as [`needs_reload_at`], evaluated against the current wall clock.
pub fn needs_reload(
    cache_exists: bool,
    policy: CachePolicy,
    last_cached_ms: i64,
    stale_after_ms: i64,
) -> bool {
    needs_reload_at(
        Utc::now().timestamp_millis(),
        cache_exists,
        policy,
        last_cached_ms,
        stale_after_ms,
    )
}
