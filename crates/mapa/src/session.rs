//! Atlas rebuild bookkeeping.
//!
//! Rebuilding an atlas is only needed when the set of distinct cache keys
//! changes; moving features or editing non-visual attributes keeps the
//! current atlas. Builds may overlap, so every request gets a token and only
//! the result of the latest request is ever applied. A build that aborts
//! leaves the previously applied atlas in place.

use std::collections::BTreeSet;

use log::{debug, info, warn};

use mapa_core::style::CacheKey;

use crate::atlas::{AtlasError, StyleMap, TextureAtlas};

/// Identifies one atlas build request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// A rebuild the caller should run.
#[derive(Debug, Clone)]
pub struct AtlasRequest {
    token: RequestToken,
    styles: StyleMap,
}

impl AtlasRequest {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    /// The styles to build, a snapshot taken at request time.
    pub fn styles(&self) -> &StyleMap {
        &self.styles
    }
}

/// What [`AtlasSession::complete`] did with a build result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasUpdate {
    /// The atlas is now the current one.
    Applied,
    /// A newer request exists; the result was discarded.
    Stale,
    /// The build aborted; the previous atlas stays current.
    Retained,
}

/// Tracks the displayed atlas and outstanding requests.
#[derive(Debug, Default)]
pub struct AtlasSession {
    current: Option<TextureAtlas>,
    requested_keys: Option<BTreeSet<CacheKey>>,
    latest: Option<RequestToken>,
    next_token: u64,
}

impl AtlasSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The atlas currently displayed, if any build has been applied.
    pub fn current(&self) -> Option<&TextureAtlas> {
        self.current.as_ref()
    }

    /// The token of the latest request, if any.
    pub fn latest(&self) -> Option<RequestToken> {
        self.latest
    }

    /// Requests a rebuild for `styles`.
    ///
    /// Returns `None` when the key set equals the one last requested, so
    /// nothing needs building.
    pub fn request(&mut self, styles: &StyleMap) -> Option<AtlasRequest> {
        let keys: BTreeSet<CacheKey> = styles.keys().cloned().collect();
        if self.requested_keys.as_ref() == Some(&keys) {
            debug!(keys_count = keys.len(); "Cache keys unchanged, no rebuild");
            return None;
        }

        let token = RequestToken(self.next_token);
        self.next_token += 1;
        self.latest = Some(token);
        self.requested_keys = Some(keys);
        debug!(token = token.0, styles_count = styles.len(); "Atlas rebuild requested");

        Some(AtlasRequest {
            token,
            styles: styles.clone(),
        })
    }

    /// Records the outcome of the build started for `token`.
    pub fn complete(
        &mut self,
        token: RequestToken,
        result: Result<TextureAtlas, AtlasError>,
    ) -> AtlasUpdate {
        if self.latest != Some(token) {
            debug!(token = token.0; "Discarding stale atlas");
            return AtlasUpdate::Stale;
        }

        match result {
            Ok(atlas) => {
                info!(token = token.0, entries_count = atlas.entries().len(); "Atlas applied");
                self.current = Some(atlas);
                AtlasUpdate::Applied
            }
            Err(err) => {
                warn!(token = token.0, err:%; "Atlas build aborted, keeping previous atlas");
                // Ask again on the next request even if the keys did not change
                self.requested_keys = None;
                AtlasUpdate::Retained
            }
        }
    }
}
