//! Data source orchestrator.
//!
//! Coordinates per-source fetches behind the session gate: reconnect
//! detection via the visible address, dependency-keyed fetch dedup for the
//! music source, and the upload path for the video source. Each decision
//! (begin) and completion is an explicit step so the state machine can be
//! exercised without a network; the async drivers just compose them.

use crate::address::Address;
use crate::api::WellnessApi;
use crate::models::{ContentAnalysis, MusicAnalysis, UserProfile};
use crate::session::Session;
use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Query parameter the connect flow sets on the redirect back.
const SPOTIFY_CONNECTED_PARAM: &str = "spotify";
const CONNECTED_VALUE: &str = "connected";

/// Dependency tuple the music fetch reacts to. A fetch is considered once
/// per change of this tuple, never re-triggered by unrelated re-evaluations.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FetchKey {
    token: Option<String>,
    connected: bool,
}

/// A stored analysis with the time it was received. Replaced wholesale on
/// re-fetch; last write wins.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub analysis: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> Snapshot<T> {
    fn now(analysis: T) -> Self {
        Self {
            analysis,
            fetched_at: Utc::now(),
        }
    }
}

/// Owns the per-source analysis slots, loading flags, and fetch memoization.
#[derive(Default)]
pub struct SourceOrchestrator {
    music: Option<Snapshot<MusicAnalysis>>,
    content: Option<Snapshot<ContentAnalysis>>,
    music_loading: bool,
    content_loading: bool,
    identity_refreshing: bool,
    last_music_key: Option<FetchKey>,
}

impl SourceOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn music(&self) -> Option<&MusicAnalysis> {
        self.music.as_ref().map(|s| &s.analysis)
    }

    pub fn content(&self) -> Option<&ContentAnalysis> {
        self.content.as_ref().map(|s| &s.analysis)
    }

    pub fn music_fetched_at(&self) -> Option<DateTime<Utc>> {
        self.music.as_ref().map(|s| s.fetched_at)
    }

    #[allow(dead_code)] // Accessor for loading indicators
    pub fn music_loading(&self) -> bool {
        self.music_loading
    }

    #[allow(dead_code)] // Accessor for loading indicators
    pub fn content_loading(&self) -> bool {
        self.content_loading
    }

    /// Drop all analyses and flags. Called on logout.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Start an identity refresh if the address carries the reconnect
    /// marker, a credential is present, and no refresh is in flight.
    ///
    /// Returns the token to refresh with. The marker is only removed on
    /// successful completion, so detection against an already-cleared
    /// address performs no refetch.
    pub fn begin_identity_refresh(
        &mut self,
        address: &Address,
        session: &Session,
    ) -> Option<String> {
        if address.get(SPOTIFY_CONNECTED_PARAM) != Some(CONNECTED_VALUE) {
            return None;
        }
        if self.identity_refreshing {
            return None;
        }
        let token = session.token()?;

        self.identity_refreshing = true;
        Some(token.to_string())
    }

    /// Finish an identity refresh. On success the refreshed profile updates
    /// the session and the reconnect marker is removed from the address so
    /// the same signal is never observed twice. Failure is absorbed.
    pub fn complete_identity_refresh(
        &mut self,
        address: &mut Address,
        session: &mut Session,
        result: Result<UserProfile>,
    ) {
        match result {
            Ok(profile) => {
                info!("Identity refreshed after reconnect");
                session.set_identity(profile);
                address.remove(SPOTIFY_CONNECTED_PARAM);
            }
            Err(e) => debug!("Identity refresh failed: {}", e),
        }
        self.identity_refreshing = false;
    }

    /// Start a music fetch if the dependency tuple (token, connected flag)
    /// changed since it was last observed, the source is connected, a
    /// credential is present, and no fetch is in flight. Returns the token
    /// to fetch with.
    pub fn begin_music_fetch(&mut self, session: &Session) -> Option<String> {
        // An in-flight fetch defers the observation rather than consuming it.
        if self.music_loading {
            return None;
        }

        let key = FetchKey {
            token: session.token().map(str::to_string),
            connected: session.spotify_connected(),
        };
        if self.last_music_key.as_ref() == Some(&key) {
            return None;
        }
        self.last_music_key = Some(key);

        // The change is recorded even when the gate is closed: a later
        // identical observation stays a no-op.
        let token = session.token()?;
        if !session.spotify_connected() {
            return None;
        }

        self.music_loading = true;
        Some(token.to_string())
    }

    /// Finish a music fetch. Success replaces the stored analysis
    /// wholesale; failure clears the loading flag silently, with no retry
    /// and no user-visible error.
    pub fn complete_music_fetch(&mut self, result: Result<MusicAnalysis>) {
        match result {
            Ok(analysis) => {
                info!("Music analysis updated ({} tracks)", analysis.total_tracks_analyzed);
                self.music = Some(Snapshot::now(analysis));
            }
            Err(e) => debug!("Music fetch failed: {}", e),
        }
        self.music_loading = false;
    }

    /// One pass of the reactive loop: reconnect detection first (it may
    /// refresh the connection flags), then the per-source fetch decision.
    pub async fn sync<A: WellnessApi + ?Sized>(
        &mut self,
        session: &mut Session,
        address: &mut Address,
        api: &A,
    ) {
        if let Some(token) = self.begin_identity_refresh(address, session) {
            let result = api.fetch_profile(&token).await;
            self.complete_identity_refresh(address, session, result);
        }

        if let Some(token) = self.begin_music_fetch(session) {
            let result = api.fetch_music_analysis(&token).await;
            self.complete_music_fetch(result);
        }
    }

    /// Upload watch history for analysis.
    ///
    /// Returns `Ok(false)` without any network call when no credential is
    /// present or an upload is already in flight. Unlike the music path,
    /// a failure here propagates to the caller as a blocking notice.
    pub async fn upload_watch_history<A: WellnessApi + ?Sized>(
        &mut self,
        session: &Session,
        api: &A,
        watch_history: &std::path::Path,
        search_history: Option<&std::path::Path>,
    ) -> Result<bool> {
        let Some(token) = session.token() else {
            return Ok(false);
        };
        if self.content_loading {
            return Ok(false);
        }

        self.content_loading = true;
        let result = api
            .analyze_watch_history(token, watch_history, search_history)
            .await;
        self.content_loading = false;

        let analysis = result?;
        info!(
            "Content analysis updated ({} videos)",
            analysis.total_videos_analyzed
        );
        self.content = Some(Snapshot::now(analysis));
        Ok(true)
    }
}
