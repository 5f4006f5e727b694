//! Debounced address autocomplete engine.
//!
//! Converts free-text address input into a committed geocoded location with
//! search-as-you-type suggestions. Event-driven: state changes only on
//! keystrokes, debounce-timer fires, search responses, and selection.
//!
//! Debounce is generation-counted: each keystroke bumps the generation, and a
//! timer that wakes to find itself superseded does nothing — at most one
//! pending deferred search exists at any time. Issued searches additionally
//! carry a monotonically increasing sequence number; a response whose sequence
//! is no longer the highest issued is discarded, so the last *issued* request
//! wins rather than the last response to arrive.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::GeocoderConfig;
use crate::geocode::{SearchBackend, SearchCandidate, SelectedLocation};

/// Listener invoked with the raw text on every keystroke and on selection.
pub type ChangeListener = Arc<dyn Fn(&str) + Send + Sync>;
/// Listener invoked synchronously with the committed location on selection.
pub type SelectListener = Arc<dyn Fn(&SelectedLocation) + Send + Sync>;

// ─── Options ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AutocompleteOptions {
    /// Quiet period after the last keystroke before a search is issued.
    pub debounce: Duration,
    /// Queries with fewer trimmed characters than this are never searched.
    pub min_query_len: usize,
}

impl Default for AutocompleteOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            min_query_len: 3,
        }
    }
}

impl AutocompleteOptions {
    pub fn from_config(cfg: &GeocoderConfig) -> Self {
        Self {
            debounce: Duration::from_millis(cfg.debounce_ms),
            min_query_len: cfg.min_query_len,
        }
    }
}

// ─── Component state ──────────────────────────────────────────────────────────

/// Component-local state, mutated only by keystrokes, timer fires, search
/// responses, and selection. Single logical writer behind one mutex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    /// Raw text input, updated on every keystroke with zero latency.
    pub input: String,
    /// Current candidate list (empty when idle or when the last search
    /// produced nothing).
    pub candidates: Vec<SearchCandidate>,
    /// Whether the suggestion panel is rendered. Visible with an empty
    /// candidate list means the "no results" form.
    pub panel_visible: bool,
    /// A search request is currently in flight.
    pub in_flight: bool,
}

// ─── Engine ───────────────────────────────────────────────────────────────────

/// The autocomplete engine, generic over its search backend.
///
/// Purely in-memory and single-instance; recreate per input widget.
pub struct Autocomplete<B: SearchBackend> {
    backend: Arc<B>,
    opts: AutocompleteOptions,
    state: Arc<Mutex<QueryState>>,
    /// Debounce generation — bumped on every keystroke. Only a timer whose
    /// generation is still current may issue a search.
    generation: Arc<AtomicU64>,
    /// Highest issued search sequence. Bumped at issue time and at
    /// invalidation points (input-too-short reset, selection), so responses
    /// from before an invalidation can never re-open the panel.
    issued_seq: Arc<AtomicU64>,
    on_change: Option<ChangeListener>,
    on_select: Option<SelectListener>,
}

impl<B: SearchBackend> Autocomplete<B> {
    pub fn new(backend: Arc<B>, opts: AutocompleteOptions) -> Self {
        Self {
            backend,
            opts,
            state: Arc::new(Mutex::new(QueryState::default())),
            generation: Arc::new(AtomicU64::new(0)),
            issued_seq: Arc::new(AtomicU64::new(0)),
            on_change: None,
            on_select: None,
        }
    }

    /// Seed the input text without triggering a search.
    pub fn with_initial_text(self, text: impl Into<String>) -> Self {
        self.lock_state().input = text.into();
        self
    }

    pub fn with_on_change(mut self, listener: ChangeListener) -> Self {
        self.on_change = Some(listener);
        self
    }

    pub fn with_on_select(mut self, listener: SelectListener) -> Self {
        self.on_select = Some(listener);
        self
    }

    /// Handle a keystroke: record the new text immediately, invalidate any
    /// pending debounce timer, and either reset to idle (short input, no
    /// network access) or start a fresh debounce timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn input(&self, text: &str) {
        self.lock_state().input = text.to_string();
        if let Some(listener) = &self.on_change {
            listener(text);
        }

        // Starting a new timer invalidates any prior pending one, unconditionally.
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if text.trim().chars().count() < self.opts.min_query_len {
            // Invalidate in-flight responses too: once idle, stays idle.
            self.issued_seq.fetch_add(1, Ordering::SeqCst);
            let mut state = self.lock_state();
            state.candidates.clear();
            state.panel_visible = false;
            state.in_flight = false;
            return;
        }

        let query = text.to_string();
        let backend = Arc::clone(&self.backend);
        let state = Arc::clone(&self.state);
        let generation = Arc::clone(&self.generation);
        let issued_seq = Arc::clone(&self.issued_seq);
        let debounce = self.opts.debounce;

        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if generation.load(Ordering::SeqCst) != my_generation {
                // Superseded by a later keystroke during the quiet period.
                return;
            }

            let seq = issued_seq.fetch_add(1, Ordering::SeqCst) + 1;
            state.lock().expect("query state poisoned").in_flight = true;
            debug!(seq, query, "issuing address search");

            let result = backend.search(&query).await;

            if issued_seq.load(Ordering::SeqCst) != seq {
                debug!(seq, query, "discarding stale search response");
                return;
            }

            let mut state = state.lock().expect("query state poisoned");
            match result {
                Ok(candidates) => state.candidates = candidates,
                Err(error) => {
                    // Transport and malformed-body failures degrade to the
                    // same rendered state as an empty result set.
                    warn!(%error, query, "address search failed");
                    state.candidates.clear();
                }
            }
            state.panel_visible = true;
            state.in_flight = false;
        });
    }

    /// Commit the candidate at `index`.
    ///
    /// On success: the input text becomes the candidate's display label, the
    /// panel hides, listeners fire synchronously, and the parsed location is
    /// returned. Returns `None` for an out-of-range index or a candidate
    /// whose upstream coordinates do not parse (logged, nothing committed).
    pub fn select(&self, index: usize) -> Option<SelectedLocation> {
        let (location, label) = {
            let mut state = self.lock_state();
            let candidate = state.candidates.get(index)?;
            let Some(location) = candidate.to_location() else {
                warn!(
                    display_name = %candidate.display_name,
                    "candidate coordinates unparseable — selection ignored"
                );
                return None;
            };
            let label = candidate.display_name.clone();
            state.input = label.clone();
            state.candidates.clear();
            state.panel_visible = false;
            state.in_flight = false;
            (location, label)
        };

        // A committed selection cancels the pending timer and invalidates any
        // in-flight search.
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.issued_seq.fetch_add(1, Ordering::SeqCst);

        if let Some(listener) = &self.on_select {
            listener(&location);
        }
        if let Some(listener) = &self.on_change {
            listener(&label);
        }
        Some(location)
    }

    /// Current state, cloned for rendering.
    pub fn snapshot(&self) -> QueryState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, QueryState> {
        self.state.lock().expect("query state poisoned")
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
