//! Scripted transform history provider
//!
//! Stand-in for a real frame graph in unit and end-to-end tests: returns a
//! queue of canned lookup results and can simulate late or absent data.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{FramePair, LookupError, LookupTime, TransformHistoryProvider, Twist};
use tracing::instrument;

/// When the scripted transform becomes available
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Availability {
    /// Available from the start
    #[default]
    Immediate,
    /// Available after a delay
    After(Duration),
    /// Never available
    Never,
}

/// Arguments of the most recent lookup
#[derive(Debug, Clone, PartialEq)]
pub struct TwistQuery {
    pub tracking_frame: String,
    pub observation_frame: String,
    pub at: LookupTime,
    pub interval: Duration,
}

type Scripted = Result<Twist, LookupError>;

#[derive(Default)]
struct ScriptState {
    responses: VecDeque<Scripted>,
    fallback: Option<Scripted>,
    last: Option<Scripted>,
    last_query: Option<TwistQuery>,
}

/// Scripted provider (cheap to clone, clones share state)
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    state: Arc<Mutex<ScriptState>>,
    availability: Availability,
    lookups: Arc<AtomicU64>,
    waits: Arc<AtomicU64>,
}

impl ScriptedProvider {
    /// Provider with no scripted responses (lookups fail until scripted)
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue responses, returned in order one per lookup
    pub fn with_responses(self, responses: impl IntoIterator<Item = Scripted>) -> Self {
        self.state().responses.extend(responses);
        self
    }

    /// Response used once the queue is exhausted
    ///
    /// Without a fallback the last response repeats.
    pub fn with_fallback(self, response: Scripted) -> Self {
        self.state().fallback = Some(response);
        self
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    /// Queue one more response
    pub fn push_response(&self, response: Scripted) {
        self.state().responses.push_back(response);
    }

    /// Number of twist lookups served
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of availability waits served
    pub fn wait_count(&self) -> u64 {
        self.waits.load(Ordering::SeqCst)
    }

    /// Arguments of the most recent lookup
    pub fn last_query(&self) -> Option<TwistQuery> {
        self.state().last_query.clone()
    }

    fn next_response(&self) -> Scripted {
        let mut state = self.state();
        let response = state
            .responses
            .pop_front()
            .or_else(|| state.fallback.clone())
            .or_else(|| state.last.clone())
            .unwrap_or_else(|| Err(LookupError::other("no scripted response")));
        state.last = Some(response.clone());
        response
    }
}

impl TransformHistoryProvider for ScriptedProvider {
    #[instrument(name = "scripted_wait_until_available", skip(self, frames))]
    async fn wait_until_available(
        &self,
        frames: &FramePair,
        timeout: Duration,
    ) -> Result<(), LookupError> {
        self.waits.fetch_add(1, Ordering::SeqCst);

        let delay = match self.availability {
            Availability::Immediate => return Ok(()),
            Availability::After(delay) if delay <= timeout => {
                tokio::time::sleep(delay).await;
                return Ok(());
            }
            Availability::After(_) | Availability::Never => timeout,
        };

        tokio::time::sleep(delay).await;
        Err(LookupError::Timeout {
            source_frame: frames.source_frame.clone(),
            target_frame: frames.target_frame.clone(),
            waited_ms: timeout.as_millis() as u64,
        })
    }

    async fn lookup_averaged_twist(
        &self,
        tracking_frame: &str,
        observation_frame: &str,
        at: LookupTime,
        interval: Duration,
    ) -> Result<Twist, LookupError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.state().last_query = Some(TwistQuery {
            tracking_frame: tracking_frame.to_string(),
            observation_frame: observation_frame.to_string(),
            at,
            interval,
        });
        self.next_response()
    }
}
