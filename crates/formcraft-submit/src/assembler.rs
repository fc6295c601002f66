//! The submission state machine.
//!
//! ```text
//! idle ─► validating ─┬─ invalid ──────────────► invalid (errors shown)
//!                     └─ valid ─► sending ─┬─ 2xx ─► submitted
//!                                          └─ else ► failed (message shown)
//! ```
//!
//! Validation is skipped when the form's submit configuration disables it.
//! A missing endpoint fails before anything is sent. Stored values are
//! cleared only after a successful response; after a failure they stay so the
//! user can retry. While a submission is in flight, further submissions of the
//! same assembler are rejected.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::Instrument;

use formcraft_core::logging::submission_span;
use formcraft_core::{FieldErrors, FormcraftError, FormcraftResult, Settings};
use formcraft_forms::{validate_form_with, PredicateRegistry};
use formcraft_persistence::PersistenceManager;

use crate::payload::SubmissionPayload;
use crate::transport::{SubmissionRequest, Transport};

/// Shown when the transport fails without a usable message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to submit form. Please try again.";

/// Where the state machine currently is.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SubmissionState {
    /// Nothing in progress.
    #[default]
    Idle,
    /// Running the validation engine over every field.
    Validating,
    /// Waiting for the transport.
    Sending,
    /// The endpoint accepted the payload.
    Submitted,
    /// Validation failed; nothing was sent.
    Invalid(FieldErrors),
    /// Sending failed with the message to show.
    Failed(String),
}

impl SubmissionState {
    /// Returns `true` while a submission is in flight.
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Validating | Self::Sending)
    }
}

/// A successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    /// What was sent.
    pub payload: SubmissionPayload,
    /// How long to show the confirmation before resetting the form.
    pub reset_after: Duration,
}

/// Drives submissions of one rendered form.
pub struct SubmissionAssembler {
    transport: Arc<dyn Transport>,
    predicates: PredicateRegistry,
    confirmation_window: Duration,
    state: Mutex<SubmissionState>,
    attempts: AtomicU32,
}

impl SubmissionAssembler {
    /// Creates an assembler sending through `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            predicates: PredicateRegistry::default(),
            confirmation_window: Duration::from_millis(2000),
            state: Mutex::new(SubmissionState::Idle),
            attempts: AtomicU32::new(0),
        }
    }

    /// Creates an assembler with the configured confirmation window.
    pub fn from_settings(transport: Arc<dyn Transport>, settings: &Settings) -> Self {
        Self::new(transport).with_confirmation_window(settings.confirmation_window())
    }

    /// Sets the confirmation window returned on success.
    #[must_use]
    pub const fn with_confirmation_window(mut self, window: Duration) -> Self {
        self.confirmation_window = window;
        self
    }

    /// Resolves named custom rules in `predicates` instead of the builtins.
    #[must_use]
    pub fn with_predicates(mut self, predicates: PredicateRegistry) -> Self {
        self.predicates = predicates;
        self
    }

    /// The current state.
    pub fn state(&self) -> SubmissionState {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Returns to [`SubmissionState::Idle`] unless a submission is in flight.
    pub fn reset(&self) {
        if let Ok(mut state) = self.state.lock() {
            if !state.is_busy() {
                *state = SubmissionState::Idle;
            }
        }
    }

    fn set_state(&self, next: SubmissionState) {
        if let Ok(mut state) = self.state.lock() {
            tracing::debug!(from = ?*state, to = ?next, "Submission state");
            *state = next;
        }
    }

    fn begin(&self, validate: bool) -> FormcraftResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| FormcraftError::Storage("submission state lock poisoned".to_string()))?;
        if state.is_busy() {
            return Err(FormcraftError::SubmissionInProgress);
        }
        *state = if validate {
            SubmissionState::Validating
        } else {
            SubmissionState::Sending
        };
        Ok(())
    }

    /// Submits the values held by `persistence` for its form.
    ///
    /// Values are loaded first if the manager has not loaded them yet.
    ///
    /// # Errors
    ///
    /// - [`FormcraftError::SubmissionInProgress`] if another submission is in flight;
    /// - [`FormcraftError::Validation`] with every field error, nothing sent;
    /// - [`FormcraftError::MissingEndpoint`] if no endpoint is configured, nothing sent;
    /// - [`FormcraftError::Transport`] with the message to show; values are kept.
    pub async fn submit(
        &self,
        persistence: &mut PersistenceManager,
    ) -> FormcraftResult<SubmissionOutcome> {
        let form = persistence.form().clone();
        let config = &form.submit_config;
        self.begin(config.validation)?;

        if !persistence.is_loaded() {
            persistence.load();
        }
        let values = persistence.values().clone();

        if config.validation {
            let errors = validate_form_with(&form, &values, &self.predicates);
            if !errors.is_empty() {
                tracing::debug!(form = %form.id, errors = errors.len(), "Submission blocked by validation");
                self.set_state(SubmissionState::Invalid(errors.clone()));
                return Err(FormcraftError::Validation(errors));
            }
            self.set_state(SubmissionState::Sending);
        }

        let Some(endpoint) = config.endpoint() else {
            let err = FormcraftError::MissingEndpoint;
            self.set_state(SubmissionState::Failed(err.to_string()));
            return Err(err);
        };

        let payload = SubmissionPayload::build(&form, &values);
        let request = SubmissionRequest {
            endpoint: endpoint.to_string(),
            method: config.http_method,
            headers: config.headers.clone(),
            body: match serde_json::to_value(&payload) {
                Ok(body) => body,
                Err(e) => {
                    self.set_state(SubmissionState::Failed(GENERIC_FAILURE_MESSAGE.to_string()));
                    return Err(e.into());
                }
            },
        };

        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        let span = submission_span(&form.id, attempt);
        let result = self.transport.send(&request).instrument(span).await;

        let message = match result {
            Ok(response) if response.is_success() => {
                persistence.clear();
                tracing::info!(form = %form.id, attempt, status = response.status, "Form submitted");
                self.set_state(SubmissionState::Submitted);
                return Ok(SubmissionOutcome {
                    payload,
                    reset_after: self.confirmation_window,
                });
            }
            Ok(response) => {
                let message = response.failure_message();
                tracing::warn!(form = %form.id, attempt, status = response.status, message = %message, "Submission rejected");
                message
            }
            Err(e) => {
                tracing::warn!(form = %form.id, attempt, error = %e, "Submission transport failed");
                match e {
                    FormcraftError::Transport(m) if !m.trim().is_empty() => m,
                    _ => GENERIC_FAILURE_MESSAGE.to_string(),
                }
            }
        };

        self.set_state(SubmissionState::Failed(message.clone()));
        Err(FormcraftError::Transport(message))
    }
}

impl std::fmt::Debug for SubmissionAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionAssembler")
            .field("state", &self.state())
            .field("confirmation_window", &self.confirmation_window)
            .finish_non_exhaustive()
    }
}
