//! # formcraft-submit
//!
//! Turns stored field values into a submission and sends it.
//!
//! ## Modules
//!
//! - [`payload`] - Builds the JSON body grouped by group and field name
//! - [`transport`] - The `Transport` trait and its `reqwest` implementation
//! - [`assembler`] - The submission state machine

pub mod assembler;
pub mod payload;
pub mod transport;

pub use assembler::{SubmissionAssembler, SubmissionOutcome, SubmissionState, GENERIC_FAILURE_MESSAGE};
pub use payload::SubmissionPayload;
pub use transport::{HttpTransport, SubmissionRequest, Transport, TransportResponse};
