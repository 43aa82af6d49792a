//! Local file plumbing for cvflow.
//!
//! Studio inputs travel between the platform and the operator's disk in a
//! small YAML envelope (`{path, inputs}`); autofill actions and port
//! configurations come from operator-maintained CSV/TSV tables. This crate
//! owns those formats.

pub mod actions;
pub mod envelope;
pub mod error;
pub mod ports;

pub use actions::AutofillAction;
pub use envelope::InputsEnvelope;
pub use error::{InputsError, InputsResult};
