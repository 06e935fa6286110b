//! # arrangement-engine
//!
//! The core behind the Delta event pages: checking what a user typed into
//! the event form, moving times between Oslo wall-clock and UTC, and saving
//! the result through the backend event API.
//!
//! ## Modules
//!
//! - [`temporal`]: Local ↔ UTC conversion per instant, Bokmål date, range and duration formatting
//! - [`validation`]: Event draft rules; every failing field reported at once
//! - [`submission`]: Create-or-update orchestration over an [`EventApi`]
//! - [`client`]: The [`EventApi`] seam and its HTTP implementation
//! - [`model`]: Shapes exchanged with the backend
//! - [`auth`]: Token gate checked before page-level operations
//! - [`error`]: Error types

pub mod auth;
pub mod client;
pub mod error;
pub mod model;
pub mod submission;
pub mod temporal;
pub mod validation;

pub use auth::{AuthGate, StaticTokenGate};
pub use client::{EventApi, HttpEventApi};
pub use error::{ApiError, AuthError, TemporalError};
pub use model::{
    Category, CurrentUser, EventId, EventPayload, EventQuery, EventWithParticipants, Participant,
    PersistedEvent,
};
pub use submission::{SubmitError, Submitter};
pub use temporal::{parse_instant, DurationParts, TemporalNormalizer, DEFAULT_TIMEZONE};
pub use validation::{
    validate, EventDraft, Field, ParticipantPolicy, ValidatedEvent, ValidationErrors,
};
