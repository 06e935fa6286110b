//! Create-or-update submission of validated events.

use thiserror::Error;
use tracing::{info, instrument};

use crate::client::EventApi;
use crate::error::ApiError;
use crate::model::EventId;
use crate::temporal::TemporalNormalizer;
use crate::validation::{validate, EventDraft, ValidatedEvent, ValidationErrors};

/// Why a draft could not be saved.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Sends validated events to the backend.
///
/// Each call makes exactly one API request. Failures are returned as the
/// API reported them; nothing is retried.
pub struct Submitter<A> {
    api: A,
    normalizer: TemporalNormalizer,
}

impl<A: EventApi> Submitter<A> {
    pub fn new(api: A, normalizer: TemporalNormalizer) -> Self {
        Self { api, normalizer }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Create the event, or update `existing` when editing. Returns the id
    /// of the stored event for navigation to its detail page.
    #[instrument(skip(self, event), fields(title = %event.title()))]
    pub async fn submit(
        &self,
        event: &ValidatedEvent,
        existing: Option<&EventId>,
    ) -> Result<EventId, ApiError> {
        let payload = event.to_payload(&self.normalizer);
        let saved = match existing {
            None => {
                info!("creating event");
                self.api.create_event(&payload).await?
            }
            Some(id) => {
                info!(event_id = %id, "updating event");
                self.api.update_event(id, &payload).await?
            }
        };
        info!(event_id = %saved.id, "event saved");
        Ok(saved.id)
    }

    /// Validate `draft` and submit it if it passes.
    pub async fn submit_draft(
        &self,
        draft: &EventDraft,
        existing: Option<&EventId>,
    ) -> Result<EventId, SubmitError> {
        let event = validate(draft)?;
        Ok(self.submit(&event, existing).await?)
    }
}
