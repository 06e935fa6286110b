//! The backend event API collaborator.
//!
//! [`EventApi`] is the seam the submission orchestrator and the CLI talk to;
//! [`HttpEventApi`] implements it over HTTP with `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::ApiError;
use crate::model::{EventId, EventPayload, EventQuery, EventWithParticipants, PersistedEvent};

/// Operations the backend exposes for events.
#[async_trait]
pub trait EventApi: Send + Sync {
    /// `GET /event/{id}`
    async fn get_event(&self, id: &EventId) -> Result<EventWithParticipants, ApiError>;

    /// `GET /event` filtered by `query`.
    async fn list_events(&self, query: &EventQuery) -> Result<Vec<PersistedEvent>, ApiError>;

    /// Events the current user has created.
    async fn list_created_events(&self) -> Result<Vec<PersistedEvent>, ApiError>;

    /// Events the current user has signed up for.
    async fn list_joined_events(&self) -> Result<Vec<PersistedEvent>, ApiError>;

    async fn create_event(&self, payload: &EventPayload) -> Result<PersistedEvent, ApiError>;

    async fn update_event(
        &self,
        id: &EventId,
        payload: &EventPayload,
    ) -> Result<PersistedEvent, ApiError>;
}

/// [`EventApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpEventApi {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpEventApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Build with a client that gives up on requests after `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)?;
        // Url::join replaces the last segment unless the base ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Send `token` as a bearer credential on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.base_url.join(path)?;
        let builder = self.client.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "event API response");

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if status == StatusCode::BAD_REQUEST {
            let body = read_body(response).await;
            warn!(%body, "event API rejected request");
            return Err(ApiError::BadRequest(body));
        }
        if status.as_u16() >= 300 {
            let body = read_body(response).await;
            warn!(status = status.as_u16(), %body, "unexpected event API status");
            return Err(ApiError::UnexpectedStatus { status, body });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl EventApi for HttpEventApi {
    #[instrument(skip(self), fields(event_id = %id))]
    async fn get_event(&self, id: &EventId) -> Result<EventWithParticipants, ApiError> {
        let builder = self.request(Method::GET, &format!("event/{id}"))?;
        self.send(builder).await
    }

    #[instrument(skip(self))]
    async fn list_events(&self, query: &EventQuery) -> Result<Vec<PersistedEvent>, ApiError> {
        let builder = self.request(Method::GET, "event")?.query(&query.to_pairs());
        self.send(builder).await
    }

    #[instrument(skip(self))]
    async fn list_created_events(&self) -> Result<Vec<PersistedEvent>, ApiError> {
        let builder = self.request(Method::GET, "admin/event")?;
        self.send(builder).await
    }

    #[instrument(skip(self))]
    async fn list_joined_events(&self) -> Result<Vec<PersistedEvent>, ApiError> {
        let builder = self.request(Method::GET, "user/event")?;
        self.send(builder).await
    }

    #[instrument(skip_all, fields(title = %payload.title))]
    async fn create_event(&self, payload: &EventPayload) -> Result<PersistedEvent, ApiError> {
        let builder = self.request(Method::POST, "event")?.json(payload);
        self.send(builder).await
    }

    #[instrument(skip(self, payload), fields(event_id = %id))]
    async fn update_event(
        &self,
        id: &EventId,
        payload: &EventPayload,
    ) -> Result<PersistedEvent, ApiError> {
        let builder = self.request(Method::PUT, &format!("event/{id}"))?.json(payload);
        self.send(builder).await
    }
}

/// Error body for logging and reporting; a failed read yields an empty body.
async fn read_body(response: Response) -> String {
    match response.text().await {
        Ok(body) => body,
        Err(err) => {
            warn!(error = %err, "could not read event API error body");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::{json, Value};

    fn event_json(id: &str) -> Value {
        json!({
            "id": id,
            "title": "Julebord",
            "description": "Fest",
            "location": "Kantina",
            "startTime": "2024-12-20T17:00:00Z",
            "endTime": "2024-12-20T22:00:00Z",
            "public": true,
            "participantLimit": 40,
            "signupDeadline": null,
        })
    }

    fn payload() -> EventPayload {
        EventPayload {
            title: "Julebord".into(),
            description: "Fest".into(),
            location: "Kantina".into(),
            start_time: "2024-12-20T17:00:00Z".parse().unwrap(),
            end_time: "2024-12-20T22:00:00Z".parse().unwrap(),
            public: true,
            participant_limit: Some(40),
            signup_deadline: None,
        }
    }

    #[tokio::test]
    async fn test_get_event_with_participants() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/event/42");
                then.status(200).json_body(json!({
                    "event": event_json("42"),
                    "participants": [
                        { "email": "kari@nav.no", "firstName": "Kari", "lastName": "Nordmann" }
                    ],
                }));
            })
            .await;

        let api = HttpEventApi::new(&server.base_url()).unwrap();
        let found = api.get_event(&EventId::from("42")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(found.event.id.as_str(), "42");
        assert_eq!(found.event.participant_limit, Some(40));
        assert_eq!(found.participants[0].full_name(), "Kari Nordmann");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/event/missing");
                then.status(404);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/event/bad");
                then.status(400).body("invalid id");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/event/boom");
                then.status(503).body("down");
            })
            .await;

        let api = HttpEventApi::new(&server.base_url()).unwrap();

        let err = api.get_event(&EventId::from("missing")).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.user_message(), None);

        let err = api.get_event(&EventId::from("bad")).await.unwrap_err();
        assert!(matches!(&err, ApiError::BadRequest(body) if body == "invalid id"));
        assert_eq!(err.user_message(), Some("Uventet feil"));

        let err = api.get_event(&EventId::from("boom")).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::UnexpectedStatus { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn test_malformed_instant_in_response_is_a_decode_error() {
        let server = MockServer::start_async().await;
        let mut body = event_json("1");
        body["startTime"] = json!("i morgen");
        server
            .mock_async(|when, then| {
                when.method(GET).path("/event/1");
                then.status(200).json_body(json!({ "event": body, "participants": [] }));
            })
            .await;

        let api = HttpEventApi::new(&server.base_url()).unwrap();
        let err = api.get_event(&EventId::from("1")).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)), "got: {err}");
    }

    #[tokio::test]
    async fn test_list_events_sends_only_set_flags() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/event")
                    .query_param("onlyFuture", "true")
                    .query_param("onlyPublic", "true");
                then.status(200).json_body(json!([event_json("1"), event_json("2")]));
            })
            .await;

        let api = HttpEventApi::new(&server.base_url()).unwrap();
        let events = api.list_events(&EventQuery::upcoming_public()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_create_posts_payload_with_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/event")
                    .header("authorization", "Bearer hemmelig");
                then.status(201).json_body(event_json("99"));
            })
            .await;

        let api = HttpEventApi::new(&server.base_url())
            .unwrap()
            .with_token("hemmelig");
        let created = api.create_event(&payload()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(created.id, EventId::from("99"));
    }

    #[tokio::test]
    async fn test_update_puts_to_event_path() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT).path("/event/7");
                then.status(200).json_body(event_json("7"));
            })
            .await;

        let api = HttpEventApi::new(&server.base_url()).unwrap();
        let updated = api
            .update_event(&EventId::from("7"), &payload())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(updated.id, EventId::from("7"));
    }

    #[tokio::test]
    async fn test_created_and_joined_listings() {
        let server = MockServer::start_async().await;
        let created = server
            .mock_async(|when, then| {
                when.method(GET).path("/admin/event");
                then.status(200).json_body(json!([event_json("1")]));
            })
            .await;
        let joined = server
            .mock_async(|when, then| {
                when.method(GET).path("/user/event");
                then.status(200).json_body(json!([]));
            })
            .await;

        let api = HttpEventApi::new(&server.base_url()).unwrap();
        assert_eq!(api.list_created_events().await.unwrap().len(), 1);
        assert!(api.list_joined_events().await.unwrap().is_empty());
        created.assert_async().await;
        joined.assert_async().await;
    }

    #[test]
    fn test_base_url_with_path_prefix_keeps_prefix() {
        let api = HttpEventApi::new("http://localhost:8080/api").unwrap();
        let url = api.base_url().join("event/1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/event/1");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpEventApi::new("not a url").unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }
}
