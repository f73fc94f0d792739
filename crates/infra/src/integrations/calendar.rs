//! Google Calendar sync adapter
//!
//! Mirrors scheduled tasks into a Google calendar: one event per task,
//! created on first sync and patched afterwards.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use questlog_core::CalendarSync;
use questlog_domain::{CalendarConfig, QuestlogError, Result, Task};
use reqwest::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::HttpClient;

/// Event length used when a task has neither an end time nor a duration.
const FALLBACK_EVENT_MINUTES: i64 = 30;

#[derive(Debug, Serialize)]
struct EventTime {
    #[serde(rename = "dateTime")]
    date_time: String,
    #[serde(rename = "timeZone")]
    time_zone: &'static str,
}

#[derive(Debug, Serialize)]
struct EventBody<'a> {
    summary: &'a str,
    description: &'a str,
    start: EventTime,
    end: EventTime,
}

#[derive(Debug, Deserialize)]
struct EventResponse {
    id: String,
}

/// [`CalendarSync`] implementation over the Google Calendar v3 REST API.
pub struct GoogleCalendarSync {
    http: HttpClient,
    api_base: String,
    calendar_id: String,
    access_token: String,
}

impl GoogleCalendarSync {
    pub fn new(
        http: HttpClient,
        api_base: impl Into<String>,
        calendar_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            calendar_id: calendar_id.into(),
            access_token: access_token.into(),
        }
    }

    /// Build the adapter from configuration.
    ///
    /// Returns `Ok(None)` when sync is disabled.
    ///
    /// # Errors
    /// `Config` when sync is enabled without an access token, or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &CalendarConfig) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        let token = config
            .access_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                QuestlogError::Config("calendar sync is enabled but no access token is set".into())
            })?;

        Ok(Some(Self::new(HttpClient::new()?, &config.api_base, &config.calendar_id, token)))
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/{}/events", self.api_base, self.calendar_id)
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{event_id}", self.events_url())
    }

    async fn execute(&self, method: Method, url: String, body: Option<&EventBody<'_>>) -> Result<Response> {
        let mut request = self.http.request(method, url).bearer_auth(&self.access_token);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.http.send(request).await
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response.text().await.unwrap_or_default();
    Err(QuestlogError::SyncFailure(format!("calendar returned {status}: {}", detail.trim())))
}

fn event_body(task: &Task) -> Result<EventBody<'_>> {
    let start = task.start_time.ok_or_else(|| {
        QuestlogError::Validation(format!("task {} has no start time to schedule", task.id))
    })?;
    let end = task.end_time.unwrap_or_else(|| default_end(start, task.duration_minutes));

    Ok(EventBody {
        summary: &task.title,
        description: &task.description,
        start: event_time(start),
        end: event_time(end),
    })
}

fn default_end(start: DateTime<Utc>, duration_minutes: u32) -> DateTime<Utc> {
    let minutes = match i64::from(duration_minutes) {
        0 => FALLBACK_EVENT_MINUTES,
        m => m,
    };
    start + Duration::minutes(minutes)
}

fn event_time(at: DateTime<Utc>) -> EventTime {
    EventTime { date_time: at.to_rfc3339(), time_zone: "UTC" }
}

#[async_trait]
impl CalendarSync for GoogleCalendarSync {
    async fn sync_event(&self, task: &Task) -> Result<String> {
        let body = event_body(task)?;
        let (method, url) = match task.google_event_id.as_deref() {
            Some(event_id) => (Method::PATCH, self.event_url(event_id)),
            None => (Method::POST, self.events_url()),
        };

        let response = ensure_success(self.execute(method, url, Some(&body)).await?).await?;
        let event: EventResponse = response
            .json()
            .await
            .map_err(|e| QuestlogError::SyncFailure(format!("unreadable calendar response: {e}")))?;

        debug!(task_id = %task.id, event_id = %event.id, "calendar event synced");
        Ok(event.id)
    }

    async fn remove_event(&self, event_id: &str) -> Result<()> {
        let response = self.execute(Method::DELETE, self.event_url(event_id), None).await?;
        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::GONE) {
            debug!(event_id, "calendar event already removed");
            return Ok(());
        }
        ensure_success(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use chrono::TimeZone;
    use questlog_domain::NewTask;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn adapter(server: &MockServer) -> GoogleCalendarSync {
        let http = HttpClient::builder()
            .max_attempts(1)
            .base_backoff(StdDuration::from_millis(1))
            .build()
            .unwrap();
        GoogleCalendarSync::new(http, server.uri(), "primary", "token-123")
    }

    fn scheduled_task() -> Task {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 14, 0, 0).unwrap();
        let input = NewTask {
            title: "Dentist".into(),
            duration_minutes: 45,
            start_time: Some(start),
            ..NewTask::default()
        };
        Task::create("u1", input, start).unwrap()
    }

    #[tokio::test]
    async fn first_sync_inserts_event() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendars/primary/events"))
            .and(header("authorization", "Bearer token-123"))
            .and(body_partial_json(json!({
                "summary": "Dentist",
                "start": { "dateTime": "2025-03-10T14:00:00+00:00" },
                "end": { "dateTime": "2025-03-10T14:45:00+00:00" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "evt-new" })))
            .expect(1)
            .mount(&server)
            .await;

        let id = adapter(&server).sync_event(&scheduled_task()).await.unwrap();

        assert_eq!(id, "evt-new");
    }

    #[tokio::test]
    async fn linked_task_patches_existing_event() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/calendars/primary/events/evt-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "evt-7" })))
            .expect(1)
            .mount(&server)
            .await;

        let mut task = scheduled_task();
        task.google_event_id = Some("evt-7".into());

        assert_eq!(adapter(&server).sync_event(&task).await.unwrap(), "evt-7");
    }

    #[tokio::test]
    async fn rejected_request_is_a_sync_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("insufficient scope"))
            .mount(&server)
            .await;

        let err = adapter(&server).sync_event(&scheduled_task()).await.unwrap_err();

        match err {
            QuestlogError::SyncFailure(message) => assert!(message.contains("insufficient scope")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn removing_a_missing_event_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/calendars/primary/events/evt-gone"))
            .respond_with(ResponseTemplate::new(410))
            .expect(1)
            .mount(&server)
            .await;

        adapter(&server).remove_event("evt-gone").await.unwrap();
    }

    #[tokio::test]
    async fn unscheduled_task_is_not_sent() {
        let server = MockServer::start().await;
        let mut task = scheduled_task();
        task.start_time = None;

        let err = adapter(&server).sync_event(&task).await.unwrap_err();

        assert!(matches!(err, QuestlogError::Validation(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn disabled_config_builds_nothing() {
        let config = CalendarConfig::default();
        assert!(GoogleCalendarSync::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn enabled_config_requires_token() {
        let config = CalendarConfig { enabled: true, ..CalendarConfig::default() };
        assert!(matches!(GoogleCalendarSync::from_config(&config), Err(QuestlogError::Config(_))));
    }
}
