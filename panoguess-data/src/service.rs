//! Transport-neutral request handling.
//!
//! [`GuessService`] turns raw request input into a [`Reply`]: a status class
//! and the JSON body a client receives. Any transport (the CLI, an HTTP
//! adapter) only has to map [`ReplyStatus`] onto its own status codes.

use std::sync::Arc;

use log::error;
use serde::Serialize;
use serde_json::{Value, json};

use panoguess_core::ListParams;

use crate::ingest::{BatchIngestor, IngestError};
use crate::query::{QueryEngine, QueryError};
use crate::store::GuessStore;
use crate::time::{SystemProvider, TimeProvider};

/// Outcome class of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// The request succeeded.
    Ok,
    /// The request was malformed; retrying it unchanged fails again.
    ClientError,
    /// The store failed while serving a well-formed request.
    ServerError,
}

impl ReplyStatus {
    /// Equivalent HTTP status code.
    #[must_use]
    pub const fn http_code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::ClientError => 400,
            Self::ServerError => 500,
        }
    }

    /// Whether the request succeeded.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// A status class plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Outcome class.
    pub status: ReplyStatus,
    /// Body sent to the client.
    pub body: Value,
}

impl Reply {
    fn ok(body: Value) -> Self {
        Self {
            status: ReplyStatus::Ok,
            body,
        }
    }

    fn rows(rows: &impl Serialize) -> Self {
        match serde_json::to_value(rows) {
            Ok(body) => Self::ok(body),
            Err(err) => Self::error(ReplyStatus::ServerError, &err),
        }
    }

    fn error(status: ReplyStatus, err: &dyn std::fmt::Display) -> Self {
        Self {
            status,
            body: json!({ "status": "error", "error": err.to_string() }),
        }
    }
}

/// Serves ingest and list requests against a shared [`GuessStore`].
#[derive(Debug, Clone)]
pub struct GuessService {
    store: Arc<GuessStore>,
    time: Arc<dyn TimeProvider>,
}

impl GuessService {
    /// Service stamping ingested rows with the system clock.
    #[must_use]
    pub fn new(store: Arc<GuessStore>) -> Self {
        Self::with_time_provider(store, Arc::new(SystemProvider))
    }

    /// Service stamping ingested rows with `time`.
    #[must_use]
    pub fn with_time_provider(store: Arc<GuessStore>, time: Arc<dyn TimeProvider>) -> Self {
        Self { store, time }
    }

    /// The shared store.
    #[must_use]
    pub fn store(&self) -> &Arc<GuessStore> {
        &self.store
    }

    /// Validate and persist a raw batch body.
    ///
    /// Rejected batches are client errors; rolled-back batches are server
    /// errors.
    pub fn ingest(&self, body: &str) -> Reply {
        let ingestor = BatchIngestor::with_time_provider(&self.store, self.time.as_ref());
        match ingestor.ingest_json(body) {
            Ok(_) => Reply::ok(json!({ "status": "ok" })),
            Err(IngestError::Validation(err)) => Reply::error(ReplyStatus::ClientError, &err),
            Err(IngestError::Persistence(err)) => Reply::error(ReplyStatus::ServerError, &err),
        }
    }

    /// Answer a filtered, shaped list request.
    pub fn list(&self, params: &ListParams) -> Reply {
        match QueryEngine::new(&self.store).list_params(params) {
            Ok(rows) => Reply::rows(&rows),
            Err(QueryError::Parameter(err)) => Reply::error(ReplyStatus::ClientError, &err),
            Err(QueryError::Execution(err)) => {
                error!("{err}");
                Reply::error(ReplyStatus::ServerError, &err)
            }
        }
    }

    /// Answer the unconditional short list.
    pub fn shortlist(&self) -> Reply {
        match QueryEngine::new(&self.store).shortlist() {
            Ok(pairs) => Reply::rows(&pairs),
            Err(err) => {
                error!("{err}");
                Reply::error(ReplyStatus::ServerError, &err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FAILING_PANO_ID, MockProvider, TempStore, install_insert_failure};
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};

    const ONE_DEGREE: &str =
        r#"[{"panoId":"abc","clickedLat":0,"clickedLng":0,"actualLat":0,"actualLng":1}]"#;

    struct Harness {
        service: GuessService,
        temp: TempStore,
    }

    #[fixture]
    fn harness() -> Harness {
        let mut temp = TempStore::new();
        let path = temp.path().to_path_buf();
        temp.close();
        let store = Arc::new(GuessStore::open_path(path).expect("open shared store"));
        let at = Utc.with_ymd_and_hms(2025, 5, 18, 0, 10, 0).unwrap();
        let service = GuessService::with_time_provider(store, Arc::new(MockProvider::new(at)));
        Harness { service, temp }
    }

    fn list(service: &GuessService, id: Option<&str>, format: Option<&str>) -> Reply {
        service.list(&ListParams {
            id: id.map(str::to_owned),
            min_distance: None,
            format: format.map(str::to_owned),
        })
    }

    #[rstest]
    fn accepted_batches_reply_ok(harness: Harness) {
        let reply = harness.service.ingest(ONE_DEGREE);
        assert_eq!(reply.status, ReplyStatus::Ok);
        assert_eq!(reply.body, json!({ "status": "ok" }));

        let rows = list(&harness.service, None, None);
        assert_eq!(rows.status.http_code(), 200);
        assert_eq!(rows.body[0]["panoId"], "abc");
        assert_eq!(rows.body[0]["timestamp"], "2025-05-18T00:10:00.000Z");
        let distance = rows.body[0]["distance"].as_f64().expect("numeric distance");
        assert!((distance - 111.19).abs() < 0.01);
    }

    #[rstest]
    #[case("[]")]
    #[case("{}")]
    #[case("not json")]
    #[case(r#"[{"panoId":"a","clickedLat":"0","clickedLng":0,"actualLat":0,"actualLng":1}]"#)]
    fn rejected_batches_are_client_errors(harness: Harness, #[case] body: &str) {
        let reply = harness.service.ingest(body);
        assert_eq!(reply.status.http_code(), 400);
        assert_eq!(reply.body["status"], "error");
        assert!(reply.body["error"].is_string());
    }

    #[rstest]
    fn empty_batches_use_the_wire_message(harness: Harness) {
        let reply = harness.service.ingest("[]");
        assert_eq!(
            reply.body["error"],
            "Request body must be a non-empty JSON array."
        );
    }

    #[rstest]
    fn rolled_back_batches_are_server_errors(harness: Harness) {
        install_insert_failure(harness.temp.path());
        let body = format!(
            r#"[{{"panoId":"ok","clickedLat":0,"clickedLng":0,"actualLat":0,"actualLng":1}},
                {{"panoId":"{FAILING_PANO_ID}","clickedLat":0,"clickedLng":0,"actualLat":0,"actualLng":1}}]"#
        );
        let reply = harness.service.ingest(&body);
        assert_eq!(reply.status, ReplyStatus::ServerError);
        let message = reply.body["error"].as_str().expect("error message");
        assert!(message.contains("item 1 (panoId: poisoned)"), "{message}");
        assert_eq!(list(&harness.service, None, None).body, json!([]));
    }

    #[rstest]
    fn short_lists_are_pairs(harness: Harness) {
        harness.service.ingest(ONE_DEGREE);
        assert_eq!(list(&harness.service, None, Some("short")).body, json!([[0.0, 0.0]]));
        assert_eq!(harness.service.shortlist().body, json!([[0.0, 0.0]]));
    }

    #[rstest]
    fn bad_ids_are_client_errors(harness: Harness) {
        let reply = list(&harness.service, Some("abc"), None);
        assert_eq!(reply.status, ReplyStatus::ClientError);
        assert_eq!(
            reply.body["error"],
            "Invalid id parameter \"abc\". Must be an integer."
        );
    }

    #[rstest]
    fn unknown_ids_return_empty_arrays(harness: Harness) {
        let reply = list(&harness.service, Some("42"), None);
        assert!(reply.status.is_ok());
        assert_eq!(reply.body, json!([]));
    }
}
