use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

/// One completed request, as reported by an external HTTP layer.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingSample {
    pub endpoint: String,
    pub latency_ms: f64,
    #[serde(default)]
    pub is_error: bool,
}

/// Either a single sample or a batch.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SampleBatch {
    One(IncomingSample),
    Many(Vec<IncomingSample>),
}

impl SampleBatch {
    fn into_vec(self) -> Vec<IncomingSample> {
        match self {
            Self::One(s) => vec![s],
            Self::Many(v) => v,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// Samples handed to the recorder
    pub received: usize,
    /// Samples whose endpoint is not a route key
    pub rejected: usize,
}

/// Longest endpoint key accepted from the wire.
pub const MAX_ENDPOINT_LEN: usize = 256;

/// `"<METHOD> /<path>"`: an upper-case method, one space, then a path with
/// no whitespace. Keys are meant to be route templates (`/api/users/:id`),
/// not raw URLs; that part is on the caller.
pub fn is_route_key(endpoint: &str) -> bool {
    if endpoint.len() > MAX_ENDPOINT_LEN {
        return false;
    }
    let Some((method, path)) = endpoint.split_once(' ') else {
        return false;
    };
    !method.is_empty()
        && method.bytes().all(|b| b.is_ascii_uppercase())
        && path.starts_with('/')
        && !path.chars().any(char::is_whitespace)
}

// ─── POST /api/metrics/samples ───────────────────────────────────

/// Accepts samples fail-soft: endpoints that are not route keys are
/// counted as rejected, malformed values are clamped or dropped by the
/// recorder, and only an unparseable body fails the request.
///
/// Every distinct key gets its own window, so callers are trusted to send
/// route templates. The shape check only stops free-form junk.
pub async fn record_samples(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SampleBatch>, JsonRejection>,
) -> Result<(StatusCode, Json<IngestResponse>), AppError> {
    let Json(batch) = payload?;

    let mut received = 0;
    let mut rejected = 0;
    for s in batch.into_vec() {
        if !is_route_key(&s.endpoint) {
            debug!("rejecting sample for non-route endpoint {:?}", s.endpoint);
            rejected += 1;
            continue;
        }
        state.optimizer.record(&s.endpoint, s.latency_ms, s.is_error);
        received += 1;
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestResponse { received, rejected }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_keys() {
        assert!(is_route_key("GET /api/products"));
        assert!(is_route_key("DELETE /api/users/:id"));
        assert!(is_route_key("GET /"));
    }

    #[test]
    fn test_non_route_keys() {
        for endpoint in [
            "",
            "GET",
            "/api/products",
            "get /api/products",
            "GET api/products",
            "GET  /api/products",
            "GET /api/products search",
            "GET /api/\tproducts",
        ] {
            assert!(!is_route_key(endpoint), "{endpoint:?}");
        }
        let long = format!("GET /{}", "a".repeat(MAX_ENDPOINT_LEN));
        assert!(!is_route_key(&long));
    }
}
