//! Demo handler mounted on every route of the version table.
//!
//! Only reached when the version gate accepted the request; it echoes what
//! it saw so the gate's behaviour can be observed with curl:
//!
//! ```bash
//! curl -H "Version: 2.5" http://localhost:3000/required/v2-v3
//! ```

use std::borrow::Cow;

use axum::Json;
use axum::extract::{MatchedPath, State};
use axum::http::{HeaderMap, Method};
use tracing::instrument;

use crate::models::EchoResponse;
use crate::state::AppState;

#[instrument(skip(state, headers))]
pub async fn echo(
    State(state): State<AppState>,
    matched: MatchedPath,
    method: Method,
    headers: HeaderMap,
) -> Json<EchoResponse> {
    Json(EchoResponse {
        route: matched.as_str().to_string(),
        method: method.to_string(),
        requested_version: state.gate.header_value(&headers).map(Cow::into_owned),
    })
}
