//! HTTP surface (§6): JSON binding for `Put`/`Get` under the `/rz` prefix,
//! plus an ambient `/healthz` liveness probe. Router/handler shape follows
//! the `axum::Router::with_state` + typed-handler pattern (state struct,
//! one handler per route, errors mapped to a status code) rather than the
//! teacher's `irpc` services, since the wire contract here is plain HTTP.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use repl_store::LocalStore;
use serde::{Deserialize, Serialize};
use tower_http::timeout::TimeoutLayer;

use crate::error::NodeError;
use crate::facade::{Node, PutRequest};

const READ_TIMEOUT: Duration = Duration::from_secs(5);
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

struct ApiState<S: LocalStore> {
    node: Arc<Node<S>>,
}

// Manual impl: `#[derive(Clone)]` would require `S: Clone`, but cloning an
// `Arc<Node<S>>` never needs the pointee to be `Clone`.
impl<S: LocalStore> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
        }
    }
}

/// Builds the router. `/rz/put` carries the write timeout (10s) and every
/// other route carries the read timeout (5s), per §6.
pub fn router<S: LocalStore>(node: Arc<Node<S>>) -> Router {
    let state = ApiState { node };

    let reads = Router::new()
        .route("/healthz", get(healthz::<S>))
        .route("/rz/get/{id}", get(get_handler::<S>))
        .layer(TimeoutLayer::new(READ_TIMEOUT));

    let writes = Router::new()
        .route("/rz/put", put(put_handler::<S>))
        .layer(TimeoutLayer::new(WRITE_TIMEOUT));

    reads.merge(writes).with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    region_id: u32,
    known_peers: usize,
}

async fn healthz<S: LocalStore>(State(state): State<ApiState<S>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        region_id: state.node.region_id(),
        known_peers: state.node.known_peer_count(),
    })
}

#[derive(Debug, Deserialize)]
struct PutBody {
    id: String,
    action_name: String,
    service_code: String,
    source_region: u32,
    data: String,
    version: i32,
}

#[derive(Debug, Serialize)]
struct CommittedRegion {
    region_id: u32,
    present: bool,
}

#[derive(Debug, Serialize)]
struct EventMeta {
    service_code: String,
    source_region: u32,
    version: i32,
    committed_regions: Vec<CommittedRegion>,
}

#[derive(Debug, Serialize)]
struct EventResponse {
    id: String,
    action_name: String,
    data: String,
    meta: EventMeta,
}

impl EventResponse {
    fn from_record(record: repl_core::Record, number_of_regions: u32) -> Self {
        let committed_regions = (0..number_of_regions)
            .map(|region_id| CommittedRegion {
                region_id,
                present: record.meta.committed_regions.contains(&region_id),
            })
            .collect();
        Self {
            id: record.id,
            action_name: record.action_name,
            data: String::from_utf8_lossy(&record.data).into_owned(),
            meta: EventMeta {
                service_code: record.meta.service_code,
                source_region: record.meta.source_region,
                version: record.meta.version,
                committed_regions,
            },
        }
    }
}

async fn put_handler<S: LocalStore>(
    State(state): State<ApiState<S>>,
    Json(body): Json<PutBody>,
) -> Result<Json<EventResponse>, ApiError> {
    let record = state
        .node
        .put(PutRequest {
            id: body.id,
            action_name: body.action_name,
            service_code: body.service_code,
            source_region: body.source_region,
            data: body.data.into_bytes(),
            version: body.version,
        })
        .await?;
    Ok(Json(EventResponse::from_record(record, number_of_regions(&state))))
}

async fn get_handler<S: LocalStore>(
    State(state): State<ApiState<S>>,
    Path(id): Path<String>,
) -> Result<Json<EventResponse>, ApiError> {
    let record = state.node.get(id).await?;
    Ok(Json(EventResponse::from_record(record, number_of_regions(&state))))
}

fn number_of_regions<S: LocalStore>(state: &ApiState<S>) -> u32 {
    state.node.number_of_regions()
}

struct ApiError(NodeError);

impl From<NodeError> for ApiError {
    fn from(err: NodeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            NodeError::NotFound => StatusCode::NOT_FOUND,
            NodeError::Codec(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.0.to_string()).into_response()
    }
}
