//! HTTP request handlers.

use crate::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tagbridge_hardware::ReaderDescriptor;
use tagbridge_ils::BridgeResponse;

/// Query string of `getItems`.
#[derive(Debug, Deserialize)]
pub struct ReaderQuery {
    pub reader_ip: Option<String>,
}

/// GET /api/alma/getItems
pub async fn get_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReaderQuery>,
) -> Response {
    xml_response(state.bridge.get_items(query.reader_ip.as_deref()).await)
}

/// POST /api/alma/setSecurity
pub async fn set_security(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    xml_response(state.bridge.set_security_bytes(&body).await)
}

/// POST /api/alma/itemUpdate
pub async fn item_update(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    xml_response(state.bridge.item_update_bytes(&body).await)
}

/// GET /api/readers
pub async fn readers(
    State(state): State<Arc<AppState>>,
) -> Json<BTreeMap<String, Vec<ReaderDescriptor>>> {
    let resolver = state.bridge.resolver();
    let readers = resolver
        .discovery()
        .discover_across_middlewares(resolver.instances())
        .await;
    Json(readers)
}

fn xml_response(response: BridgeResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/xml")],
        response.body,
    )
        .into_response()
}
