use axum::{Json, body::Bytes, extract::State};

use crate::dispatch::Dispatcher;
use crate::errors::ServiceResult;
use crate::search::SearchMethod;

use super::models::{SearchEnvelope, SearchQuery, SearchResponse};

/// Where a handler takes its search mode from.
#[derive(Debug, Clone, Copy)]
pub enum MethodSource {
    Fixed(SearchMethod),
    Inputs,
}

pub async fn global_search_handler(
    State(dispatcher): State<Dispatcher>,
    body: Bytes,
) -> ServiceResult<Json<SearchResponse>> {
    handle_search(&dispatcher, MethodSource::Fixed(SearchMethod::Global), &body).await
}

pub async fn local_search_handler(
    State(dispatcher): State<Dispatcher>,
    body: Bytes,
) -> ServiceResult<Json<SearchResponse>> {
    handle_search(&dispatcher, MethodSource::Fixed(SearchMethod::Local), &body).await
}

pub async fn search_handler(
    State(dispatcher): State<Dispatcher>,
    body: Bytes,
) -> ServiceResult<Json<SearchResponse>> {
    handle_search(&dispatcher, MethodSource::Inputs, &body).await
}

// The body is parsed by hand so that every malformed request ends up as a
// 500, the same as any other failure on this path.
async fn handle_search(
    dispatcher: &Dispatcher,
    source: MethodSource,
    body: &[u8],
) -> ServiceResult<Json<SearchResponse>> {
    let envelope: SearchEnvelope = serde_json::from_slice(body)?;
    if envelope.is_ping() {
        return Ok(Json(SearchResponse::pong()));
    }

    let query = SearchQuery::from_params(envelope.params)?;
    let method = match source {
        MethodSource::Fixed(method) => method,
        MethodSource::Inputs => query.inputs.method.as_deref().unwrap_or_default().parse()?,
    };

    let result = dispatcher.search(method, query.search_params()).await?;
    Ok(Json(SearchResponse::new(result)))
}
