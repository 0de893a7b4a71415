use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::global::Global;
use crate::http::error::ApiError;

pub fn routes() -> Router<Arc<Global>> {
    Router::new().route("/feed", get(get_feed))
}

#[derive(Debug, Deserialize)]
struct FeedQuery {
    department: Option<String>,
}

/// GET /feed[?department=ID]
///
/// Without a department, returns every department's feed in catalog order.
#[tracing::instrument(skip(global))]
async fn get_feed(
    State(global): State<Arc<Global>>,
    Query(query): Query<FeedQuery>,
) -> Result<Response, ApiError> {
    match query.department {
        Some(id) => {
            let item = global.aggregator.get_department(&id).await?;
            Ok(Json(item).into_response())
        }
        None => {
            let items = global.aggregator.get_all().await?;
            Ok(Json(items).into_response())
        }
    }
}
