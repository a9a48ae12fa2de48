//! Credit balance handler.

use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::middleware::Caller;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    pub credits: i64,
}

/// `GET /api/credits`
pub async fn get_credits(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Json<CreditsResponse> {
    Json(CreditsResponse {
        credits: state.credits.balance(&caller.token).await,
    })
}
