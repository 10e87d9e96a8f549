//! Dashboard insights route handler.

use axum::{Json, extract::State};
use chrono::Utc;

use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::InsightsReport;
use crate::services::InsightsService;
use crate::state::AppState;

/// Cross-sell pairs, churn-risk customers and stock runout projection.
#[tracing::instrument(skip_all, fields(admin = %admin))]
pub async fn report(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<InsightsReport>, AppError> {
    let report = InsightsService::new(state.insights())
        .report(Utc::now())
        .await?;
    Ok(Json(report))
}
