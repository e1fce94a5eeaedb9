//! `/api/analytics` handlers.

use actix_web::web;
use serde_json::json;

use super::{ok, ApiResult, AppState};

pub async fn dashboard(data: web::Data<AppState>) -> ApiResult {
    Ok(ok(data.services.analytics.dashboard().await?))
}

pub async fn overview(data: web::Data<AppState>) -> ApiResult {
    Ok(ok(data.services.analytics.overview().await?))
}

pub async fn distribution(data: web::Data<AppState>) -> ApiResult {
    let distribution = data.services.analytics.distribution().await?;
    Ok(ok(json!({
        "total": distribution.total(),
        "distribution": distribution,
    })))
}
