use serde_json::Value;

use super::{ApiClient, ApiError, ReportFilters};

pub async fn attendance_overview(
    client: &ApiClient,
    filters: &ReportFilters,
) -> Result<Value, ApiError> {
    client
        .get_json("analytics/attendance", &filters.to_query())
        .await
}

pub async fn marks_overview(
    client: &ApiClient,
    filters: &ReportFilters,
) -> Result<Value, ApiError> {
    client.get_json("analytics/marks", &filters.to_query()).await
}
