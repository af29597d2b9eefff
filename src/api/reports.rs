use super::{ApiClient, ApiError, ReportFilters};
use crate::model::{Download, Report};

pub async fn fetch(
    client: &ApiClient,
    kind: &str,
    filters: &ReportFilters,
) -> Result<Report, ApiError> {
    client
        .get_json(&format!("reports/{kind}"), &filters.to_query())
        .await
}

pub async fn download(
    client: &ApiClient,
    kind: &str,
    filters: &ReportFilters,
) -> Result<Download, ApiError> {
    client
        .get_download(
            &format!("reports/{kind}/download"),
            &filters.to_query(),
            &format!("{kind}-report"),
        )
        .await
}
