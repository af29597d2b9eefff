use serde_json::{json, Value};

use super::{ApiClient, ApiError, AttendanceFilters};
use crate::model::{AttendanceRecord, NewAttendance};

pub async fn list(
    client: &ApiClient,
    filters: &AttendanceFilters,
) -> Result<Vec<AttendanceRecord>, ApiError> {
    client.get_json("attendance", &filters.to_query()).await
}

/// The attendance bulk endpoint wraps the array: `{"records": [...]}`.
pub async fn bulk_create(
    client: &ApiClient,
    records: &[NewAttendance],
) -> Result<Vec<AttendanceRecord>, ApiError> {
    client
        .post_json("attendance/bulk", &json!({ "records": records }))
        .await
}

pub async fn update(
    client: &ApiClient,
    id: &str,
    payload: &Value,
) -> Result<AttendanceRecord, ApiError> {
    client.put_json(&format!("attendance/{id}"), payload).await
}

pub async fn delete(client: &ApiClient, id: &str) -> Result<(), ApiError> {
    client.delete(&format!("attendance/{id}")).await
}
