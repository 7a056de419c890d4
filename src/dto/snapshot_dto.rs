use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::filter::FilterCriteria;

#[derive(Debug, Deserialize, Validate)]
pub struct SnapshotRequest {
    /// Label of the saved search the caller built this request from.
    /// Informational only, templates are managed client-side.
    #[validate(length(max = 255))]
    pub template: Option<String>,
    #[serde(default)]
    pub queries: Vec<String>,
    #[serde(default)]
    pub filter: FilterCriteria,
}

#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub copied: i64,
}
