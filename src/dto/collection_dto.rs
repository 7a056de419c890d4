use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct StartCollectionRequest {
    #[validate(length(min = 1, max = 255, message = "Search query must not be empty"))]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct StartCollectionResponse {
    pub run_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CancelCollectionResponse {
    pub run_id: Uuid,
    pub cancelling: bool,
}
