use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestimonialRequest {
    pub user_id: i64,
    #[serde(default)]
    pub trip_name: String,
    #[serde(default)]
    pub quote: String,
    pub rating: i32,
    pub role: Option<String>,
    pub location: Option<String>,
    pub highlight: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityResponse {
    pub is_visible: bool,
}
