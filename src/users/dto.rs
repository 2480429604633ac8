use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::users::repo_types::{Role, User};

/// User as returned to clients; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    pub country_code: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub signup_date: OffsetDateTime,
    pub testimonial_allowed: bool,
    pub is_suspended: bool,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            full_name: u.full_name,
            email: u.email,
            mobile_number: u.mobile_number,
            country_code: u.country_code,
            role: u.role,
            signup_date: u.signup_date,
            testimonial_allowed: u.testimonial_allowed,
            is_suspended: u.is_suspended,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialPermission {
    pub testimonial_allowed: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
