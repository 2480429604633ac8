use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::db::{schema, table::Row};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// User record in the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,         // always case-folded
    pub password_hash: String, // Argon2 PHC string
    pub mobile_number: String,
    pub country_code: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub signup_date: OffsetDateTime,
    pub testimonial_allowed: bool,
    pub is_suspended: bool,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Key used by the phone index: country code and number, digits only.
pub fn phone_key(country_code: &str, mobile_number: &str) -> String {
    let digits: String = mobile_number.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("{}:{}", country_code.trim().to_uppercase(), digits)
}

impl Row for User {
    fn id(&self) -> i64 {
        self.id
    }

    fn index_key(&self, index: &str) -> Option<String> {
        match index {
            schema::USERS_BY_EMAIL => Some(self.email.clone()),
            schema::USERS_BY_PHONE if !self.mobile_number.trim().is_empty() => {
                Some(phone_key(&self.country_code, &self.mobile_number))
            }
            _ => None,
        }
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub mobile_number: Option<String>,
    pub country_code: Option<String>,
    pub testimonial_allowed: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.mobile_number.is_none()
            && self.country_code.is_none()
            && self.testimonial_allowed.is_none()
    }

    /// Text fields are stored trimmed, as on signup.
    pub(crate) fn apply(self, user: &mut User) {
        if let Some(v) = self.full_name {
            user.full_name = v.trim().to_string();
        }
        if let Some(v) = self.email {
            user.email = v.trim().to_string();
        }
        if let Some(v) = self.mobile_number {
            user.mobile_number = v.trim().to_string();
        }
        if let Some(v) = self.country_code {
            user.country_code = v.trim().to_string();
        }
        if let Some(v) = self.testimonial_allowed {
            user.testimonial_allowed = v;
        }
    }
}
