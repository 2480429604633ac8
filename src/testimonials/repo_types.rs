use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::db::{schema, table::Row};
use crate::users::repo_types::User;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String, // copied from the user at submission time
    pub email: String,     // copied from the user at submission time
    pub trip_name: String,
    pub quote: String,
    pub rating: i32,
    pub role: Option<String>,
    pub location: Option<String>,
    pub highlight: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_date: OffsetDateTime,
    pub is_visible: bool,
}

impl Row for Testimonial {
    fn id(&self) -> i64 {
        self.id
    }

    fn index_key(&self, index: &str) -> Option<String> {
        match index {
            schema::TESTIMONIALS_BY_USER => Some(self.user_id.to_string()),
            schema::TESTIMONIALS_BY_VISIBILITY => Some(self.is_visible.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTestimonial {
    pub user_id: i64,
    pub user_name: String,
    pub email: String,
    pub trip_name: String,
    pub quote: String,
    pub rating: i32,
    pub role: Option<String>,
    pub location: Option<String>,
    pub highlight: Option<String>,
}

/// What a user writes when submitting; identity comes from their row.
#[derive(Debug, Clone)]
pub struct TestimonialEntry {
    pub trip_name: String,
    pub quote: String,
    pub rating: i32,
    pub role: Option<String>,
    pub location: Option<String>,
    pub highlight: Option<String>,
}

impl TestimonialEntry {
    pub fn by(self, user: &User) -> NewTestimonial {
        NewTestimonial {
            user_id: user.id,
            user_name: user.full_name.clone(),
            email: user.email.clone(),
            trip_name: self.trip_name,
            quote: self.quote,
            rating: self.rating,
            role: self.role,
            location: self.location,
            highlight: self.highlight,
        }
    }
}
