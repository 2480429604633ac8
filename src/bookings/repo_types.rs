use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::db::{schema, table::Row};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub trip_name: String,
    pub status: BookingStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub booking_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub trip_date: OffsetDateTime,
    pub details: Option<String>,
}

impl Row for Booking {
    fn id(&self) -> i64 {
        self.id
    }

    fn index_key(&self, index: &str) -> Option<String> {
        match index {
            schema::BOOKINGS_BY_USER => Some(self.user_id.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: i64,
    pub trip_name: String,
    pub status: Option<BookingStatus>,
    pub trip_date: OffsetDateTime,
    pub details: Option<String>,
}

/// Partial update; `details: Some(None)` clears the notes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPatch {
    pub trip_name: Option<String>,
    pub status: Option<BookingStatus>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub trip_date: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "double_option")]
    pub details: Option<Option<String>>,
}

impl BookingPatch {
    pub(crate) fn apply(self, booking: &mut Booking) {
        if let Some(v) = self.trip_name {
            booking.trip_name = v;
        }
        if let Some(v) = self.status {
            booking.status = v;
        }
        if let Some(v) = self.trip_date {
            booking.trip_date = v;
        }
        if let Some(v) = self.details {
            booking.details = v;
        }
    }
}

// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(Some)
}
