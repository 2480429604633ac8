use serde::Deserialize;
use time::OffsetDateTime;

use crate::bookings::repo_types::BookingStatus;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub user_id: i64,
    #[serde(default)]
    pub trip_name: String,
    pub status: Option<BookingStatus>,
    #[serde(with = "time::serde::rfc3339")]
    pub trip_date: OffsetDateTime,
    pub details: Option<String>,
}
