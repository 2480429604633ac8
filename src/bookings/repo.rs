use time::OffsetDateTime;
use tracing::info;

use crate::bookings::repo_types::{Booking, BookingPatch, BookingStatus, NewBooking};
use crate::db::{schema, Store};
use crate::error::{AppError, AppResult};
use crate::guards;

impl Booking {
    /// Create a booking for an existing user. Status defaults to pending.
    pub async fn create(store: &Store, new: NewBooking) -> AppResult<Booking> {
        let booking = store
            .write(|db| {
                guards::existing_user(db, new.user_id)?;
                let booking = Booking {
                    id: db.bookings.next_id(),
                    user_id: new.user_id,
                    trip_name: new.trip_name.trim().to_string(),
                    status: new.status.unwrap_or_default(),
                    booking_date: OffsetDateTime::now_utc(),
                    trip_date: new.trip_date,
                    details: new.details,
                };
                db.bookings.insert(booking.clone());
                Ok(booking)
            })
            .await?;
        info!(booking_id = booking.id, user_id = booking.user_id, "booking created");
        Ok(booking)
    }

    pub async fn find_by_id(store: &Store, id: i64) -> Option<Booking> {
        store.read(|db| db.bookings.get(id).cloned()).await
    }

    /// A user's bookings, newest booking first.
    pub async fn list_by_user(store: &Store, user_id: i64) -> Vec<Booking> {
        let mut rows: Vec<Booking> = store
            .read(|db| {
                db.bookings
                    .lookup(schema::BOOKINGS_BY_USER, &user_id.to_string())
                    .into_iter()
                    .cloned()
                    .collect()
            })
            .await;
        rows.sort_by(|a, b| b.booking_date.cmp(&a.booking_date).then(b.id.cmp(&a.id)));
        rows
    }

    /// Every booking, ascending by id.
    pub async fn list_all(store: &Store) -> Vec<Booking> {
        store.read(|db| db.bookings.iter().cloned().collect()).await
    }

    /// Applies only the supplied fields.
    pub async fn update(store: &Store, id: i64, patch: BookingPatch) -> AppResult<Booking> {
        store
            .write(|db| {
                db.bookings
                    .update(id, |b| {
                        patch.apply(b);
                        b.clone()
                    })
                    .ok_or(AppError::NotFound { entity: "booking", id })
            })
            .await
    }

    /// Sets the status to cancelled. Cancelling twice is fine.
    pub async fn cancel(store: &Store, id: i64) -> AppResult<Booking> {
        let booking = Self::update(
            store,
            id,
            BookingPatch {
                status: Some(BookingStatus::Cancelled),
                ..Default::default()
            },
        )
        .await?;
        info!(booking_id = id, "booking cancelled");
        Ok(booking)
    }
}
