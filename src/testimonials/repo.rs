use time::OffsetDateTime;
use tracing::info;

use crate::db::{schema, Database, Store};
use crate::error::{AppError, AppResult};
use crate::guards;
use crate::testimonials::repo_types::{NewTestimonial, Testimonial, TestimonialEntry};

impl Testimonial {
    /// Create a visible testimonial for an existing user. Rating must be 1 to 5.
    pub async fn create(store: &Store, new: NewTestimonial) -> AppResult<Testimonial> {
        guards::rating_in_range(new.rating)?;

        let t = store
            .write(|db| {
                guards::existing_user(db, new.user_id)?;
                Ok(insert(db, new))
            })
            .await?;
        info!(testimonial_id = t.id, user_id = t.user_id, "testimonial submitted");
        Ok(t)
    }

    /// Submission by `user_id`: name and email are copied from the user row.
    /// The permission check and the insert run under the same lock.
    pub async fn submit(
        store: &Store,
        user_id: i64,
        entry: TestimonialEntry,
    ) -> AppResult<Testimonial> {
        guards::rating_in_range(entry.rating)?;

        let t = store
            .write(|db| {
                let new = entry.by(guards::may_submit_testimonial(db, user_id)?);
                Ok(insert(db, new))
            })
            .await?;
        info!(testimonial_id = t.id, user_id, "testimonial submitted");
        Ok(t)
    }

    /// Testimonials shown on the public site, ascending by id.
    pub async fn list_visible(store: &Store) -> Vec<Testimonial> {
        store
            .read(|db| {
                db.testimonials
                    .lookup(schema::TESTIMONIALS_BY_VISIBILITY, "true")
                    .into_iter()
                    .cloned()
                    .collect()
            })
            .await
    }

    pub async fn list_all(store: &Store) -> Vec<Testimonial> {
        store.read(|db| db.testimonials.iter().cloned().collect()).await
    }

    /// Flips visibility and returns the new value.
    pub async fn toggle_visibility(store: &Store, id: i64) -> AppResult<bool> {
        let visible = store
            .write(|db| {
                db.testimonials
                    .update(id, |t| {
                        t.is_visible = !t.is_visible;
                        t.is_visible
                    })
                    .ok_or(AppError::NotFound { entity: "testimonial", id })
            })
            .await?;
        info!(testimonial_id = id, visible, "testimonial visibility toggled");
        Ok(visible)
    }

    pub async fn delete(store: &Store, id: i64) -> AppResult<()> {
        store
            .write(|db| {
                db.testimonials
                    .remove(id)
                    .map(|_| ())
                    .ok_or(AppError::NotFound { entity: "testimonial", id })
            })
            .await?;
        info!(testimonial_id = id, "testimonial deleted");
        Ok(())
    }
}

fn insert(db: &mut Database, new: NewTestimonial) -> Testimonial {
    let t = Testimonial {
        id: db.testimonials.next_id(),
        user_id: new.user_id,
        user_name: new.user_name,
        email: new.email,
        trip_name: new.trip_name.trim().to_string(),
        quote: new.quote.trim().to_string(),
        rating: new.rating,
        role: new.role,
        location: new.location,
        highlight: new.highlight,
        submitted_date: OffsetDateTime::now_utc(),
        is_visible: true,
    };
    db.testimonials.insert(t.clone());
    t
}
