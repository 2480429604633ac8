//! Invariant checks run inside a store mutation, before anything is committed.

use tracing::{info, warn};

use crate::bookings::repo_types::Booking;
use crate::db::{schema, Database};
use crate::error::{AppError, AppResult};
use crate::testimonials::repo_types::Testimonial;
use crate::users::repo_types::{phone_key, User};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// `except` lets a user keep their own email on update.
pub fn email_available(db: &Database, email: &str, except: Option<i64>) -> AppResult<()> {
    let taken = db
        .users
        .lookup(schema::USERS_BY_EMAIL, email)
        .iter()
        .any(|u| Some(u.id) != except);
    if taken {
        return Err(AppError::DuplicateEmail);
    }
    Ok(())
}

pub fn phone_available(
    db: &Database,
    country_code: &str,
    mobile_number: &str,
    except: Option<i64>,
) -> AppResult<()> {
    if mobile_number.trim().is_empty() {
        return Ok(());
    }
    let key = phone_key(country_code, mobile_number);
    let taken = db
        .users
        .lookup(schema::USERS_BY_PHONE, &key)
        .iter()
        .any(|u| Some(u.id) != except);
    if taken {
        return Err(AppError::DuplicatePhone);
    }
    Ok(())
}

pub fn existing_user(db: &Database, id: i64) -> AppResult<&User> {
    db.users
        .get(id)
        .ok_or(AppError::NotFound { entity: "user", id })
}

/// Administrators can never be suspended or deleted.
pub fn not_protected(user: &User) -> AppResult<()> {
    if user.is_admin() {
        return Err(AppError::ProtectedRole);
    }
    Ok(())
}

/// The administrator's email is the seeding key and cannot be changed.
pub fn email_not_reserved(user: &User, new_email: &str) -> AppResult<()> {
    if user.is_admin() && user.email != new_email {
        return Err(AppError::ProtectedRole);
    }
    Ok(())
}

/// The submitter must exist, be allowed to post testimonials and not be
/// suspended.
pub fn may_submit_testimonial(db: &Database, user_id: i64) -> AppResult<&User> {
    let user = existing_user(db, user_id)?;
    if !user.testimonial_allowed || user.is_suspended {
        warn!(user_id, "testimonial submission not permitted");
        return Err(AppError::Forbidden);
    }
    Ok(user)
}

pub fn rating_in_range(rating: i32) -> AppResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }
    Ok(())
}

/// Removes every booking and testimonial owned by `user_id`.
pub fn cascade_user_rows(db: &mut Database, user_id: i64) -> (Vec<Booking>, Vec<Testimonial>) {
    let key = user_id.to_string();
    let bookings = db.bookings.remove_where(schema::BOOKINGS_BY_USER, &key);
    let testimonials = db
        .testimonials
        .remove_where(schema::TESTIMONIALS_BY_USER, &key);
    info!(
        user_id,
        bookings = bookings.len(),
        testimonials = testimonials.len(),
        "cascaded user rows"
    );
    (bookings, testimonials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::ensure_schema;
    use crate::db::test_support::{sample_booking, sample_testimonial, sample_user};
    use crate::users::repo_types::Role;

    fn db() -> Database {
        let mut db = Database::default();
        ensure_schema(&mut db);
        db.users.insert(sample_user(1, "a@x.com"));
        db.users.insert(sample_user(2, "b@x.com"));
        db
    }

    #[test]
    fn email_guard_allows_own_address() {
        let db = db();
        assert!(matches!(
            email_available(&db, "a@x.com", None),
            Err(AppError::DuplicateEmail)
        ));
        assert!(email_available(&db, "a@x.com", Some(1)).is_ok());
        assert!(email_available(&db, "c@x.com", None).is_ok());
    }

    #[test]
    fn phone_guard_ignores_formatting() {
        let db = db();
        let taken = &db.users.get(1).unwrap().mobile_number.clone();
        let spaced = format!("{} {}", &taken[..5], &taken[5..]);
        assert!(matches!(
            phone_available(&db, "in", &spaced, None),
            Err(AppError::DuplicatePhone)
        ));
        assert!(phone_available(&db, "US", taken, None).is_ok());
        assert!(phone_available(&db, "IN", "", None).is_ok());
    }

    #[test]
    fn admin_is_protected() {
        let mut admin = sample_user(9, "root@x.com");
        admin.role = Role::Admin;
        assert!(matches!(not_protected(&admin), Err(AppError::ProtectedRole)));
        assert!(not_protected(&sample_user(3, "c@x.com")).is_ok());
    }

    #[test]
    fn admin_email_is_reserved() {
        let mut admin = sample_user(9, "root@x.com");
        admin.role = Role::Admin;
        assert!(matches!(
            email_not_reserved(&admin, "boss@x.com"),
            Err(AppError::ProtectedRole)
        ));
        assert!(email_not_reserved(&admin, "root@x.com").is_ok());
        assert!(email_not_reserved(&sample_user(3, "c@x.com"), "d@x.com").is_ok());
    }

    #[test]
    fn testimonial_permission() {
        let mut db = db();
        db.users.update(1, |u| u.testimonial_allowed = true);
        assert_eq!(may_submit_testimonial(&db, 1).unwrap().id, 1);
        assert!(matches!(may_submit_testimonial(&db, 2), Err(AppError::Forbidden)));
        assert!(matches!(
            may_submit_testimonial(&db, 7),
            Err(AppError::NotFound { .. })
        ));

        db.users.update(1, |u| u.is_suspended = true);
        assert!(matches!(may_submit_testimonial(&db, 1), Err(AppError::Forbidden)));
    }

    #[test]
    fn rating_bounds() {
        assert!(rating_in_range(1).is_ok());
        assert!(rating_in_range(5).is_ok());
        assert!(rating_in_range(0).is_err());
        assert!(rating_in_range(6).is_err());
    }

    #[test]
    fn cascade_only_touches_the_owner() {
        let mut db = db();
        db.bookings.insert(sample_booking(1, 1));
        db.bookings.insert(sample_booking(2, 2));
        db.testimonials.insert(sample_testimonial(1, 1));
        db.testimonials.insert(sample_testimonial(2, 2));

        let (b, t) = cascade_user_rows(&mut db, 1);
        assert_eq!((b.len(), t.len()), (1, 1));
        assert_eq!(db.bookings.iter().map(|b| b.user_id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(db.testimonials.iter().map(|t| t.user_id).collect::<Vec<_>>(), vec![2]);
    }
}
