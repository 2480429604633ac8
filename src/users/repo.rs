use time::OffsetDateTime;
use tracing::{info, warn};

use crate::auth::{password, services::normalize_email};
use crate::db::{schema, Store};
use crate::error::{AppError, AppResult, AuthFailure};
use crate::guards;
use crate::users::repo_types::{Role, User, UserPatch};

/// Input for a self-service signup. `password` is plaintext and is hashed
/// before it reaches the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub mobile_number: String,
    pub country_code: String,
}

impl User {
    /// Create a regular user. Email is case-folded and must be unused.
    pub async fn create(store: &Store, new: NewUser) -> AppResult<User> {
        let email = normalize_email(&new.email)?;

        // fail fast before paying for a hash
        store
            .read(|db| {
                guards::email_available(db, &email, None)?;
                guards::phone_available(db, &new.country_code, &new.mobile_number, None)
            })
            .await?;

        let password_hash = password::hash(new.password).await?;

        let user = store
            .write(|db| {
                guards::email_available(db, &email, None)?;
                guards::phone_available(db, &new.country_code, &new.mobile_number, None)?;
                let user = User {
                    id: db.users.next_id(),
                    full_name: new.full_name.trim().to_string(),
                    email: email.clone(),
                    password_hash,
                    mobile_number: new.mobile_number.trim().to_string(),
                    country_code: new.country_code.trim().to_string(),
                    role: Role::User,
                    signup_date: OffsetDateTime::now_utc(),
                    testimonial_allowed: false,
                    is_suspended: false,
                };
                db.users.insert(user.clone());
                Ok(user)
            })
            .await?;

        info!(user_id = user.id, email = %user.email, "user created");
        Ok(user)
    }

    /// Find a user by email, ignoring case.
    pub async fn find_by_email(store: &Store, email: &str) -> Option<User> {
        let email = email.trim().to_lowercase();
        store
            .read(|db| {
                db.users
                    .lookup(schema::USERS_BY_EMAIL, &email)
                    .first()
                    .map(|u| (*u).clone())
            })
            .await
    }

    pub async fn find_by_id(store: &Store, id: i64) -> Option<User> {
        store.read(|db| db.users.get(id).cloned()).await
    }

    /// All users, ascending by id.
    pub async fn list(store: &Store) -> Vec<User> {
        store.read(|db| db.users.iter().cloned().collect()).await
    }

    /// Applies only the supplied fields.
    pub async fn update(store: &Store, id: i64, mut patch: UserPatch) -> AppResult<User> {
        if let Some(email) = patch.email.as_deref() {
            patch.email = Some(normalize_email(email)?);
        }

        store
            .write(|db| {
                let current = guards::existing_user(db, id)?;
                if let Some(email) = patch.email.as_deref() {
                    guards::email_not_reserved(current, email)?;
                    guards::email_available(db, email, Some(id))?;
                }
                if patch.mobile_number.is_some() || patch.country_code.is_some() {
                    let cc = patch
                        .country_code
                        .as_deref()
                        .map_or(current.country_code.as_str(), str::trim);
                    let mobile = patch
                        .mobile_number
                        .as_deref()
                        .map_or(current.mobile_number.as_str(), str::trim);
                    guards::phone_available(db, cc, mobile, Some(id))?;
                }
                db.users
                    .update(id, |u| {
                        patch.apply(u);
                        u.clone()
                    })
                    .ok_or(AppError::NotFound { entity: "user", id })
            })
            .await
    }

    pub async fn set_suspended(store: &Store, id: i64, suspended: bool) -> AppResult<()> {
        store
            .write(|db| {
                guards::not_protected(guards::existing_user(db, id)?)?;
                db.users.update(id, |u| u.is_suspended = suspended);
                Ok(())
            })
            .await?;
        info!(user_id = id, suspended, "user suspension changed");
        Ok(())
    }

    /// Flips `testimonial_allowed` and returns the new value.
    pub async fn toggle_testimonial(store: &Store, id: i64) -> AppResult<bool> {
        store
            .write(|db| {
                db.users
                    .update(id, |u| {
                        u.testimonial_allowed = !u.testimonial_allowed;
                        u.testimonial_allowed
                    })
                    .ok_or(AppError::NotFound { entity: "user", id })
            })
            .await
    }

    /// Deletes the user together with their bookings and testimonials.
    pub async fn delete(store: &Store, id: i64) -> AppResult<()> {
        let (bookings, testimonials) = store
            .write(|db| {
                guards::not_protected(guards::existing_user(db, id)?)?;
                let (b, t) = guards::cascade_user_rows(db, id);
                db.users.remove(id);
                Ok((b.len(), t.len()))
            })
            .await?;
        info!(user_id = id, bookings, testimonials, "user deleted");
        Ok(())
    }

    pub async fn verify_password(store: &Store, id: i64, candidate: &str) -> AppResult<bool> {
        let user = Self::find_by_id(store, id)
            .await
            .ok_or(AppError::NotFound { entity: "user", id })?;
        Ok(password::verify(candidate.to_string(), user.password_hash).await?)
    }

    /// Replaces the stored hash; the new password is always re-hashed.
    pub async fn change_password(store: &Store, id: i64, new_password: &str) -> AppResult<()> {
        if Self::find_by_id(store, id).await.is_none() {
            return Err(AppError::NotFound { entity: "user", id });
        }
        let hash = password::hash(new_password.to_string()).await?;
        store
            .write(|db| {
                db.users
                    .update(id, |u| u.password_hash = hash)
                    .ok_or(AppError::NotFound { entity: "user", id })
            })
            .await?;
        info!(user_id = id, "password changed");
        Ok(())
    }

    /// Credential check for login. Suspended accounts are refused even with
    /// the right password.
    pub async fn authenticate(store: &Store, email: &str, candidate: &str) -> AppResult<User> {
        let Some(user) = Self::find_by_email(store, email).await else {
            warn!(email = %email, "login unknown email");
            return Err(AppError::Auth(AuthFailure::InvalidCredentials));
        };

        if !password::verify(candidate.to_string(), user.password_hash.clone()).await? {
            warn!(user_id = user.id, "login invalid password");
            return Err(AppError::Auth(AuthFailure::InvalidCredentials));
        }

        if user.is_suspended {
            warn!(user_id = user.id, "login refused, account suspended");
            return Err(AppError::Auth(AuthFailure::Suspended));
        }

        Ok(user)
    }
}
