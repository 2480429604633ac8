use time::OffsetDateTime;
use tracing::{info, warn};

use super::{schema, Database, Store};
use crate::auth::password;
use crate::config::AdminSeed;
use crate::error::AppResult;
use crate::users::repo_types::{Role, User};

/// Makes sure the reserved administrator row exists. Returns true if it was
/// inserted by this call.
///
/// Any existing admin row, or any row already holding the reserved email,
/// makes this a no-op. Assumes a single process seeds a given medium at
/// startup.
pub async fn ensure_admin(store: &Store, admin: &AdminSeed) -> AppResult<bool> {
    let email = admin.email.trim().to_lowercase();

    if store.read(|db| seeded(db, &email)).await {
        return Ok(false);
    }

    let password_hash = password::hash(admin.password.clone()).await?;

    let inserted = store
        .write(|db| {
            if seeded(db, &email) {
                return Ok(None);
            }
            let id = db.users.next_id();
            db.users.insert(User {
                id,
                full_name: admin.full_name.clone(),
                email: email.clone(),
                password_hash,
                mobile_number: String::new(),
                country_code: String::new(),
                role: Role::Admin,
                signup_date: OffsetDateTime::now_utc(),
                testimonial_allowed: true,
                is_suspended: false,
            });
            Ok(Some(id))
        })
        .await?;

    match inserted {
        Some(id) => {
            info!(user_id = id, email = %email, "administrator seeded");
            Ok(true)
        }
        None => Ok(false),
    }
}

fn seeded(db: &Database, email: &str) -> bool {
    if db.users.iter().any(|u| u.is_admin()) {
        return true;
    }
    if !db.users.lookup(schema::USERS_BY_EMAIL, email).is_empty() {
        warn!(email = %email, "reserved admin email held by a regular user; not seeding");
        return true;
    }
    false
}
