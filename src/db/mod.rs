pub mod bootstrap;
pub mod schema;
pub mod seed;
pub mod snapshot;
pub mod table;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::bookings::repo_types::Booking;
use crate::error::{AppResult, PersistenceError};
use crate::storage::DurableMedium;
use crate::testimonials::repo_types::Testimonial;
use crate::users::repo_types::User;

use self::table::Table;

/// The whole relational state: three tables and the schema version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub users: Table<User>,
    #[serde(default)]
    pub bookings: Table<Booking>,
    #[serde(default)]
    pub testimonials: Table<Testimonial>,
}

/// Shared handle to the resident store. Cloning is cheap.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

struct Inner {
    medium: Arc<dyn DurableMedium>,
    db: Mutex<Database>,
}

impl Store {
    pub(crate) fn new(medium: Arc<dyn DurableMedium>, db: Database) -> Self {
        Self {
            inner: Arc::new(Inner {
                medium,
                db: Mutex::new(db),
            }),
        }
    }

    pub fn medium(&self) -> &Arc<dyn DurableMedium> {
        &self.inner.medium
    }

    pub async fn read<T>(&self, f: impl FnOnce(&Database) -> T) -> T {
        let db = self.inner.db.lock().await;
        f(&db)
    }

    /// Runs one mutation and snapshots the result to the medium.
    ///
    /// The mutation is applied to a copy; memory is only updated once the
    /// snapshot is durable. The lock is held across the write, so concurrent
    /// writers are serialized and snapshots land in mutation order.
    pub async fn write<T>(&self, f: impl FnOnce(&mut Database) -> AppResult<T>) -> AppResult<T> {
        let mut db = self.inner.db.lock().await;
        let mut working = db.clone();
        let out = f(&mut working)?;
        snapshot::persist(self.inner.medium.as_ref(), &working)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "store snapshot failed; mutation discarded");
                e
            })?;
        *db = working;
        Ok(out)
    }

    /// Writes the current state without mutating it.
    pub async fn flush(&self) -> Result<(), PersistenceError> {
        let db = self.inner.db.lock().await;
        snapshot::persist(self.inner.medium.as_ref(), &db).await
    }

    #[cfg(test)]
    pub async fn snapshot(&self) -> Result<bytes::Bytes, PersistenceError> {
        let db = self.inner.db.lock().await;
        snapshot::snapshot(&db)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use time::macros::datetime;

    use super::bootstrap::StoreBootstrap;
    use super::Store;
    use crate::bookings::repo_types::{Booking, BookingStatus};
    use crate::config::AdminSeed;
    use crate::storage::MemoryMedium;
    use crate::testimonials::repo_types::Testimonial;
    use crate::users::repo_types::{Role, User};

    pub const ADMIN_EMAIL: &str = "admin@wanderly.test";
    pub const ADMIN_PASSWORD: &str = "admin-pass";

    pub fn admin_seed() -> AdminSeed {
        AdminSeed {
            email: ADMIN_EMAIL.into(),
            password: ADMIN_PASSWORD.into(),
            full_name: "Admin".into(),
        }
    }

    /// Fresh seeded store over a memory medium the test can inspect.
    pub async fn memory_store() -> (Store, Arc<MemoryMedium>) {
        let medium = Arc::new(MemoryMedium::default());
        let store = StoreBootstrap::new(medium.clone(), admin_seed())
            .open()
            .await
            .expect("bootstrap memory store");
        (store, medium)
    }

    pub fn sample_user(id: i64, email: &str) -> User {
        User {
            id,
            full_name: format!("User {id}"),
            email: email.into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
            mobile_number: format!("90000000{id:02}"),
            country_code: "IN".into(),
            role: Role::User,
            signup_date: datetime!(2024-01-02 03:04:05.123456 UTC),
            testimonial_allowed: false,
            is_suspended: false,
        }
    }

    pub fn sample_booking(id: i64, user_id: i64) -> Booking {
        Booking {
            id,
            user_id,
            trip_name: "Kerala Backwaters".into(),
            status: BookingStatus::Pending,
            booking_date: datetime!(2024-02-01 10:00 UTC),
            trip_date: datetime!(2024-06-15 00:00 UTC),
            details: Some("2 adults".into()),
        }
    }

    pub fn sample_testimonial(id: i64, user_id: i64) -> Testimonial {
        Testimonial {
            id,
            user_id,
            user_name: format!("User {user_id}"),
            email: format!("u{user_id}@x.com"),
            trip_name: "Bali Escape".into(),
            quote: "Loved every minute".into(),
            rating: 5,
            role: None,
            location: Some("Pune".into()),
            highlight: None,
            submitted_date: datetime!(2024-03-01 12:00 UTC),
            is_visible: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{memory_store, sample_user};
    use crate::error::AppError;

    #[tokio::test]
    async fn failed_write_leaves_memory_untouched() {
        let (store, medium) = memory_store().await;
        let before = store.read(|db| db.users.len()).await;

        medium.set_fail_writes(true);
        let err = store
            .write(|db| {
                db.users.insert(sample_user(99, "ghost@x.com"));
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
        assert_eq!(store.read(|db| db.users.len()).await, before);
    }

    #[tokio::test]
    async fn rejected_mutation_is_not_persisted() {
        let (store, medium) = memory_store().await;
        let before = medium.contents().await;

        let res: Result<(), _> = store
            .write(|db| {
                db.users.insert(sample_user(42, "half@x.com"));
                Err(AppError::DuplicateEmail)
            })
            .await;
        assert!(res.is_err());
        assert_eq!(medium.contents().await, before);
        assert!(store.read(|db| db.users.get(42).is_none()).await);
    }

    #[tokio::test]
    async fn concurrent_writes_all_reach_the_medium() {
        let (store, medium) = memory_store().await;
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .write(move |db| {
                        let id = db.users.next_id();
                        db.users.insert(sample_user(id, &format!("c{i}@x.com")));
                        Ok(())
                    })
                    .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let bytes = medium.contents().await.unwrap();
        let persisted = crate::db::snapshot::load(&bytes).unwrap();
        // 16 new users plus the seeded administrator
        assert_eq!(persisted.users.len(), 17);
    }
}
