use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::{schema, seed, snapshot, Database, Store};
use crate::config::AdminSeed;
use crate::error::{PersistenceError, StoreInitError};
use crate::storage::DurableMedium;

/// Load-or-create for the store. `open` runs at most once per bootstrap;
/// later calls hand back the same [`Store`].
pub struct StoreBootstrap {
    medium: Arc<dyn DurableMedium>,
    admin: AdminSeed,
    store: OnceCell<Store>,
}

impl StoreBootstrap {
    pub fn new(medium: Arc<dyn DurableMedium>, admin: AdminSeed) -> Self {
        Self {
            medium,
            admin,
            store: OnceCell::new(),
        }
    }

    pub async fn open(&self) -> Result<Store, StoreInitError> {
        self.store
            .get_or_try_init(|| open_store(self.medium.clone(), &self.admin))
            .await
            .cloned()
    }
}

async fn open_store(
    medium: Arc<dyn DurableMedium>,
    admin: &AdminSeed,
) -> Result<Store, StoreInitError> {
    let name = medium.describe();

    let existing = medium
        .read()
        .await
        .map_err(|source| StoreInitError::Load {
            medium: name.clone(),
            source: PersistenceError::Medium {
                medium: name.clone(),
                source,
            },
        })?;

    let (mut db, fresh) = match existing {
        Some(bytes) => {
            let db = snapshot::load(&bytes).map_err(|source| StoreInitError::Load {
                medium: name.clone(),
                source,
            })?;
            info!(
                medium = %name,
                users = db.users.len(),
                bookings = db.bookings.len(),
                testimonials = db.testimonials.len(),
                "store loaded"
            );
            (db, false)
        }
        None => {
            info!(medium = %name, "no existing store, creating a new one");
            (Database::default(), true)
        }
    };

    let upgraded = schema::ensure_schema(&mut db);
    if upgraded && !fresh {
        warn!(medium = %name, "loaded store was missing schema objects; upgraded");
    }

    let store = Store::new(medium, db);
    if fresh || upgraded {
        store
            .flush()
            .await
            .map_err(|source| StoreInitError::Create {
                medium: name.clone(),
                source,
            })?;
    }

    seed::ensure_admin(&store, admin)
        .await
        .map_err(|e| StoreInitError::Seed(Box::new(e)))?;

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{admin_seed, ADMIN_EMAIL};
    use crate::storage::{FileMedium, MemoryMedium};
    use crate::error::AppError;
    use crate::users::repo_types::{Role, User, UserPatch};
    use bytes::Bytes;
    use tempfile::TempDir;

    #[tokio::test]
    async fn fresh_store_is_created_and_persisted() {
        let medium = Arc::new(MemoryMedium::default());
        let store = StoreBootstrap::new(medium.clone(), admin_seed())
            .open()
            .await
            .unwrap();

        assert!(medium.contents().await.is_some());
        let admins = store
            .read(|db| db.users.iter().filter(|u| u.role == Role::Admin).count())
            .await;
        assert_eq!(admins, 1);
    }

    #[tokio::test]
    async fn open_twice_returns_the_same_store() {
        let medium = Arc::new(MemoryMedium::default());
        let boot = StoreBootstrap::new(medium.clone(), admin_seed());
        let a = boot.open().await.unwrap();
        let b = boot.open().await.unwrap();
        assert!(Arc::ptr_eq(&a.inner, &b.inner));
    }

    #[tokio::test]
    async fn unparseable_bytes_are_fatal() {
        let medium = Arc::new(MemoryMedium::with_bytes(Bytes::from_static(b"<html>")));
        let err = StoreBootstrap::new(medium.clone(), admin_seed())
            .open()
            .await
            .err()
            .expect("open must fail");
        assert!(matches!(err, StoreInitError::Load { .. }));
        // the broken bytes are left for inspection
        assert_eq!(&medium.contents().await.unwrap()[..], b"<html>");
    }

    #[tokio::test]
    async fn reopening_a_file_store_keeps_rows_and_single_admin() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");

        let first = StoreBootstrap::new(Arc::new(FileMedium::new(&path)), admin_seed())
            .open()
            .await
            .unwrap();
        let before = first.snapshot().await.unwrap();
        drop(first);

        let second = StoreBootstrap::new(Arc::new(FileMedium::new(&path)), admin_seed())
            .open()
            .await
            .unwrap();
        let admins = second
            .read(|db| {
                db.users
                    .iter()
                    .filter(|u| u.email == ADMIN_EMAIL && u.role == Role::Admin)
                    .count()
            })
            .await;
        assert_eq!(admins, 1);
        assert_eq!(second.snapshot().await.unwrap(), before);
    }

    #[tokio::test]
    async fn admin_with_another_email_is_not_seeded_again() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");

        let first = StoreBootstrap::new(Arc::new(FileMedium::new(&path)), admin_seed())
            .open()
            .await
            .unwrap();
        let admin_id = User::find_by_email(&first, ADMIN_EMAIL).await.unwrap().id;
        let err = User::update(
            &first,
            admin_id,
            UserPatch {
                email: Some("boss@x.com".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ProtectedRole));

        // a snapshot whose admin row no longer carries the reserved email
        first
            .write(|db| {
                db.users
                    .update(admin_id, |u| u.email = "boss@x.com".into())
                    .ok_or(AppError::NotFound { entity: "user", id: admin_id })
            })
            .await
            .unwrap();
        drop(first);

        let second = StoreBootstrap::new(Arc::new(FileMedium::new(&path)), admin_seed())
            .open()
            .await
            .unwrap();
        let admins = second
            .read(|db| db.users.iter().filter(|u| u.role == Role::Admin).count())
            .await;
        assert_eq!(admins, 1);
        assert!(User::find_by_email(&second, ADMIN_EMAIL).await.is_none());
    }
}
