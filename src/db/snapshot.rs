use bytes::Bytes;
use tracing::debug;

use super::Database;
use crate::error::PersistenceError;
use crate::storage::DurableMedium;

/// Serializes the whole store. Output is deterministic for a given state.
pub fn snapshot(db: &Database) -> Result<Bytes, PersistenceError> {
    serde_json::to_vec_pretty(db)
        .map(Bytes::from)
        .map_err(PersistenceError::Encode)
}

/// Parses a snapshot and rebuilds the in-memory lookup indexes.
pub fn load(bytes: &[u8]) -> Result<Database, PersistenceError> {
    let mut db: Database = serde_json::from_slice(bytes).map_err(PersistenceError::Decode)?;
    db.users.rebuild_indexes();
    db.bookings.rebuild_indexes();
    db.testimonials.rebuild_indexes();
    Ok(db)
}

/// Writes a full snapshot of `db` to the medium.
pub async fn persist(medium: &dyn DurableMedium, db: &Database) -> Result<(), PersistenceError> {
    let bytes = snapshot(db)?;
    let size = bytes.len();
    medium
        .write(bytes)
        .await
        .map_err(|source| PersistenceError::Medium {
            medium: medium.describe(),
            source,
        })?;
    debug!(medium = %medium.describe(), size_bytes = size, "store snapshot written");
    Ok(())
}
