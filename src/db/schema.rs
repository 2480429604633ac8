use tracing::debug;

use super::Database;

pub const SCHEMA_VERSION: u32 = 1;

pub const USERS_BY_EMAIL: &str = "idx_users_email";
pub const USERS_BY_PHONE: &str = "idx_users_phone";
pub const BOOKINGS_BY_USER: &str = "idx_bookings_user_id";
pub const TESTIMONIALS_BY_USER: &str = "idx_testimonials_user_id";
pub const TESTIMONIALS_BY_VISIBILITY: &str = "idx_testimonials_is_visible";

/// Creates the users/bookings/testimonials tables and their indexes if absent.
///
/// Safe to run on a populated store: existing rows are kept and only missing
/// indexes are built. Returns true when anything changed.
pub fn ensure_schema(db: &mut Database) -> bool {
    let mut changed = false;

    if db.schema_version < SCHEMA_VERSION {
        debug!(from = db.schema_version, to = SCHEMA_VERSION, "creating tables");
        db.schema_version = SCHEMA_VERSION;
        changed = true;
    }

    for name in [USERS_BY_EMAIL, USERS_BY_PHONE] {
        if db.users.create_index(name) {
            debug!(index = name, table = "users", "index created");
            changed = true;
        }
    }
    if db.bookings.create_index(BOOKINGS_BY_USER) {
        debug!(index = BOOKINGS_BY_USER, table = "bookings", "index created");
        changed = true;
    }
    for name in [TESTIMONIALS_BY_USER, TESTIMONIALS_BY_VISIBILITY] {
        if db.testimonials.create_index(name) {
            debug!(index = name, table = "testimonials", "index created");
            changed = true;
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::sample_user;

    #[test]
    fn fresh_database_gets_schema() {
        let mut db = Database::default();
        assert!(ensure_schema(&mut db));
        assert_eq!(db.schema_version, SCHEMA_VERSION);
        assert!(db.users.has_index(USERS_BY_EMAIL));
        assert!(db.bookings.has_index(BOOKINGS_BY_USER));
        assert!(db.testimonials.has_index(TESTIMONIALS_BY_VISIBILITY));
    }

    #[test]
    fn second_run_is_a_no_op_and_keeps_rows() {
        let mut db = Database::default();
        ensure_schema(&mut db);
        db.users.insert(sample_user(1, "a@x.com"));

        assert!(!ensure_schema(&mut db));
        assert_eq!(db.users.len(), 1);
        assert_eq!(db.users.lookup(USERS_BY_EMAIL, "a@x.com").len(), 1);
    }
}
