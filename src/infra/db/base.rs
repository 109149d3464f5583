//! Shared entity contract: derived table names and UUID identity policy.

use sea_orm::{ActiveValue, ConnectionTrait, DbBackend, Set};
use uuid::Uuid;

/// Implemented by every persisted entity.
pub trait EntityBase {
    /// Logical type name; the table name is derived from it.
    const LOGICAL_NAME: &'static str;

    fn derived_table_name() -> String {
        table_name_for(Self::LOGICAL_NAME)
    }
}

/// Table name for a logical entity name (lowercased).
pub fn table_name_for(logical_name: &str) -> String {
    logical_name.to_lowercase()
}

/// Where new primary keys come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPolicy {
    /// Random v4 UUID assigned before the INSERT
    Client,
    /// Column default (`gen_random_uuid()`) applied by the backend
    Server,
}

impl IdPolicy {
    pub fn for_backend(backend: DbBackend) -> Self {
        match backend {
            DbBackend::Postgres => IdPolicy::Server,
            _ => IdPolicy::Client,
        }
    }
}

/// Fill an unset id on insert when the backend cannot generate one.
///
/// An explicitly set id is always kept.
pub fn assign_client_id<C: ConnectionTrait>(id: &mut ActiveValue<Uuid>, db: &C) {
    if id.is_not_set() && IdPolicy::for_backend(db.get_database_backend()) == IdPolicy::Client {
        *id = Set(Uuid::new_v4());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::MockDatabase;

    struct Invoice;

    impl EntityBase for Invoice {
        const LOGICAL_NAME: &'static str = "Invoice";
    }

    #[test]
    fn test_table_name_is_lowercased() {
        assert_eq!(table_name_for("User"), "user");
        assert_eq!(table_name_for("OrderLine"), "orderline");
        assert_eq!(Invoice::derived_table_name(), "invoice");
    }

    #[test]
    fn test_server_policy_leaves_id_unset() {
        let db = MockDatabase::new(DbBackend::Postgres).into_connection();
        let mut id: ActiveValue<Uuid> = ActiveValue::NotSet;

        assign_client_id(&mut id, &db);

        assert!(id.is_not_set());
    }

    #[test]
    fn test_client_policy_assigns_v4_id() {
        let db = MockDatabase::new(DbBackend::Sqlite).into_connection();
        let mut id: ActiveValue<Uuid> = ActiveValue::NotSet;

        assign_client_id(&mut id, &db);

        let assigned = id.unwrap();
        assert_eq!(assigned.get_version_num(), 4);
    }

    #[test]
    fn test_explicit_id_is_kept() {
        let db = MockDatabase::new(DbBackend::Sqlite).into_connection();
        let fixed = Uuid::new_v4();
        let mut id = Set(fixed);

        assign_client_id(&mut id, &db);

        assert_eq!(id.unwrap(), fixed);
    }

    #[test]
    fn test_id_policy_per_backend() {
        assert_eq!(IdPolicy::for_backend(DbBackend::Sqlite), IdPolicy::Client);
        assert_eq!(IdPolicy::for_backend(DbBackend::MySql), IdPolicy::Client);
        assert_eq!(IdPolicy::for_backend(DbBackend::Postgres), IdPolicy::Server);
    }
}
