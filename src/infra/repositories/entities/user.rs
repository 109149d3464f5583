//! User database entity for SeaORM.
//!
//! Written in the expanded entity format so the table name is derived from
//! the logical entity name instead of being spelled out.

use once_cell::sync::Lazy;
use sea_orm::entity::prelude::*;
use sea_orm::{NotSet, Set};

use crate::domain::User;
use crate::infra::db::base::{assign_client_id, table_name_for, EntityBase};

static TABLE_NAME: Lazy<String> = Lazy::new(|| table_name_for(Entity::LOGICAL_NAME));

#[derive(Copy, Clone, Default, Debug, DeriveEntity)]
pub struct Entity;

impl EntityBase for Entity {
    const LOGICAL_NAME: &'static str = "User";
}

impl EntityName for Entity {
    fn table_name(&self) -> &str {
        &TABLE_NAME
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveModel, DeriveActiveModel)]
pub struct Model {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveColumn)]
pub enum Column {
    Id,
    Email,
    Name,
    CreatedAt,
}

#[derive(Copy, Clone, Debug, EnumIter, DerivePrimaryKey)]
pub enum PrimaryKey {
    Id,
}

impl PrimaryKeyTrait for PrimaryKey {
    type ValueType = Uuid;

    fn auto_increment() -> bool {
        false
    }
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl ColumnTrait for Column {
    type EntityName = Entity;

    fn def(&self) -> ColumnDef {
        match self {
            Self::Id => ColumnType::Uuid.def(),
            Self::Email => ColumnType::Text.def().unique(),
            Self::Name => ColumnType::Text.def(),
            Self::CreatedAt => ColumnType::TimestampWithTimeZone.def(),
        }
    }
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match *self {}
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            assign_client_id(&mut self.id, db);
            if self.created_at.is_not_set() {
                self.created_at = Set(chrono::Utc::now());
            }
        }
        Ok(self)
    }
}

impl ActiveModel {
    /// New row without an id; the id follows the backend's identity policy.
    pub fn from_parts(email: String, name: String) -> Self {
        Self {
            id: NotSet,
            email: Set(email),
            name: Set(name),
            created_at: NotSet,
        }
    }
}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            email: model.email,
            name: model.name,
            created_at: model.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_derived_from_logical_name() {
        assert_eq!(Entity.table_name(), "user");
        assert_eq!(Entity::derived_table_name(), Entity.table_name());
    }

    #[test]
    fn test_from_parts_leaves_id_unset() {
        let active = ActiveModel::from_parts("a@example.com".to_string(), "A".to_string());
        assert!(active.id.is_not_set());
        assert!(active.created_at.is_not_set());
    }
}
