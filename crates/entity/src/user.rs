use sea_orm::entity::prelude::*;

/// Someone who may sign in to the directory. Accounts are separate from
/// employee records; signing in grants access to every record.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Normalised (trimmed, lower-case) address.
    #[sea_orm(unique)]
    pub email: String,
    pub display_name: String,
    /// Inactive accounts cannot sign in and their sessions stop resolving.
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
