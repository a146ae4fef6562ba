use sea_orm::entity::prelude::*;

/// One employee record. Business columns are free text: the validator, not
/// the table, decides what a valid department or start date is.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "employee")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub email: String,
    pub position: String,
    #[sea_orm(indexed)]
    pub department: String,
    pub start_date: String,
    pub submitted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
