use sea_orm::entity::prelude::*;

pub const LOCAL_PROVIDER: &str = "local";

/// Sign-in handle for a user. Local accounts use provider `local` with the
/// normalised email as subject.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "user_identity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub user_id: Uuid,
    pub provider: String,
    pub subject: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Entity {
    /// The local identity whose subject is `email`, already normalised.
    pub fn find_local(email: &str) -> Select<Entity> {
        Self::find()
            .filter(Column::Provider.eq(LOCAL_PROVIDER))
            .filter(Column::Subject.eq(email))
    }
}

impl ActiveModelBehavior for ActiveModel {}
