use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Employee {
    Table,
    Id,
    Name,
    Email,
    Position,
    Department,
    StartDate,
    SubmittedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Department and start date stay text: the table stores whatever the
        // client sent and leaves enforcement to the validator.
        manager
            .create_table(
                Table::create()
                    .table(Employee::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Employee::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Employee::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Employee::Email).string_len(320).not_null())
                    .col(ColumnDef::new(Employee::Position).string_len(256).not_null())
                    .col(ColumnDef::new(Employee::Department).string_len(64).not_null())
                    .col(ColumnDef::new(Employee::StartDate).string_len(32).not_null())
                    .col(ColumnDef::new(Employee::SubmittedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_employee_department")
                    .table(Employee::Table)
                    .col(Employee::Department)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Employee::Table).to_owned())
            .await?;
        Ok(())
    }
}
