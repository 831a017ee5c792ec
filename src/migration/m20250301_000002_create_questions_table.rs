use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Questions {
    Table,
    Id,
    UserId,
    Title,
    Description,
    Link,
    Platform,
    Topic,
    Difficulty,
    Tags,
    Notes,
    NeedsRevision,
    RevisionSchedule,
    SolvedDate,
    TimeSpent,
    Rating,
    SavedSolution,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Questions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Questions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Questions::UserId).integer().not_null())
                    .col(ColumnDef::new(Questions::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Questions::Description).text().null())
                    .col(ColumnDef::new(Questions::Link).text().not_null())
                    .col(
                        ColumnDef::new(Questions::Platform)
                            .string_len(32)
                            .not_null()
                            .default("LeetCode"),
                    )
                    .col(
                        ColumnDef::new(Questions::Topic)
                            .array(ColumnType::Text)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Questions::Difficulty)
                            .string_len(16)
                            .not_null()
                            .default("Medium"),
                    )
                    .col(
                        ColumnDef::new(Questions::Tags)
                            .array(ColumnType::Text)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Questions::Notes).text().null())
                    .col(
                        ColumnDef::new(Questions::NeedsRevision)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Questions::RevisionSchedule).json_binary().null())
                    .col(
                        ColumnDef::new(Questions::SolvedDate)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Questions::TimeSpent).integer().null())
                    .col(ColumnDef::new(Questions::Rating).integer().null())
                    .col(ColumnDef::new(Questions::SavedSolution).json_binary().null())
                    .col(
                        ColumnDef::new(Questions::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Questions::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_questions_user_id")
                            .from(Questions::Table, Questions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Questions::Table).to_owned())
            .await
    }
}
