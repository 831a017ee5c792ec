use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_questions_user_solved \
             ON questions (user_id, solved_date DESC)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_questions_user_revision \
             ON questions (user_id, needs_revision)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_questions_user_platform \
             ON questions (user_id, platform)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP INDEX IF EXISTS idx_questions_user_solved")
            .await?;
        db.execute_unprepared("DROP INDEX IF EXISTS idx_questions_user_revision")
            .await?;
        db.execute_unprepared("DROP INDEX IF EXISTS idx_questions_user_platform")
            .await?;

        Ok(())
    }
}
