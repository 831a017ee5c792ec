use crate::{
    error::{AppError, AppResult},
    models::{
        catalog,
        question::{self, RevisionSchedule, SavedSolution},
        Question, QuestionModel,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, QueryFilter, Statement,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    /// Problem title (1-200 characters)
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Absolute http(s) link to the problem
    pub link: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    /// Defaults to LeetCode
    pub platform: Option<String>,
    /// Defaults to ["Array"]; must be non-empty when given
    pub topic: Option<Vec<String>>,
    /// Defaults to Medium
    pub difficulty: Option<String>,
    pub tags: Option<Vec<String>>,
    pub needs_revision: Option<bool>,
    pub revision_schedule: Option<RevisionSchedule>,
    /// Defaults to now
    pub solved_date: Option<chrono::NaiveDateTime>,
    /// Minutes spent solving
    #[validate(range(min = 0))]
    pub time_spent: Option<i32>,
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i32>,
    pub saved_solution: Option<SavedSolution>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub link: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub platform: Option<String>,
    pub topic: Option<Vec<String>>,
    pub difficulty: Option<String>,
    pub tags: Option<Vec<String>>,
    pub needs_revision: Option<bool>,
    pub revision_schedule: Option<RevisionSchedule>,
    pub solved_date: Option<chrono::NaiveDateTime>,
    #[validate(range(min = 0))]
    pub time_spent: Option<i32>,
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i32>,
    pub saved_solution: Option<SavedSolution>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionListQuery {
    /// 1-indexed page, default 1
    pub page: Option<u64>,
    /// Page size, clamped to 1-100, default 20
    pub limit: Option<u64>,
    /// Matches questions whose topic set contains this value
    pub topic: Option<String>,
    pub platform: Option<String>,
    pub difficulty: Option<String>,
    pub needs_revision: Option<bool>,
    /// Case-insensitive substring match over title, description and notes
    pub search: Option<String>,
    /// One of solvedDate, title, difficulty, topic
    pub sort_by: Option<String>,
    /// asc or desc, default desc
    pub sort_order: Option<String>,
}

#[derive(Debug, Serialize, FromQueryResult, ToSchema)]
pub struct StatBucket {
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStats {
    pub total_questions: i64,
    pub revision_count: i64,
    /// Solved within the last 30 days
    pub recent_questions: i64,
    /// Grouped by the stored topic combination, not per individual tag.
    /// A question tagged [Array, Math] counts toward "Array, Math", not
    /// toward Array and Math separately.
    pub topic_stats: Vec<StatBucket>,
    pub difficulty_stats: Vec<StatBucket>,
    pub platform_stats: Vec<StatBucket>,
}

pub struct QuestionService {
    db: DatabaseConnection,
}

impl QuestionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: i32,
        payload: CreateQuestionRequest,
    ) -> AppResult<QuestionModel> {
        if !catalog::is_valid_link(&payload.link) {
            return Err(AppError::Validation(
                "Link must be an absolute http(s) URL".to_string(),
            ));
        }

        let platform = payload.platform.unwrap_or_else(|| "LeetCode".to_string());
        validate_platform(&platform)?;

        let topic = payload.topic.unwrap_or_else(|| vec!["Array".to_string()]);
        validate_topics(&topic)?;

        let difficulty = payload.difficulty.unwrap_or_else(|| "Medium".to_string());
        validate_difficulty(&difficulty)?;

        let tags = payload.tags.unwrap_or_default();
        validate_tags(&tags)?;

        if let Some(schedule) = &payload.revision_schedule {
            validate_schedule(schedule)?;
        }
        if let Some(solution) = &payload.saved_solution {
            validate_solution(solution)?;
        }

        let now = chrono::Utc::now().naive_utc();
        let new_question = question::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(user_id),
            title: sea_orm::ActiveValue::Set(payload.title),
            description: sea_orm::ActiveValue::Set(payload.description),
            link: sea_orm::ActiveValue::Set(payload.link),
            platform: sea_orm::ActiveValue::Set(platform),
            topic: sea_orm::ActiveValue::Set(topic),
            difficulty: sea_orm::ActiveValue::Set(difficulty),
            tags: sea_orm::ActiveValue::Set(tags),
            notes: sea_orm::ActiveValue::Set(payload.notes),
            needs_revision: sea_orm::ActiveValue::Set(payload.needs_revision.unwrap_or(false)),
            revision_schedule: sea_orm::ActiveValue::Set(payload.revision_schedule),
            solved_date: sea_orm::ActiveValue::Set(payload.solved_date.unwrap_or(now)),
            time_spent: sea_orm::ActiveValue::Set(payload.time_spent),
            rating: sea_orm::ActiveValue::Set(payload.rating),
            saved_solution: sea_orm::ActiveValue::Set(payload.saved_solution),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let stored = new_question.insert(&self.db).await?;
        Ok(stored)
    }

    /// Filtered, sorted, paginated listing scoped to the owner.
    /// Returns (records, total, page, limit).
    pub async fn list(
        &self,
        user_id: i32,
        query: &QuestionListQuery,
    ) -> AppResult<(Vec<QuestionModel>, u64, u64, u64)> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * limit;

        let order_clause = build_order_clause(
            query.sort_by.as_deref(),
            query.sort_order.as_deref(),
        )?;

        let mut conditions = vec!["user_id = $1".to_string()];
        let mut values: Vec<sea_orm::Value> = vec![user_id.into()];

        if let Some(topic) = &query.topic {
            values.push(topic.clone().into());
            conditions.push(format!("${} = ANY(topic)", values.len()));
        }
        if let Some(platform) = &query.platform {
            values.push(platform.clone().into());
            conditions.push(format!("platform = ${}", values.len()));
        }
        if let Some(difficulty) = &query.difficulty {
            validate_difficulty(difficulty)?;
            values.push(difficulty.clone().into());
            conditions.push(format!("difficulty = ${}", values.len()));
        }
        if let Some(needs_revision) = query.needs_revision {
            values.push(needs_revision.into());
            conditions.push(format!("needs_revision = ${}", values.len()));
        }
        if let Some(search) = &query.search {
            let pattern = format!("%{}%", escape_like(search));
            values.push(pattern.into());
            let n = values.len();
            conditions.push(format!(
                "(title ILIKE ${n} OR description ILIKE ${n} OR notes ILIKE ${n})"
            ));
        }

        let where_sql = conditions.join(" AND ");

        let count_sql = format!("SELECT COUNT(*) AS count FROM questions WHERE {where_sql}");
        let count_row = self
            .db
            .query_one(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                &count_sql,
                values.clone(),
            ))
            .await?
            .ok_or(AppError::Internal(anyhow::anyhow!("Count query failed")))?;
        let total: i64 = count_row.try_get_by_index(0)?;

        values.push((limit as i64).into());
        let limit_param = values.len();
        values.push((offset as i64).into());
        let offset_param = values.len();

        let select_sql = format!(
            "SELECT * FROM questions WHERE {where_sql} \
             ORDER BY {order_clause} \
             LIMIT ${limit_param} OFFSET ${offset_param}"
        );

        let questions = QuestionModel::find_by_statement(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            &select_sql,
            values,
        ))
        .all(&self.db)
        .await?;

        Ok((questions, total as u64, page, limit))
    }

    pub async fn stats(&self, user_id: i32) -> AppResult<QuestionStats> {
        let total_questions = self
            .scalar_count("SELECT COUNT(*) FROM questions WHERE user_id = $1", vec![
                user_id.into(),
            ])
            .await?;

        let revision_count = self
            .scalar_count(
                "SELECT COUNT(*) FROM questions WHERE user_id = $1 AND needs_revision = TRUE",
                vec![user_id.into()],
            )
            .await?;

        let cutoff = chrono::Utc::now().naive_utc() - chrono::Duration::days(30);
        let recent_questions = self
            .scalar_count(
                "SELECT COUNT(*) FROM questions WHERE user_id = $1 AND solved_date >= $2",
                vec![user_id.into(), cutoff.into()],
            )
            .await?;

        // Grouping by the array column groups per stored combination.
        let topic_stats = self
            .group_counts(
                "SELECT array_to_string(topic, ', ') AS key, COUNT(*) AS count \
                 FROM questions WHERE user_id = $1 \
                 GROUP BY topic ORDER BY count DESC",
                user_id,
            )
            .await?;

        let difficulty_stats = self
            .group_counts(
                "SELECT difficulty AS key, COUNT(*) AS count \
                 FROM questions WHERE user_id = $1 \
                 GROUP BY difficulty ORDER BY count DESC",
                user_id,
            )
            .await?;

        let platform_stats = self
            .group_counts(
                "SELECT platform AS key, COUNT(*) AS count \
                 FROM questions WHERE user_id = $1 \
                 GROUP BY platform ORDER BY count DESC",
                user_id,
            )
            .await?;

        Ok(QuestionStats {
            total_questions,
            revision_count,
            recent_questions,
            topic_stats,
            difficulty_stats,
            platform_stats,
        })
    }

    /// Owner-scoped lookup. A question belonging to someone else is
    /// indistinguishable from one that does not exist.
    pub async fn get_owned(&self, user_id: i32, id: i32) -> AppResult<QuestionModel> {
        Question::find()
            .filter(question::Column::Id.eq(id))
            .filter(question::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Partial update: only provided fields change, each re-validated.
    pub async fn update(
        &self,
        user_id: i32,
        id: i32,
        payload: UpdateQuestionRequest,
    ) -> AppResult<QuestionModel> {
        let existing = self.get_owned(user_id, id).await?;

        if let Some(link) = &payload.link {
            if !catalog::is_valid_link(link) {
                return Err(AppError::Validation(
                    "Link must be an absolute http(s) URL".to_string(),
                ));
            }
        }
        if let Some(platform) = &payload.platform {
            validate_platform(platform)?;
        }
        if let Some(topic) = &payload.topic {
            validate_topics(topic)?;
        }
        if let Some(difficulty) = &payload.difficulty {
            validate_difficulty(difficulty)?;
        }
        if let Some(tags) = &payload.tags {
            validate_tags(tags)?;
        }
        if let Some(schedule) = &payload.revision_schedule {
            validate_schedule(schedule)?;
        }
        if let Some(solution) = &payload.saved_solution {
            validate_solution(solution)?;
        }

        let now = chrono::Utc::now().naive_utc();
        let mut active: question::ActiveModel = existing.into();
        if let Some(title) = payload.title {
            active.title = sea_orm::ActiveValue::Set(title);
        }
        if let Some(link) = payload.link {
            active.link = sea_orm::ActiveValue::Set(link);
        }
        if let Some(description) = payload.description {
            active.description = sea_orm::ActiveValue::Set(Some(description));
        }
        if let Some(notes) = payload.notes {
            active.notes = sea_orm::ActiveValue::Set(Some(notes));
        }
        if let Some(platform) = payload.platform {
            active.platform = sea_orm::ActiveValue::Set(platform);
        }
        if let Some(topic) = payload.topic {
            active.topic = sea_orm::ActiveValue::Set(topic);
        }
        if let Some(difficulty) = payload.difficulty {
            active.difficulty = sea_orm::ActiveValue::Set(difficulty);
        }
        if let Some(tags) = payload.tags {
            active.tags = sea_orm::ActiveValue::Set(tags);
        }
        if let Some(needs_revision) = payload.needs_revision {
            active.needs_revision = sea_orm::ActiveValue::Set(needs_revision);
        }
        if let Some(schedule) = payload.revision_schedule {
            active.revision_schedule = sea_orm::ActiveValue::Set(Some(schedule));
        }
        if let Some(solved_date) = payload.solved_date {
            active.solved_date = sea_orm::ActiveValue::Set(solved_date);
        }
        if let Some(time_spent) = payload.time_spent {
            active.time_spent = sea_orm::ActiveValue::Set(Some(time_spent));
        }
        if let Some(rating) = payload.rating {
            active.rating = sea_orm::ActiveValue::Set(Some(rating));
        }
        if let Some(solution) = payload.saved_solution {
            active.saved_solution = sea_orm::ActiveValue::Set(Some(solution));
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    pub async fn delete(&self, user_id: i32, id: i32) -> AppResult<()> {
        let existing = self.get_owned(user_id, id).await?;
        Question::delete_by_id(existing.id).exec(&self.db).await?;
        Ok(())
    }

    /// Set the manual revision flag. Writing the current value is a no-op.
    pub async fn set_revision(
        &self,
        user_id: i32,
        id: i32,
        needs_revision: bool,
    ) -> AppResult<QuestionModel> {
        let existing = self.get_owned(user_id, id).await?;
        let now = chrono::Utc::now().naive_utc();

        let mut active: question::ActiveModel = existing.into();
        active.needs_revision = sea_orm::ActiveValue::Set(needs_revision);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    async fn scalar_count(&self, sql: &str, values: Vec<sea_orm::Value>) -> AppResult<i64> {
        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                sql,
                values,
            ))
            .await?
            .ok_or(AppError::Internal(anyhow::anyhow!("Count query failed")))?;
        Ok(row.try_get_by_index(0)?)
    }

    async fn group_counts(&self, sql: &str, user_id: i32) -> AppResult<Vec<StatBucket>> {
        let buckets = StatBucket::find_by_statement(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            sql,
            vec![user_id.into()],
        ))
        .all(&self.db)
        .await?;
        Ok(buckets)
    }
}

fn validate_platform(platform: &str) -> AppResult<()> {
    if catalog::is_valid_platform(platform) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Invalid platform: {platform}"
        )))
    }
}

fn validate_difficulty(difficulty: &str) -> AppResult<()> {
    if catalog::is_valid_difficulty(difficulty) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Invalid difficulty: {difficulty}"
        )))
    }
}

fn validate_topics(topics: &[String]) -> AppResult<()> {
    if topics.is_empty() {
        return Err(AppError::Validation(
            "Topic must be an array with at least one topic".to_string(),
        ));
    }
    let invalid = catalog::invalid_topics(topics);
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Invalid topics: {}",
            invalid.join(", ")
        )))
    }
}

fn validate_tags(tags: &[String]) -> AppResult<()> {
    if tags.iter().any(|t| t.len() > 20) {
        return Err(AppError::Validation(
            "Tag cannot be more than 20 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_schedule(schedule: &RevisionSchedule) -> AppResult<()> {
    if !(1..=365).contains(&schedule.interval_days) {
        return Err(AppError::Validation(
            "Revision interval must be between 1 and 365 days".to_string(),
        ));
    }
    Ok(())
}

fn validate_solution(solution: &SavedSolution) -> AppResult<()> {
    if solution.code.len() > 50000 {
        return Err(AppError::Validation(
            "Code cannot be more than 50000 characters".to_string(),
        ));
    }
    if !catalog::is_valid_language(&solution.language) {
        return Err(AppError::Validation(format!(
            "Invalid solution language: {}",
            solution.language
        )));
    }
    Ok(())
}

/// Whitelisted sort keys, each with a stable id tie-break so pages never
/// overlap or drop rows.
fn build_order_clause(sort_by: Option<&str>, sort_order: Option<&str>) -> AppResult<String> {
    let column = match sort_by {
        None | Some("solvedDate") => "solved_date",
        Some("title") => "title",
        Some("difficulty") => "difficulty",
        Some("topic") => "topic",
        Some(other) => {
            return Err(AppError::Validation(format!("Invalid sort field: {other}")));
        }
    };

    let direction = match sort_order {
        None | Some("desc") => "DESC",
        Some("asc") => "ASC",
        Some(other) => {
            return Err(AppError::Validation(format!("Invalid sort order: {other}")));
        }
    };

    Ok(format!("{column} {direction}, id ASC"))
}

/// Escape LIKE metacharacters so user input only ever matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
