use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "questions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub link: String,
    pub platform: String,
    pub topic: Vec<String>,
    pub difficulty: String,
    pub tags: Vec<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub needs_revision: bool,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub revision_schedule: Option<RevisionSchedule>,
    pub solved_date: DateTime,
    pub time_spent: Option<i32>,
    pub rating: Option<i32>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub saved_solution: Option<SavedSolution>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Spaced-repetition bookkeeping. Pure data: no background scheduler reads
/// it, the client drives revision from the stored dates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevisionSchedule {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_interval_days")]
    pub interval_days: i32,
    #[serde(default)]
    pub next_revision_date: Option<chrono::NaiveDateTime>,
    #[serde(default)]
    pub last_revised_date: Option<chrono::NaiveDateTime>,
    #[serde(default)]
    pub times_revised: i32,
}

fn default_interval_days() -> i32 {
    3
}

impl Default for RevisionSchedule {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_days: default_interval_days(),
            next_revision_date: None,
            last_revised_date: None,
            times_revised: 0,
        }
    }
}

/// User-authored solution snippet. Opaque to the server beyond length and
/// language checks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedSolution {
    #[serde(default)]
    pub code: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub last_updated: Option<chrono::NaiveDateTime>,
}

fn default_language() -> String {
    "cpp".to_string()
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
