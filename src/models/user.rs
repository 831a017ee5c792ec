use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_verified: bool,
    #[serde(skip_serializing)]
    pub verification_otp: Option<String>,
    #[serde(skip_serializing)]
    pub otp_expiry: Option<DateTime>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub platform_usernames: Option<PlatformUsernames>,
    pub has_platform_data: bool,
    #[sea_orm(column_type = "JsonBinary")]
    pub preferences: Preferences,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Stored handles for external coding platforms. Set once via the submit
/// endpoint, then merge-updated.
#[derive(
    Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, FromJsonQueryResult, ToSchema,
)]
pub struct PlatformUsernames {
    pub github: Option<String>,
    pub leetcode: Option<String>,
    pub codeforces: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub dark_mode: bool,
    pub notifications: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: false,
            notifications: true,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
