use crate::{
    error::{AppError, AppResult},
    models::{
        user::{self, PlatformUsernames},
        User, UserModel,
    },
    services::platform::PlatformService,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    pub preferences: Option<PreferencesPatch>,
}

/// Partial preferences update; omitted fields keep their stored value.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    pub dark_mode: Option<bool>,
    pub notifications: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PlatformUsernamesRequest {
    pub github: Option<String>,
    pub leetcode: Option<String>,
    pub codeforces: Option<String>,
}

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, user_id: i32) -> AppResult<UserModel> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn update_profile(
        &self,
        user_id: i32,
        payload: UpdateProfileRequest,
    ) -> AppResult<UserModel> {
        let user = self.get_by_id(user_id).await?;
        let now = chrono::Utc::now().naive_utc();

        let mut preferences = user.preferences.clone();
        if let Some(patch) = payload.preferences {
            if let Some(dark_mode) = patch.dark_mode {
                preferences.dark_mode = dark_mode;
            }
            if let Some(notifications) = patch.notifications {
                preferences.notifications = notifications;
            }
        }

        let mut active: user::ActiveModel = user.into();
        if let Some(name) = payload.name {
            active.name = sea_orm::ActiveValue::Set(name);
        }
        active.preferences = sea_orm::ActiveValue::Set(preferences);
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// First-time submission of platform handles. Every provided handle is
    /// verified against its platform before anything is stored, so either
    /// all handles land or none do. Once stored, only the merge update is
    /// allowed.
    pub async fn submit_platform_usernames(
        &self,
        user_id: i32,
        payload: PlatformUsernamesRequest,
        platform_service: &PlatformService,
    ) -> AppResult<UserModel> {
        let user = self.get_by_id(user_id).await?;

        if user.has_platform_data {
            return Err(AppError::Conflict(
                "Platform usernames already submitted. Use update instead.".to_string(),
            ));
        }

        let usernames = clean_usernames(payload)?;
        if usernames == PlatformUsernames::default() {
            return Err(AppError::Validation(
                "At least one platform username is required".to_string(),
            ));
        }

        if let Some(username) = &usernames.leetcode {
            platform_service.validate_username("leetcode", username).await?;
        }
        if let Some(handle) = &usernames.codeforces {
            platform_service.validate_username("codeforces", handle).await?;
        }
        if let Some(username) = &usernames.github {
            platform_service.validate_username("github", username).await?;
        }

        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = user.into();
        active.platform_usernames = sea_orm::ActiveValue::Set(Some(usernames));
        active.has_platform_data = sea_orm::ActiveValue::Set(true);
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Merge-update stored handles. Provided handles replace the stored
    /// ones; omitted handles are kept. No upstream verification here, a
    /// typo only costs the user their own stats view.
    pub async fn update_platform_usernames(
        &self,
        user_id: i32,
        payload: PlatformUsernamesRequest,
    ) -> AppResult<UserModel> {
        let user = self.get_by_id(user_id).await?;

        let incoming = clean_usernames(payload)?;
        if incoming == PlatformUsernames::default() {
            return Err(AppError::Validation(
                "At least one platform username is required".to_string(),
            ));
        }

        let mut merged = user.platform_usernames.clone().unwrap_or_default();
        if incoming.github.is_some() {
            merged.github = incoming.github;
        }
        if incoming.leetcode.is_some() {
            merged.leetcode = incoming.leetcode;
        }
        if incoming.codeforces.is_some() {
            merged.codeforces = incoming.codeforces;
        }

        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = user.into();
        active.platform_usernames = sea_orm::ActiveValue::Set(Some(merged));
        active.has_platform_data = sea_orm::ActiveValue::Set(true);
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Aggregated stats across every linked platform.
    pub async fn platform_stats(
        &self,
        user_id: i32,
        platform_service: &PlatformService,
    ) -> AppResult<serde_json::Value> {
        let user = self.get_by_id(user_id).await?;

        let usernames = match user.platform_usernames {
            Some(u) if user.has_platform_data => u,
            _ => {
                return Err(AppError::Validation(
                    "No platform usernames found. Please submit them first.".to_string(),
                ))
            }
        };

        Ok(platform_service.aggregate(&usernames).await)
    }
}

/// Trim handles and drop empties. A handle that is all whitespace is a
/// client error rather than silently discarded.
fn clean_usernames(payload: PlatformUsernamesRequest) -> AppResult<PlatformUsernames> {
    let clean = |field: &str, value: Option<String>| -> AppResult<Option<String>> {
        match value {
            None => Ok(None),
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    Err(AppError::Validation(format!(
                        "{field} username cannot be empty"
                    )))
                } else {
                    Ok(Some(trimmed.to_string()))
                }
            }
        }
    };

    Ok(PlatformUsernames {
        github: clean("github", payload.github)?,
        leetcode: clean("leetcode", payload.leetcode)?,
        codeforces: clean("codeforces", payload.codeforces)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_are_trimmed() {
        let payload = PlatformUsernamesRequest {
            github: Some("  octocat ".to_string()),
            leetcode: None,
            codeforces: None,
        };
        let cleaned = clean_usernames(payload).unwrap();
        assert_eq!(cleaned.github.as_deref(), Some("octocat"));
        assert!(cleaned.leetcode.is_none());
    }

    #[test]
    fn whitespace_only_username_rejected() {
        let payload = PlatformUsernamesRequest {
            github: None,
            leetcode: Some("   ".to_string()),
            codeforces: None,
        };
        let err = clean_usernames(payload).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("leetcode")));
    }

    #[test]
    fn empty_payload_cleans_to_default() {
        let cleaned = clean_usernames(PlatformUsernamesRequest::default()).unwrap();
        assert_eq!(cleaned, PlatformUsernames::default());
    }
}
