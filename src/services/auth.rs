use crate::{
    error::{AppError, AppResult},
    models::{user, Question, User, UserModel},
    services::email::EmailService,
    utils::{encode_token, generate_otp, hash_password, verify_password},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
};

const OTP_VALIDITY_MINUTES: i64 = 10;

/// Emails are the login key; compare them case-insensitively and without
/// surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Outcome of a registration attempt. `created` distinguishes a brand-new
/// account from a re-registration of an unverified one.
pub struct RegistrationOutcome {
    pub email: String,
    pub created: bool,
}

pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register an account and send its verification code.
    ///
    /// Re-registering an unverified email overwrites name/password and
    /// reissues a code instead of failing; a verified email is a conflict.
    /// If the OTP email cannot be sent, a just-created account is deleted
    /// again so the address stays free for another attempt.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        email_service: &EmailService,
    ) -> AppResult<RegistrationOutcome> {
        let email = normalize_email(email);
        let existing = self.find_by_email(&email).await?;

        let otp = generate_otp()?;
        let now = chrono::Utc::now().naive_utc();
        let otp_expiry = now + chrono::Duration::minutes(OTP_VALIDITY_MINUTES);
        let password_hash = hash_password(password)?;

        match existing {
            Some(user) if user.is_verified => Err(AppError::Conflict(
                "User already exists with this email".to_string(),
            )),
            Some(user) => {
                // Unverified re-registration: treat as a fresh attempt.
                let mut active: user::ActiveModel = user.into();
                active.name = sea_orm::ActiveValue::Set(name.to_string());
                active.password_hash = sea_orm::ActiveValue::Set(password_hash);
                active.verification_otp = sea_orm::ActiveValue::Set(Some(otp.clone()));
                active.otp_expiry = sea_orm::ActiveValue::Set(Some(otp_expiry));
                active.updated_at = sea_orm::ActiveValue::Set(now);
                active.update(&self.db).await?;

                // The reissued code stays valid even if this send fails.
                email_service
                    .send_otp_email(&email, name, &otp)
                    .await
                    .map_err(|e| AppError::Notification(e.to_string()))?;

                Ok(RegistrationOutcome {
                    email,
                    created: false,
                })
            }
            None => {
                let new_user = user::ActiveModel {
                    name: sea_orm::ActiveValue::Set(name.to_string()),
                    email: sea_orm::ActiveValue::Set(email.clone()),
                    password_hash: sea_orm::ActiveValue::Set(password_hash),
                    is_verified: sea_orm::ActiveValue::Set(false),
                    verification_otp: sea_orm::ActiveValue::Set(Some(otp.clone())),
                    otp_expiry: sea_orm::ActiveValue::Set(Some(otp_expiry)),
                    platform_usernames: sea_orm::ActiveValue::Set(None),
                    has_platform_data: sea_orm::ActiveValue::Set(false),
                    preferences: sea_orm::ActiveValue::Set(Default::default()),
                    created_at: sea_orm::ActiveValue::Set(now),
                    updated_at: sea_orm::ActiveValue::Set(now),
                    ..Default::default()
                };
                let user = new_user.insert(&self.db).await?;

                if let Err(e) = email_service.send_otp_email(&email, name, &otp).await {
                    // Roll back so the address is not left stuck unverified
                    // with a code nobody received.
                    if let Err(del) = User::delete_by_id(user.id).exec(&self.db).await {
                        tracing::error!("Rollback of unverified account failed: {del}");
                    }
                    return Err(AppError::Notification(e.to_string()));
                }

                Ok(RegistrationOutcome {
                    email,
                    created: true,
                })
            }
        }
    }

    /// Consume a verification code, mark the account verified, and issue a
    /// session token. The welcome email is dispatched without being awaited.
    pub async fn verify_otp(
        &self,
        email: &str,
        otp: &str,
        email_service: &EmailService,
    ) -> AppResult<(UserModel, String)> {
        let email = normalize_email(email);
        let user = self
            .find_by_email(&email)
            .await?
            .ok_or(AppError::NotFound)?;

        if user.is_verified {
            return Err(AppError::Conflict("Account already verified".to_string()));
        }

        if user.verification_otp.as_deref() != Some(otp) {
            return Err(AppError::InvalidCode);
        }

        let now = chrono::Utc::now().naive_utc();
        match user.otp_expiry {
            Some(expiry) if now < expiry => {}
            _ => return Err(AppError::ExpiredCode),
        }

        let name = user.name.clone();
        let mut active: user::ActiveModel = user.into();
        active.is_verified = sea_orm::ActiveValue::Set(true);
        active.verification_otp = sea_orm::ActiveValue::Set(None);
        active.otp_expiry = sea_orm::ActiveValue::Set(None);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        let user = active.update(&self.db).await?;

        // Detached task: the greeting must never fail the verification.
        let svc = email_service.clone();
        let to = user.email.clone();
        tokio::spawn(async move {
            if let Err(e) = svc.send_welcome_email(&to, &name).await {
                tracing::warn!("Failed to send welcome email to {to}: {e}");
            }
        });

        let token = encode_token(&user.id.to_string())?;
        Ok((user, token))
    }

    /// Regenerate and resend a verification code for an unverified account.
    /// The new code is persisted before the send, so a failed send still
    /// leaves a valid code behind.
    pub async fn resend_otp(&self, email: &str, email_service: &EmailService) -> AppResult<()> {
        let email = normalize_email(email);
        let user = self
            .find_by_email(&email)
            .await?
            .ok_or(AppError::NotFound)?;

        if user.is_verified {
            return Err(AppError::Conflict("Account already verified".to_string()));
        }

        let name = user.name.clone();
        let otp = self.reissue_otp(user).await?;

        email_service
            .send_otp_email(&email, &name, &otp)
            .await
            .map_err(|e| AppError::Notification(e.to_string()))?;

        Ok(())
    }

    /// Authenticate by email/password and issue a session token.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    /// A correct password on an unverified account triggers a code resend
    /// and fails with VerificationRequired instead of logging in.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        email_service: &EmailService,
    ) -> AppResult<(UserModel, String)> {
        let email = normalize_email(email);
        let user = self
            .find_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_verified {
            let name = user.name.clone();
            let otp = self.reissue_otp(user).await?;
            if let Err(e) = email_service.send_otp_email(&email, &name, &otp).await {
                tracing::warn!("Failed to send OTP during login: {e}");
            }
            return Err(AppError::VerificationRequired { email });
        }

        let token = encode_token(&user.id.to_string())?;
        Ok((user, token))
    }

    pub async fn get_user_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self.get_user_by_id(user_id).await?;
        if !verify_password(current_password, &user.password_hash)? {
            return Err(AppError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let new_hash = hash_password(new_password)?;
        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = user.into();
        active.password_hash = sea_orm::ActiveValue::Set(new_hash);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&self.db).await?;
        Ok(())
    }

    /// Delete the account after re-checking the password. Owned questions go
    /// first; there is no transaction across the two deletes, so a crash in
    /// between can orphan rows (accepted risk, FK cascade is the backstop).
    pub async fn delete_account(&self, user_id: i32, password: &str) -> AppResult<()> {
        let user = self.get_user_by_id(user_id).await?;
        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Validation("Password is incorrect".to_string()));
        }

        Question::delete_many()
            .filter(crate::models::question::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        user.delete(&self.db).await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserModel>> {
        let user = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(user)
    }

    /// Store a fresh code and 10-minute expiry on the given account.
    async fn reissue_otp(&self, user: UserModel) -> AppResult<String> {
        let otp = generate_otp()?;
        let now = chrono::Utc::now().naive_utc();
        let expiry = now + chrono::Duration::minutes(OTP_VALIDITY_MINUTES);

        let mut active: user::ActiveModel = user.into();
        active.verification_otp = sea_orm::ActiveValue::Set(Some(otp.clone()));
        active.otp_expiry = sea_orm::ActiveValue::Set(Some(expiry));
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&self.db).await?;

        Ok(otp)
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_email;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ann@X.Com "), "ann@x.com");
    }

    #[test]
    fn normalized_email_is_stable() {
        let once = normalize_email("user@example.com");
        assert_eq!(normalize_email(&once), once);
    }
}
