use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        errors::AuthError,
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_password_blocking},
        repo::{StoreError, UserStore},
        repo_types::User,
        tokens::{issue_verification_token, token_matches},
        validation::{validate_login, validate_register},
    },
    mailer::Notifier,
};

const VERIFICATION_SUBJECT: &str = "Email Verification";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    AlreadyVerified,
}

/// Registration, verification and login over a user store.
///
/// Holds no per-user state of its own; clones share the store and notifier.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
    keys: JwtKeys,
    public_base_url: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
        keys: JwtKeys,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            users,
            notifier,
            keys,
            public_base_url: public_base_url.into(),
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<(), AuthError> {
        validate_register(&req).map_err(AuthError::Validation)?;

        if self.users.find_by_email(&req.email).await?.is_some() {
            warn!(email = %req.email, "email already registered");
            return Err(AuthError::DuplicateUser);
        }

        let RegisterRequest {
            name,
            email,
            password,
        } = req;
        let hash = hash_password_blocking(password).await?;
        let token = issue_verification_token();
        let user = User::pending(name, email, hash, token);

        match self.users.insert(&user).await {
            Ok(()) => {}
            Err(StoreError::Duplicate) => {
                warn!(email = %user.email, "lost registration race");
                return Err(AuthError::DuplicateUser);
            }
            Err(e) => return Err(e.into()),
        }
        info!(user_id = %user.id, email = %user.email, "user registered");

        // The account exists either way; a lost email is recovered via resend.
        if let Err(e) = self.send_verification(&user).await {
            error!(error = %e, user_id = %user.id, "verification email failed");
        }
        Ok(())
    }

    pub async fn verify_email(&self, email: &str, token: &str) -> Result<VerifyOutcome, AuthError> {
        let mut user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::NotFound)?;

        if user.is_verified {
            return Ok(VerifyOutcome::AlreadyVerified);
        }

        if !token_matches(user.verification_token.as_deref(), token) {
            warn!(user_id = %user.id, "verification token mismatch");
            return Err(AuthError::InvalidToken);
        }

        user.mark_verified();
        match self.users.update(&user).await {
            Ok(_) => {
                info!(user_id = %user.id, "email verified");
                Ok(VerifyOutcome::Verified)
            }
            Err(StoreError::Conflict) => {
                let current = self.users.find_by_email(email).await?;
                match current {
                    Some(u) if u.is_verified => Ok(VerifyOutcome::AlreadyVerified),
                    _ => Err(StoreError::Conflict.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns a signed session token.
    pub async fn login(&self, req: LoginRequest) -> Result<String, AuthError> {
        validate_login(&req).map_err(AuthError::Validation)?;

        let Some(user) = self.users.find_by_email(&req.email).await? else {
            warn!(email = %req.email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !user.is_verified {
            warn!(user_id = %user.id, "login before verification");
            return Err(AuthError::UnverifiedAccount);
        }

        if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.keys.sign(user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(token)
    }

    /// Re-sends the stored token to a pending user. Unknown or verified
    /// addresses are a silent no-op.
    pub async fn resend_verification(&self, email: &str) -> Result<(), AuthError> {
        match self.users.find_by_email(email).await? {
            Some(user) if !user.is_verified => {
                self.send_verification(&user)
                    .await
                    .map_err(AuthError::Notifier)?;
                info!(user_id = %user.id, "verification email re-sent");
            }
            _ => {}
        }
        Ok(())
    }

    fn verification_link(&self, token: &str, email: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("token", token)
            .append_pair("email", email)
            .finish();
        format!("{}/api/auth/verify-email?{}", self.public_base_url, query)
    }

    async fn send_verification(&self, user: &User) -> anyhow::Result<()> {
        let token = user
            .verification_token
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("user has no pending verification token"))?;
        let link = self.verification_link(token, &user.email);
        let html = format!(
            "<h1>Verify Your Email</h1>\
             <p>Click the link below to activate your account:</p>\
             <a href=\"{link}\">{link}</a>"
        );
        self.notifier
            .send(&user.email, VERIFICATION_SUBJECT, &html)
            .await
    }
}
