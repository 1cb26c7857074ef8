use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dto::auth_dto::{LoginPayload, LoginResponse};
use crate::error::{Error, Result};
use crate::models::user::{NewUser, Theme, User};
use crate::store::SharedStore;
use crate::utils::crypto::{hash_password, password_matches};
use crate::utils::time::now;
use crate::utils::token::{decode_session_token, issue_session_token, Claims};

pub const ROLE_ADMIN: &str = "admin";

/// Token ids revoked by logout, kept until the token would expire anyway.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    revoked: Arc<RwLock<HashMap<Uuid, DateTime<Utc>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn revoke(&self, jti: Uuid, expires_at: DateTime<Utc>) {
        let mut revoked = self.revoked.write().await;
        let at = now();
        revoked.retain(|_, exp| *exp > at);
        revoked.insert(jti, expires_at);
    }

    pub async fn is_revoked(&self, jti: Uuid) -> bool {
        self.revoked.read().await.contains_key(&jti)
    }
}

#[derive(Clone)]
pub struct AuthService {
    store: SharedStore,
    sessions: SessionRegistry,
    jwt_secret: Arc<str>,
    ttl_hours: i64,
}

impl AuthService {
    pub fn new(
        store: SharedStore,
        sessions: SessionRegistry,
        jwt_secret: &str,
        ttl_hours: i64,
    ) -> Self {
        Self {
            store,
            sessions,
            jwt_secret: Arc::from(jwt_secret),
            ttl_hours,
        }
    }

    pub async fn login(&self, payload: LoginPayload) -> Result<LoginResponse> {
        let invalid = || Error::Unauthorized("Invalid email or password".to_string());
        let user = self
            .store
            .find_user_by_email(payload.email.trim())
            .await?
            .ok_or_else(invalid)?;
        let matches = password_matches(&payload.password, &user.password_hash)?;
        if !matches {
            tracing::warn!(user_id = %user.id, "failed login attempt");
            return Err(invalid());
        }

        let (token, claims) =
            issue_session_token(&self.jwt_secret, user.id, &user.role, self.ttl_hours)?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok(LoginResponse {
            token,
            expires_at: claims.expires_at(),
            user,
        })
    }

    pub async fn logout(&self, claims: &Claims) {
        self.sessions.revoke(claims.jti, claims.expires_at()).await;
        tracing::info!(user_id = %claims.sub, "session revoked");
    }

    /// Decodes a bearer token and rejects revoked sessions.
    pub async fn authenticate(&self, token: &str) -> Result<Claims> {
        let claims = decode_session_token(&self.jwt_secret, token)?;
        if self.sessions.is_revoked(claims.jti).await {
            return Err(Error::Unauthorized("Session has ended".to_string()));
        }
        Ok(claims)
    }

    pub async fn me(&self, user_id: Uuid) -> Result<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    pub async fn theme(&self, user_id: Uuid) -> Result<Theme> {
        Ok(self.me(user_id).await?.theme)
    }

    /// Unknown theme names are stored as dark.
    pub async fn set_theme(&self, user_id: Uuid, theme: &str) -> Result<Theme> {
        let theme = Theme::from_stored(Some(theme));
        let user = self
            .store
            .set_user_theme(user_id, theme)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
        Ok(user.theme)
    }

    /// Creates the configured admin account when it does not exist yet.
    pub async fn seed_admin(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<Option<User>> {
        if self.store.find_user_by_email(email).await?.is_some() {
            return Ok(None);
        }
        let password_hash = hash_password(password)?;
        let user = self
            .store
            .insert_user(NewUser {
                email: email.trim().to_lowercase(),
                full_name: full_name.to_string(),
                password_hash,
                role: ROLE_ADMIN.to_string(),
            })
            .await?;
        tracing::info!(user_id = %user.id, "admin account seeded");
        Ok(Some(user))
    }
}
