//! Authentication for the HTTP API.
//!
//! JWT bearer tokens issued by `/auth/login` against the users table
//! (argon2-hashed passwords). The auth middleware validates the token and
//! stashes an [`AuthUser`] in the request extensions for handlers to extract.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::entities::user::{self, Entity as UserEntity};

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub token_id: String,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role || self.is_admin()
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

pub type AuthenticatedUser = AuthUser;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account disabled")]
    AccountDisabled,

    #[error("Internal auth error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Missing authentication"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AuthError::AccountDisabled => (StatusCode::FORBIDDEN, "Account disabled"),
            AuthError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal auth error"),
        };
        let body = Json(serde_json::json!({
            "success": false,
            "message": message,
        }));
        (status, body).into_response()
    }
}

/// Authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    jwt_secret: String,
    token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, token_expiration: Duration) -> Self {
        Self {
            jwt_secret,
            token_expiration,
        }
    }
}

/// Issues and validates tokens, and checks credentials against the users table.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Verifies a username/password pair and issues a token on success.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let user = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        let parsed =
            PasswordHash::new(&user.password_hash).map_err(|_| AuthError::InvalidCredentials)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let token = self.issue_token(&user)?;
        debug!(username = %user.username, "login succeeded");
        Ok(LoginOutcome {
            token,
            user_id: user.id,
            username: user.username,
            full_name: user.full_name,
            role: user.role,
        })
    }

    /// Issues a signed JWT for the given user.
    pub fn issue_token(&self, user: &user::Model) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            role: user.role.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::seconds(self.config.token_expiration.as_secs() as i64))
                .timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Validates a bearer token and returns the authenticated user.
    pub fn validate_token(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthUser {
            user_id: data.claims.sub,
            username: data.claims.username,
            full_name: data.claims.full_name,
            role: data.claims.role,
            token_id: data.claims.jti,
        })
    }
}

/// Hashes a password for storage (used by seeding and user creation).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Internal(e.to_string()))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Validates the bearer token and inserts the authenticated user into the
/// request extensions. Expects an `Arc<AuthService>` extension installed at
/// router construction time.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => return AuthError::Internal("auth service not installed".into()).into_response(),
    };

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => return AuthError::MissingAuth.into_response(),
    };

    match auth_service.validate_token(token) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
}

impl<S> AuthRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }
}

#[derive(Debug, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: String,
}

pub async fn login_handler(
    State(auth): State<Arc<AuthService>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    payload
        .validate()
        .map_err(|_| AuthError::InvalidCredentials)?;

    let outcome = auth.login(&payload.username, &payload.password).await?;
    Ok(Json(LoginResponse {
        token: outcome.token,
        user_id: outcome.user_id,
        username: outcome.username,
        full_name: outcome.full_name,
        role: outcome.role,
    }))
}

pub fn auth_routes() -> Router<Arc<AuthService>> {
    Router::new().route("/login", post(login_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(hash: String) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            username: "qc-lead".into(),
            full_name: "QC Lead".into(),
            password_hash: hash,
            role: "qc".into(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service() -> AuthService {
        let db = sea_orm::MockDatabase::new(sea_orm::DatabaseBackend::Sqlite).into_connection();
        AuthService::new(
            AuthConfig::new("x".repeat(64), Duration::from_secs(3600)),
            Arc::new(db),
        )
    }

    #[test]
    fn issued_token_round_trips() {
        let svc = service();
        let user = test_user(hash_password("secret").unwrap());
        let token = svc.issue_token(&user).unwrap();

        let auth_user = svc.validate_token(&token).unwrap();
        assert_eq!(auth_user.username, "qc-lead");
        assert_eq!(auth_user.role, "qc");
        assert_eq!(auth_user.user_id, user.id.to_string());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let svc = service();
        assert!(matches!(
            svc.validate_token("not-a-jwt"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter2").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"hunter2", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong", &parsed)
            .is_err());
    }

    #[test]
    fn role_checks() {
        let user = AuthUser {
            user_id: "u".into(),
            username: "inv".into(),
            full_name: "Inventory".into(),
            role: "inventory".into(),
            token_id: "t".into(),
        };
        assert!(user.has_role("inventory"));
        assert!(!user.has_role("qc"));
        assert!(!user.is_admin());
    }
}
