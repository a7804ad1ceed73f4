use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use argon2::{
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use kgiq_core::errors::{Error as CoreError, Result as CoreResult};
use kgiq_core::families::{Family, FamilyMember, MemberRole, PasswordHasherTrait};
use kgiq_core::utils::today_in;

use crate::error::{ApiError, ErrorBody};
use crate::main_lib::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Member id.
    pub sub: String,
    pub fid: String,
    pub typ: TokenType,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug)]
pub enum AuthError {
    Unauthorized,
    Internal(String),
}

pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl AuthManager {
    pub fn new(jwt_secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret),
            decoding_key: DecodingKey::from_secret(jwt_secret),
            validation,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn issue_token(
        &self,
        member: &FamilyMember,
        typ: TokenType,
    ) -> Result<String, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| AuthError::Internal("System clock is before UNIX_EPOCH".into()))?;
        let ttl = match typ {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: member.id.clone(),
            fid: member.family_id.clone(),
            typ,
            iat: now.as_secs() as usize,
            exp: (now + ttl).as_secs() as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Decodes a token and checks that it is of the `expected` type.
    pub fn validate_token(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!("Rejected token: {:?}", err.kind());
                AuthError::Unauthorized
            })?;
        if claims.typ != expected {
            return Err(AuthError::Unauthorized);
        }
        Ok(claims)
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AuthError::Internal(msg) => {
                tracing::error!("Authentication failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message,
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized => ApiError::Unauthorized("Unauthorized".to_string()),
            AuthError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

/// Argon2id hashing with the crate defaults.
#[derive(Default)]
pub struct Argon2PasswordHasher;

impl PasswordHasherTrait for Argon2PasswordHasher {
    fn hash_password(&self, password: &str) -> CoreResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CoreError::Unexpected(format!("Failed to hash password: {e}")))
    }

    fn verify_password(&self, password: &str, password_hash: &str) -> CoreResult<bool> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|e| CoreError::Unexpected(format!("Invalid stored password hash: {e}")))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(other) => Err(CoreError::Unexpected(format!(
                "Password verification failed: {other}"
            ))),
        }
    }
}

pub fn decode_secret_key(raw: &str) -> anyhow::Result<Vec<u8>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        anyhow::bail!("Secret cannot be empty");
    }
    let decoded = match BASE64.decode(trimmed) {
        Ok(bytes) => bytes,
        Err(_) if trimmed.len() == 32 => trimmed.as_bytes().to_vec(),
        Err(_) => {
            anyhow::bail!("Secret must be base64 encoded or a 32-byte ASCII string")
        }
    };

    if decoded.len() != 32 {
        anyhow::bail!("Secret must decode to exactly 32 bytes");
    }

    Ok(decoded)
}

/// The authenticated member, attached to every request behind [`require_jwt`].
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub member: FamilyMember,
    pub family: Family,
}

impl AuthContext {
    pub fn family_id(&self) -> &str {
        &self.family.id
    }

    /// The family's local date.
    pub fn today(&self) -> chrono::NaiveDate {
        today_in(&self.family.timezone)
    }

    pub fn role(&self) -> MemberRole {
        self.member.role
    }

    pub fn require_write(&self) -> Result<(), ApiError> {
        if self.member.role.can_write() {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "Viewers cannot change financial data".to_string(),
            ))
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.member.role.can_manage_family() {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "Only family administrators can do this".to_string(),
            ))
        }
    }
}

fn bearer_token(request: &Request<Body>) -> Option<&str> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?;
    let mut parts = header.splitn(2, ' ');
    let (Some(scheme), Some(token)) = (parts.next(), parts.next()) else {
        return None;
    };
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Validates the access token and loads the member it was issued to.
///
/// The member is re-read on every request so removed members and role
/// changes take effect before their tokens expire.
pub async fn require_jwt(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(&request).ok_or(AuthError::Unauthorized)?;
    let claims = state.auth.validate_token(token, TokenType::Access)?;

    let (member, family) = match state.auth_service.load_member(&claims.sub) {
        Ok(loaded) => loaded,
        Err(CoreError::NotFound(_)) => return Err(AuthError::Unauthorized),
        Err(e) => return Err(AuthError::Internal(e.to_string())),
    };
    if member.family_id != claims.fid {
        return Err(AuthError::Unauthorized);
    }

    request
        .extensions_mut()
        .insert(AuthContext { member, family });
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn member() -> FamilyMember {
        let now = Utc::now().naive_utc();
        FamilyMember {
            id: "m1".into(),
            family_id: "f1".into(),
            email: "a@example.com".into(),
            name: "A".into(),
            role: MemberRole::Editor,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn manager() -> AuthManager {
        AuthManager::new(
            &[7u8; 32],
            Duration::from_secs(900),
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn access_token_round_trip() {
        let auth = manager();
        let token = auth.issue_token(&member(), TokenType::Access).unwrap();
        let claims = auth.validate_token(&token, TokenType::Access).unwrap();
        assert_eq!(claims.sub, "m1");
        assert_eq!(claims.fid, "f1");
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let auth = manager();
        let refresh = auth.issue_token(&member(), TokenType::Refresh).unwrap();
        assert!(matches!(
            auth.validate_token(&refresh, TokenType::Access),
            Err(AuthError::Unauthorized)
        ));
        assert!(auth.validate_token(&refresh, TokenType::Refresh).is_ok());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = AuthManager::new(
            &[9u8; 32],
            Duration::from_secs(900),
            Duration::from_secs(3600),
        );
        let token = other.issue_token(&member(), TokenType::Access).unwrap();
        assert!(matches!(
            manager().validate_token(&token, TokenType::Access),
            Err(AuthError::Unauthorized)
        ));
        assert!(matches!(
            manager().validate_token("garbage", TokenType::Access),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn argon2_hasher_verifies() {
        let hasher = Argon2PasswordHasher;
        let hash = hasher.hash_password("correct horse").unwrap();
        assert!(hasher.verify_password("correct horse", &hash).unwrap());
        assert!(!hasher.verify_password("wrong horse", &hash).unwrap());
        assert!(hasher.verify_password("x", "not-a-hash").is_err());
    }

    #[test]
    fn secret_key_decoding() {
        assert_eq!(
            decode_secret_key(&BASE64.encode([1u8; 32])).unwrap(),
            vec![1u8; 32]
        );
        assert_eq!(
            decode_secret_key("kgiq-local-development-secret-32").unwrap().len(),
            32
        );
        assert!(decode_secret_key("short").is_err());
        assert!(decode_secret_key("  ").is_err());
    }
}
