//! Access tokens.
//!
//! Tokens are HS256-signed JWTs. The claims carry the user id, username and role, so that requests can be authorized
//! without a database round trip. A role change therefore only takes effect once the user logs in again.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{DateTime, Duration, Utc};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    UntrustedToken,
};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use storefront_engine::db_types::{Actor, Role, User};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl JwtClaims {
    pub fn for_user(user: &User) -> Self {
        Self { user_id: user.id, username: user.username.clone(), role: user.role }
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role)
    }
}

/// Handlers that need an authenticated user take `JwtClaims` as an argument. The claims are placed in the request
/// extensions by [`crate::middleware::JwtMiddlewareFactory`]; if there are none, the request is rejected with a 401.
/// Use `Option<JwtClaims>` on routes that are open to visitors.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or(ServerError::AuthenticationError(AuthError::MissingToken)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs new access tokens and checks the ones that come back.
#[derive(Clone)]
pub struct TokenIssuer {
    key: Hs256Key,
    lifetime: Duration,
    time_options: TimeOptions,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = Hs256Key::new(config.jwt_secret.reveal().as_bytes());
        Self { key, lifetime: config.token_lifetime, time_options: TimeOptions::default() }
    }

    pub fn issue_token(&self, user: &User) -> Result<AccessToken, AuthError> {
        let header = Header::empty().with_token_type("JWT");
        let claims =
            Claims::new(JwtClaims::for_user(user)).set_duration_and_issuance(&self.time_options, self.lifetime);
        let expires_at = claims.expiration.unwrap_or_else(|| Utc::now() + self.lifetime);
        let access_token = Hs256
            .token(&header, &claims, &self.key)
            .map_err(|e| AuthError::ValidationError(format!("Could not sign token. {e}")))?;
        debug!("🔑️ Issued access token for {} ({}) valid until {expires_at}", user.username, user.role);
        Ok(AccessToken { access_token, token_type: "Bearer".into(), expires_at })
    }

    /// Checks the signature and expiry of the token and returns its claims.
    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let token = Hs256
            .validator::<JwtClaims>(&self.key)
            .validate(&untrusted)
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        token.claims().validate_expiration(&self.time_options).map_err(|e| AuthError::ValidationError(e.to_string()))?;
        let claims = token.claims().custom.clone();
        trace!("🔑️ Access token for user #{} validated", claims.user_id);
        Ok(claims)
    }
}
