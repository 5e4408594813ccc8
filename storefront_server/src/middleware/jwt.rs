//! Access token middleware.
//!
//! Looks for an access token in the `Authorization: Bearer <token>` header, or failing that, in the
//! `sf_access_token` header. A valid token's claims are stored in the request extensions, where the
//! [`crate::auth::JwtClaims`] extractor and the ACL middleware pick them up.
//!
//! Requests without a token pass straight through, since the catalog is open to visitors. A token that is present
//! but invalid is always rejected with a 401.
use std::{pin::Pin, rc::Rc, sync::Arc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::{debug, trace};

use crate::{
    auth::TokenIssuer,
    errors::{AuthError, ServerError},
};

pub const ACCESS_TOKEN_HEADER: &str = "sf_access_token";

pub struct JwtMiddlewareFactory {
    issuer: Arc<TokenIssuer>,
}

impl JwtMiddlewareFactory {
    pub fn new(issuer: Arc<TokenIssuer>) -> Self {
        JwtMiddlewareFactory { issuer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtMiddlewareService { issuer: Arc::clone(&self.issuer), service: Rc::new(service) })
    }
}

pub struct JwtMiddlewareService<S> {
    issuer: Arc<TokenIssuer>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let issuer = Arc::clone(&self.issuer);
        Box::pin(async move {
            match extract_token(&req)? {
                Some(token) => {
                    let claims = issuer.validate(&token).map_err(|e| {
                        debug!("🔑️ Rejecting request to {}. {e}", req.path());
                        ServerError::AuthenticationError(e)
                    })?;
                    req.extensions_mut().insert(claims);
                },
                None => trace!("🔑️ No access token on request to {}", req.path()),
            }
            service.call(req).await
        })
    }
}

fn extract_token(req: &ServiceRequest) -> Result<Option<String>, ServerError> {
    if let Some(value) = req.headers().get(AUTHORIZATION) {
        let value = value.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected 'Bearer <token>'".into()))?;
        return Ok(Some(token.to_string()));
    }
    let token = req
        .headers()
        .get(ACCESS_TOKEN_HEADER)
        .map(|v| v.to_str().map(|s| s.trim().to_string()))
        .transpose()
        .map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?
        .filter(|t| !t.is_empty());
    Ok(token)
}
