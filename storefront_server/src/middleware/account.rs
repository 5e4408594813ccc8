//! Account check middleware.
//!
//! Access tokens outlive the accounts they were issued for. A token stays cryptographically valid after its user is
//! deleted or has their role changed, so this middleware looks the caller up on every authenticated request. Requests
//! whose user no longer exists, or whose role differs from the one in the token, get a 401 and must log in again.
//! Anonymous requests pass straight through.

use std::{marker::PhantomData, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::debug;
use storefront_engine::{traits::UserManagement, AuthApi, AuthApiError};

use crate::{
    auth::JwtClaims,
    errors::{AuthError, ServerError},
};

pub struct AccountCheckFactory<U> {
    _users: PhantomData<fn() -> U>,
}

impl<U> AccountCheckFactory<U> {
    pub fn new() -> Self {
        Self { _users: PhantomData }
    }
}

impl<U> Default for AccountCheckFactory<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B, U> Transform<S, ServiceRequest> for AccountCheckFactory<U>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    U: UserManagement + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AccountCheckService<S, U>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AccountCheckService { service: Rc::new(service), _users: PhantomData })
    }
}

pub struct AccountCheckService<S, U> {
    service: Rc<S>,
    _users: PhantomData<fn() -> U>,
}

impl<S, B, U> Service<ServiceRequest> for AccountCheckService<S, U>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    U: UserManagement + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let claims = req.extensions().get::<JwtClaims>().cloned();
            if let Some(claims) = claims {
                let api = req
                    .app_data::<web::Data<AuthApi<U>>>()
                    .cloned()
                    .ok_or_else(|| ServerError::ConfigurationError("The user API is not registered".into()))?;
                check_account(&api, &claims).await?;
            }
            service.call(req).await
        })
    }
}

async fn check_account<U: UserManagement>(api: &AuthApi<U>, claims: &JwtClaims) -> Result<(), ServerError> {
    let user = match api.profile(claims.user_id).await {
        Ok(user) => user,
        Err(AuthApiError::UserNotFound(_)) => {
            debug!("🔑️ Token for user #{} refers to a deleted account", claims.user_id);
            let e = AuthError::ValidationError("The account no longer exists.".into());
            return Err(ServerError::AuthenticationError(e));
        },
        Err(e) => return Err(e.into()),
    };
    if user.role != claims.role {
        debug!("🔑️ Token for {} claims {} but the account is now {}", user.username, claims.role, user.role);
        let e = AuthError::ValidationError("Your role has changed. Please log in again.".into());
        return Err(ServerError::AuthenticationError(e));
    }
    Ok(())
}
