use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    http::{header::AUTHORIZATION, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{Duration, Utc};
use log::debug;
use storefront_engine::{
    db_types::{Actor, Role, User},
    events::EventProducers,
    MemoryDatabase,
};

use crate::{
    auth::TokenIssuer,
    config::{AuthConfig, ServerOptions},
    middleware::JwtMiddlewareFactory,
    server::{register_apis, register_routes},
};

// DO NOT re-use this secret anywhere.
pub const TEST_SECRET: &str = "endpoint-tests-only-6f1d0c3a9b8e4f27a5c1d2e3f4a5b6c7";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_SECRET, Duration::hours(24))
}

pub fn user(id: i64, username: &str, role: Role) -> User {
    User {
        id,
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: String::new(),
        full_name: None,
        role,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn issue_token(user: &User) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(user).expect("Failed to issue token").access_token
}

/// A token for a test actor created with the `test_utils` helpers.
pub fn token_for(actor: &Actor, username: &str) -> String {
    issue_token(&user(actor.user_id, username, actor.role))
}

pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

/// Registers the engine APIs on top of `db` along with every route.
pub fn memory_store(db: MemoryDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        register_apis(cfg, &db, EventProducers::default(), 5);
        register_routes::<MemoryDatabase>(cfg);
    }
}

/// Runs the request through an app with the JWT middleware in front, as the server does. Errors raised by middleware
/// are rendered into responses, so callers always get a status and a body back.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let issuer = Arc::new(TokenIssuer::new(&get_auth_config()));
    let app = App::new()
        .wrap(JwtMiddlewareFactory::new(Arc::clone(&issuer)))
        .app_data(web::Data::from(issuer))
        .app_data(web::Data::new(ServerOptions { use_x_forwarded_for: false, use_forwarded: false }))
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = res.into_body().try_into_bytes().unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

pub fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON ({e}): {body}"))
}
