use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{Duration, Utc};
use serde_json::json;
use storefront_engine::{
    db_types::{Actor, Role, User, UserUpdate},
    helpers::hash_password,
    test_utils::prepare_env::create_user,
    traits::UserManagement,
    AuthApi,
    MemoryDatabase,
};

use super::{helpers::*, mocks::MockUserManager};
use crate::{
    auth::TokenIssuer,
    config::AuthConfig,
    middleware::ACCESS_TOKEN_HEADER,
    routes::{LoginRoute, LogoutRoute, MyProfileRoute, RegisterRoute, UsersRoute},
};

const PASSWORD: &str = "correct horse battery";

fn configure_app(users: MockUserManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(AuthApi::new(users)))
            .service(RegisterRoute::<MockUserManager>::new())
            .service(LoginRoute::<MockUserManager>::new())
            .service(
                web::scope("/api")
                    .service(MyProfileRoute::<MockUserManager>::new())
                    .service(LogoutRoute::new())
                    .service(UsersRoute::<MockUserManager>::new()),
            );
    }
}

fn alice_with_password() -> User {
    let mut alice = user(1, "alice", Role::Customer);
    alice.password_hash = hash_password(PASSWORD).expect("Failed to hash password");
    alice
}

fn new_users_are_free(users: &mut MockUserManager) {
    users.expect_fetch_user_by_username().returning(|_| Ok(None));
    users.expect_fetch_user_by_email().returning(|_| Ok(None));
    users.expect_create_user().returning(|u| {
        Ok(User {
            id: 42,
            username: u.username,
            email: u.email,
            password_hash: u.password_hash,
            full_name: u.full_name,
            role: u.role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    });
}

#[actix_web::test]
async fn register_customer() {
    let _ = env_logger::try_init().ok();
    let mut users = MockUserManager::new();
    new_users_are_free(&mut users);
    let req = TestRequest::post().uri("/auth/register").set_json(json!({
        "username": "alice",
        "email": " Alice@Example.COM ",
        "password": PASSWORD,
    }));
    let (status, body) = send_request(req, configure_app(users)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let user = json(&body);
    assert_eq!(user["id"], 42);
    assert_eq!(user["email"], "alice@example.com");
    assert_eq!(user["role"], "customer");
    assert!(user.get("password_hash").is_none(), "The password hash must never be sent to clients");
}

#[actix_web::test]
async fn register_as_admin_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let users = MockUserManager::new();
    let req = TestRequest::post().uri("/auth/register").set_json(json!({
        "username": "mallory",
        "email": "mallory@example.com",
        "password": PASSWORD,
        "role": "admin",
    }));
    let (status, body) = send_request(req, configure_app(users)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Insufficient Permissions. The admin role cannot be assigned this way"}"#);
}

#[actix_web::test]
async fn register_taken_username() {
    let _ = env_logger::try_init().ok();
    let mut users = MockUserManager::new();
    users.expect_fetch_user_by_username().returning(|_| Ok(Some(user(1, "alice", Role::Customer))));
    let req = TestRequest::post().uri("/auth/register").set_json(json!({
        "username": "alice",
        "email": "another@example.com",
        "password": PASSWORD,
    }));
    let (status, body) = send_request(req, configure_app(users)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"The username 'alice' is already taken"}"#);
}

#[actix_web::test]
async fn register_with_short_password() {
    let _ = env_logger::try_init().ok();
    let users = MockUserManager::new();
    let req = TestRequest::post().uri("/auth/register").set_json(json!({
        "username": "bob",
        "email": "bob@example.com",
        "password": "short",
    }));
    let (status, _) = send_request(req, configure_app(users)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn login_with_username() {
    let _ = env_logger::try_init().ok();
    let mut users = MockUserManager::new();
    let alice = alice_with_password();
    users.expect_fetch_user_by_username().returning(move |_| Ok(Some(alice.clone())));
    let req = TestRequest::post().uri("/auth/login").set_json(json!({ "login": "alice", "password": PASSWORD }));
    let (status, body) = send_request(req, configure_app(users)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response = json(&body);
    assert_eq!(response["token_type"], "Bearer");
    assert_eq!(response["user"]["username"], "alice");
    let token = response["access_token"].as_str().expect("No access token");
    let claims = TokenIssuer::new(&get_auth_config()).validate(token).expect("Token should be valid");
    assert_eq!(claims.user_id, 1);
    assert_eq!(claims.role, Role::Customer);
}

#[actix_web::test]
async fn login_with_email() {
    let _ = env_logger::try_init().ok();
    let mut users = MockUserManager::new();
    let alice = alice_with_password();
    users
        .expect_fetch_user_by_email()
        .withf(|email| email.to_string() == "alice@example.com")
        .returning(move |_| Ok(Some(alice.clone())));
    let req =
        TestRequest::post().uri("/auth/login").set_json(json!({ "login": "ALICE@example.com", "password": PASSWORD }));
    let (status, _) = send_request(req, configure_app(users)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn login_with_wrong_password() {
    let _ = env_logger::try_init().ok();
    let mut users = MockUserManager::new();
    let alice = alice_with_password();
    users.expect_fetch_user_by_username().returning(move |_| Ok(Some(alice.clone())));
    let req = TestRequest::post().uri("/auth/login").set_json(json!({ "login": "alice", "password": "guessing" }));
    let (status, body) = send_request(req, configure_app(users)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. Invalid username or password."}"#);
}

#[actix_web::test]
async fn login_unknown_user_looks_like_wrong_password() {
    let _ = env_logger::try_init().ok();
    let mut users = MockUserManager::new();
    users.expect_fetch_user_by_username().returning(|_| Ok(None));
    let req = TestRequest::post().uri("/auth/login").set_json(json!({ "login": "nobody", "password": PASSWORD }));
    let (status, body) = send_request(req, configure_app(users)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. Invalid username or password."}"#);
}

#[actix_web::test]
async fn profile_without_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/api/me");
    let (status, body) = send_request(req, configure_app(MockUserManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. No access token was provided."}"#);
}

#[actix_web::test]
async fn profile_with_bearer_token() {
    let _ = env_logger::try_init().ok();
    let mut users = MockUserManager::new();
    users.expect_fetch_user().withf(|id| *id == 1).returning(|_| Ok(Some(user(1, "alice", Role::Customer))));
    let token = issue_token(&user(1, "alice", Role::Customer));
    let req = TestRequest::get().uri("/api/me").insert_header(bearer(&token));
    let (status, body) = send_request(req, configure_app(users)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["username"], "alice");
}

#[actix_web::test]
async fn profile_with_access_token_header() {
    let _ = env_logger::try_init().ok();
    let mut users = MockUserManager::new();
    users.expect_fetch_user().returning(|_| Ok(Some(user(1, "alice", Role::Customer))));
    let token = issue_token(&user(1, "alice", Role::Customer));
    let req = TestRequest::get().uri("/api/me").insert_header((ACCESS_TOKEN_HEADER, token));
    let (status, _) = send_request(req, configure_app(users)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn tampered_token_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut token = issue_token(&user(1, "alice", Role::Customer));
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let req = TestRequest::get().uri("/api/me").insert_header(bearer(&token));
    let (status, body) = send_request(req, configure_app(MockUserManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Access token is invalid."), "was: {body}");
}

#[actix_web::test]
async fn expired_token_is_rejected() {
    let _ = env_logger::try_init().ok();
    let issuer = TokenIssuer::new(&AuthConfig::new(TEST_SECRET, Duration::minutes(-10)));
    let token = issuer.issue_token(&user(1, "alice", Role::Customer)).unwrap().access_token;
    let req = TestRequest::get().uri("/api/me").insert_header(bearer(&token));
    let (status, body) = send_request(req, configure_app(MockUserManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Access token is invalid."), "was: {body}");
}

#[actix_web::test]
async fn malformed_authorization_header() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/api/me").insert_header(("Authorization", "Basic YWxpY2U6c2VjcmV0"));
    let (status, body) = send_request(req, configure_app(MockUserManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Access token is not in the correct format."), "was: {body}");
}

#[actix_web::test]
async fn logout_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&user(3, "carol", Role::Seller));
    let req = TestRequest::post().uri("/api/logout").insert_header(bearer(&token));
    let (status, body) = send_request(req, configure_app(MockUserManager::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["success"], true);
}

#[actix_web::test]
async fn user_list_requires_admin() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&user(3, "carol", Role::Seller));
    let req = TestRequest::get().uri("/api/admin/users").insert_header(bearer(&token));
    let (status, body) = send_request(req, configure_app(MockUserManager::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        r#"{"error":"Authentication Error. Insufficient Permissions. This route requires one of these roles: admin"}"#
    );
}

#[actix_web::test]
async fn admin_lists_users() {
    let _ = env_logger::try_init().ok();
    let mut users = MockUserManager::new();
    users
        .expect_list_users()
        .withf(|page| page.offset == 10 && page.limit == 5)
        .returning(|_| Ok(vec![user(11, "kim", Role::Customer), user(12, "lee", Role::Seller)]));
    let token = issue_token(&user(1, "root", Role::Admin));
    let req = TestRequest::get().uri("/api/admin/users?offset=10&limit=5").insert_header(bearer(&token));
    let (status, body) = send_request(req, configure_app(users)).await;
    assert_eq!(status, StatusCode::OK);
    let list = json(&body);
    assert_eq!(list.as_array().map(Vec::len), Some(2));
    assert_eq!(list[1]["role"], "seller");
}

#[actix_web::test]
async fn demoted_admin_token_is_rejected() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let admin = create_user(&db, "root", Role::Admin).await;
    let token = token_for(&admin, "root");

    let req = TestRequest::get().uri("/api/admin/users").insert_header(bearer(&token));
    let (status, _) = send_request(req, memory_store(db.clone())).await;
    assert_eq!(status, StatusCode::OK);

    db.update_user(admin.user_id, UserUpdate::default().with_role(Role::Customer)).await.unwrap();
    let req = TestRequest::get().uri("/api/admin/users").insert_header(bearer(&token));
    let (status, body) = send_request(req, memory_store(db.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Your role has changed."), "was: {body}");

    // A fresh login carries the new role
    let demoted = Actor::new(admin.user_id, Role::Customer);
    let req = TestRequest::get().uri("/api/me").insert_header(bearer(&token_for(&demoted, "root")));
    let (status, body) = send_request(req, memory_store(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["role"], "customer");
}

#[actix_web::test]
async fn deleted_admin_token_is_rejected() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let admin = create_user(&db, "root", Role::Admin).await;
    let customer = create_user(&db, "cora", Role::Customer).await;
    let token = token_for(&admin, "root");
    assert!(db.delete_user(admin.user_id).await.unwrap());

    let uri = format!("/api/admin/users/{}", customer.user_id);
    let req = TestRequest::delete().uri(&uri).insert_header(bearer(&token));
    let (status, body) = send_request(req, memory_store(db.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("The account no longer exists."), "was: {body}");
    assert!(db.fetch_user(customer.user_id).await.unwrap().is_some());

    // Anonymous requests are unaffected
    let (status, _) = send_request(TestRequest::get().uri("/products"), memory_store(db)).await;
    assert_eq!(status, StatusCode::OK);
}
