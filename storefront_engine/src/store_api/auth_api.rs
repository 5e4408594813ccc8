//! Registration, login and user administration.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Actor, NewUser, Role, User, UserUpdate},
    helpers::{
        hash_password,
        normalize_email,
        validate_email,
        validate_password,
        validate_username,
        verify_password,
    },
    store_api::{
        auth_objects::{BootstrapAdmin, LoginRequest, ProfileUpdate, RegisterRequest},
        errors::AuthApiError,
    },
    traits::{Pagination, UserManagement},
};

pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B>
where B: UserManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Creates a new customer or seller account.
    pub async fn register(&self, req: RegisterRequest) -> Result<User, AuthApiError> {
        let role = req.role.unwrap_or_default();
        if !role.is_self_assignable() {
            warn!("🔑️ Someone tried to register '{}' as an {role}", req.username);
            return Err(AuthApiError::RoleNotAllowed(role));
        }
        let username = req.username.trim().to_string();
        validate_username(&username)?;
        let email = normalize_email(&req.email);
        validate_email(&email)?;
        validate_password(req.password.reveal())?;
        self.create_account(username, email, req.password.reveal(), req.full_name, role).await
    }

    async fn create_account(
        &self,
        username: String,
        email: String,
        password: &str,
        full_name: Option<String>,
        role: Role,
    ) -> Result<User, AuthApiError> {
        if self.db.fetch_user_by_username(&username).await?.is_some() {
            return Err(AuthApiError::UsernameTaken(username));
        }
        if self.db.fetch_user_by_email(&email).await?.is_some() {
            return Err(AuthApiError::EmailTaken(email));
        }
        let password_hash = hash_password(password)?;
        let full_name = full_name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let user = self.db.create_user(NewUser { username, email, password_hash, full_name, role }).await?;
        info!("🔑️ New {} account #{} registered for {}", user.role, user.id, user.username);
        Ok(user)
    }

    /// Checks the credentials and returns the user. The same error is returned for an unknown user and a wrong
    /// password.
    pub async fn login(&self, req: LoginRequest) -> Result<User, AuthApiError> {
        let login = req.login.trim();
        let user = if login.contains('@') {
            self.db.fetch_user_by_email(&normalize_email(login)).await?
        } else {
            self.db.fetch_user_by_username(login).await?
        };
        match user {
            Some(user) if verify_password(req.password.reveal(), &user.password_hash) => {
                debug!("🔑️ {} logged in", user.username);
                Ok(user)
            },
            Some(user) => {
                info!("🔑️ Failed login attempt for {}", user.username);
                Err(AuthApiError::InvalidCredentials)
            },
            None => {
                debug!("🔑️ Login attempt for unknown user '{login}'");
                Err(AuthApiError::InvalidCredentials)
            },
        }
    }

    pub async fn profile(&self, user_id: i64) -> Result<User, AuthApiError> {
        self.db.fetch_user(user_id).await?.ok_or(AuthApiError::UserNotFound(user_id))
    }

    pub async fn update_profile(&self, user_id: i64, req: ProfileUpdate) -> Result<User, AuthApiError> {
        let user = self.profile(user_id).await?;
        let mut update = UserUpdate::default();
        if let Some(email) = req.email {
            let email = normalize_email(&email);
            validate_email(&email)?;
            if email != user.email {
                if self.db.fetch_user_by_email(&email).await?.is_some() {
                    return Err(AuthApiError::EmailTaken(email));
                }
                update.email = Some(email);
            }
        }
        update.full_name = req.full_name.map(|n| n.trim().to_string());
        if let Some(new_password) = req.new_password {
            let current = req
                .current_password
                .ok_or_else(|| AuthApiError::ValidationError("Your current password is required".into()))?;
            if !verify_password(current.reveal(), &user.password_hash) {
                return Err(AuthApiError::InvalidCredentials);
            }
            validate_password(new_password.reveal())?;
            update.password_hash = Some(hash_password(new_password.reveal())?);
        }
        let user = self.db.update_user(user_id, update).await?.ok_or(AuthApiError::UserNotFound(user_id))?;
        debug!("🔑️ Profile for {} updated", user.username);
        Ok(user)
    }

    pub async fn list_users(&self, page: &Pagination) -> Result<Vec<User>, AuthApiError> {
        Ok(self.db.list_users(page).await?)
    }

    /// Changes a user's role. Admins cannot change their own role, so there is always at least one admin left.
    pub async fn set_role(&self, actor: &Actor, user_id: i64, role: Role) -> Result<User, AuthApiError> {
        if !actor.is_admin() {
            return Err(AuthApiError::Forbidden("Only admins can change roles".into()));
        }
        if actor.user_id == user_id {
            return Err(AuthApiError::Forbidden("You cannot change your own role".into()));
        }
        let user = self
            .db
            .update_user(user_id, UserUpdate::default().with_role(role))
            .await?
            .ok_or(AuthApiError::UserNotFound(user_id))?;
        info!("🔑️ {} is now a {role} (changed by user #{})", user.username, actor.user_id);
        Ok(user)
    }

    pub async fn delete_user(&self, actor: &Actor, user_id: i64) -> Result<(), AuthApiError> {
        if !actor.is_admin() {
            return Err(AuthApiError::Forbidden("Only admins can delete accounts".into()));
        }
        if actor.user_id == user_id {
            return Err(AuthApiError::Forbidden("You cannot delete your own account".into()));
        }
        if !self.db.delete_user(user_id).await? {
            return Err(AuthApiError::UserNotFound(user_id));
        }
        info!("🔑️ User #{user_id} deleted by user #{}", actor.user_id);
        Ok(())
    }

    /// Creates the bootstrap admin if no account with that username exists. Returns the admin account either way.
    pub async fn ensure_admin(&self, admin: &BootstrapAdmin) -> Result<User, AuthApiError> {
        if let Some(user) = self.db.fetch_user_by_username(&admin.username).await? {
            if user.role != Role::Admin {
                warn!("🔑️ The bootstrap admin account '{}' exists, but is a {}", user.username, user.role);
            }
            return Ok(user);
        }
        validate_password(admin.password.reveal())?;
        let user = self
            .create_account(
                admin.username.clone(),
                normalize_email(&admin.email),
                admin.password.reveal(),
                None,
                Role::Admin,
            )
            .await?;
        info!("🔑️ Bootstrap admin account '{}' created", user.username);
        Ok(user)
    }
}
