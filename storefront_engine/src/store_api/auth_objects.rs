use serde::Deserialize;
use sf_common::Secret;

use crate::db_types::Role;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: Secret<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    /// Customer by default. Visitors may also register as sellers.
    #[serde(default)]
    pub role: Option<Role>,
}

/// `login` may be either the username or the email address.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: Secret<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    /// A new password. Requires `current_password`.
    #[serde(default)]
    pub new_password: Option<Secret<String>>,
    #[serde(default)]
    pub current_password: Option<Secret<String>>,
}

/// The administrator account that is created on startup if it does not exist yet.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: Secret<String>,
}
