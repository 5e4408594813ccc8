use crate::{
    db_types::{NewUser, User, UserUpdate},
    traits::{data_objects::Pagination, StorageError},
};

/// Storage of user accounts.
///
/// Usernames and email addresses are unique. Backends must return [`StorageError::AlreadyExists`] when an insert or
/// update would break this.
#[allow(async_fn_in_trait)]
pub trait UserManagement {
    async fn fetch_user(&self, id: i64) -> Result<Option<User>, StorageError>;

    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    /// Lists users ordered by id.
    async fn list_users(&self, page: &Pagination) -> Result<Vec<User>, StorageError>;

    async fn create_user(&self, user: NewUser) -> Result<User, StorageError>;

    /// Applies the update and returns the new record, or `None` if the user does not exist. An empty update simply
    /// returns the current record.
    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>, StorageError>;

    /// Deletes the user along with their products, cart, orders and reviews. Returns `false` if there was no such user.
    async fn delete_user(&self, id: i64) -> Result<bool, StorageError>;
}
