use mockall::mock;
use storefront_engine::{
    db_types::{NewUser, User, UserUpdate},
    traits::{Pagination, StorageError, UserManagement},
};

mock! {
    pub UserManager {}
    impl UserManagement for UserManager {
        async fn fetch_user(&self, id: i64) -> Result<Option<User>, StorageError>;
        async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;
        async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;
        async fn list_users(&self, page: &Pagination) -> Result<Vec<User>, StorageError>;
        async fn create_user(&self, user: NewUser) -> Result<User, StorageError>;
        async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>, StorageError>;
        async fn delete_user(&self, id: i64) -> Result<bool, StorageError>;
    }
}
