//! Ebook store REST backend.
//!
//! Customers browse and review books, place orders and buy curated combos;
//! staff manage the catalog and fulfil orders; admins manage accounts and
//! store-wide pricing. Access is gated by JWTs that can be revoked before
//! they expire (see [`web::token_blacklist`]).

pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;
pub mod web;

use crate::config::BootstrapAdmin;
use crate::error::AppResult;
use crate::models::{NewUser, Role, User};
use crate::store::Store;
use crate::web::auth::hash_password;

/// Create the configured admin account unless that username already exists.
///
/// Returns the new account, or `None` when nothing was created.
pub async fn bootstrap_admin(
    store: &Store,
    admin: &BootstrapAdmin,
    bcrypt_cost: u32,
) -> AppResult<Option<User>> {
    if store.find_user_by_username(&admin.username).await.is_some() {
        return Ok(None);
    }
    let password_hash = hash_password(&admin.password, bcrypt_cost).await?;
    let user = store
        .create_user(NewUser {
            username: admin.username.clone(),
            email: admin.email.clone(),
            password_hash,
            role: Role::Admin,
        })
        .await?;
    tracing::info!(user_id = user.id, username = %user.username, "Bootstrap admin created");
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_admin_runs_once() {
        let store = Store::new();
        let admin = BootstrapAdmin {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password: "Admin@123".to_string(),
        };
        let created = bootstrap_admin(&store, &admin, 4).await.unwrap().unwrap();
        assert_eq!(created.role, Role::Admin);
        assert!(bootstrap_admin(&store, &admin, 4).await.unwrap().is_none());
        assert_eq!(store.user_count().await, 1);
    }
}
