use chrono::{DateTime, Utc};

use super::{Store, StoreError, StoreResult, next_id};
use crate::models::{NewUser, ProfileUpdate, Role, User};

impl Store {
    /// Insert a user. Usernames and emails (case-insensitively) must be unique.
    pub async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut tables = self.inner.write().await;
        let taken = tables.users.values().any(|u| {
            u.username == new_user.username || u.email.eq_ignore_ascii_case(&new_user.email)
        });
        if taken {
            return Err(StoreError::Conflict("Username or email already in use".to_string()));
        }

        let now = Utc::now();
        let id = next_id(&mut tables.ids.user);
        let user = User {
            id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            first_name: None,
            last_name: None,
            phone: None,
            address: None,
            avatar_url: None,
            role: new_user.role,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    pub async fn get_user(&self, user_id: u64) -> StoreResult<User> {
        self.inner
            .read()
            .await
            .users
            .get(&user_id)
            .cloned()
            .ok_or(StoreError::NotFound("User"))
    }

    pub async fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
    }

    pub async fn list_users(&self) -> Vec<User> {
        self.inner.read().await.users.values().cloned().collect()
    }

    pub async fn user_count(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn record_login(&self, user_id: u64, at: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.inner.write().await;
        let user = tables.users.get_mut(&user_id).ok_or(StoreError::NotFound("User"))?;
        user.last_login = Some(at);
        Ok(())
    }

    pub async fn update_profile(&self, user_id: u64, update: ProfileUpdate) -> StoreResult<User> {
        let mut tables = self.inner.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound("User"));
        }
        if let Some(email) = &update.email {
            let taken = tables
                .users
                .values()
                .any(|u| u.id != user_id && u.email.eq_ignore_ascii_case(email));
            if taken {
                return Err(StoreError::Conflict("Email already in use".to_string()));
            }
        }

        let user = tables.users.get_mut(&user_id).ok_or(StoreError::NotFound("User"))?;
        if let Some(email) = update.email {
            user.email = email;
        }
        if update.first_name.is_some() {
            user.first_name = update.first_name;
        }
        if update.last_name.is_some() {
            user.last_name = update.last_name;
        }
        if update.phone.is_some() {
            user.phone = update.phone;
        }
        if update.address.is_some() {
            user.address = update.address;
        }
        if update.avatar_url.is_some() {
            user.avatar_url = update.avatar_url;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    pub async fn set_role(&self, user_id: u64, role: Role) -> StoreResult<User> {
        let mut tables = self.inner.write().await;
        let user = tables.users.get_mut(&user_id).ok_or(StoreError::NotFound("User"))?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: Role::Customer,
        }
    }

    #[tokio::test]
    async fn test_unique_username_and_email() {
        let store = Store::new();
        store.create_user(new_user("alice", "alice@example.com")).await.unwrap();
        assert!(matches!(
            store.create_user(new_user("alice", "other@example.com")).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            store.create_user(new_user("alice2", "ALICE@example.com")).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_profile_update_is_partial() {
        let store = Store::new();
        let alice = store.create_user(new_user("alice", "alice@example.com")).await.unwrap();
        let bob = store.create_user(new_user("bob", "bob@example.com")).await.unwrap();

        let updated = store
            .update_profile(
                alice.id,
                ProfileUpdate { first_name: Some("Alice".to_string()), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(updated.first_name.as_deref(), Some("Alice"));
        assert_eq!(updated.email, "alice@example.com");

        let clash = store
            .update_profile(
                bob.id,
                ProfileUpdate { email: Some("alice@example.com".to_string()), ..Default::default() },
            )
            .await;
        assert!(matches!(clash, Err(StoreError::Conflict(_))));
    }
}
