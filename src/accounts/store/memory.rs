use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{CredentialStore, StoreError};
use crate::accounts::model::{IdentityField, NewUser, UserRecord};

/// In-process store. Uniqueness is enforced by checking both indexes and inserting
/// while holding the same lock, which only holds within one process. Use
/// [`super::PgCredentialStore`] when more than one instance shares the data.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    users: Vec<UserRecord>,
    by_email: HashMap<String, usize>,
    by_phone: HashMap<String, usize>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .by_email
            .get(&email.to_lowercase())
            .and_then(|&index| inner.users.get(index))
            .cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .by_phone
            .get(phone)
            .and_then(|&index| inner.users.get(index))
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut inner = self.inner.lock().await;

        let email_key = user.email.to_lowercase();
        if inner.by_email.contains_key(&email_key) {
            return Err(StoreError::Conflict(IdentityField::Email));
        }
        if inner.by_phone.contains_key(&user.phone) {
            return Err(StoreError::Conflict(IdentityField::Phone));
        }

        // Never earlier than the previous insert, even if the wall clock stepped back.
        let now = Utc::now();
        let created_at = inner
            .users
            .last()
            .map_or(now, |last| last.created_at.max(now));

        let record = UserRecord {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            credential_hash: user.credential_hash,
            created_at,
        };

        let index = inner.users.len();
        inner.by_email.insert(email_key, index);
        inner.by_phone.insert(record.phone.clone(), index);
        inner.users.push(record.clone());

        Ok(record)
    }

    async fn list(&self, limit: u32, offset: u64) -> Result<Vec<UserRecord>, StoreError> {
        let inner = self.inner.lock().await;
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(inner.users.iter().skip(skip).take(take).cloned().collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::accounts::password::CredentialHash;
    use std::sync::Arc;
    use uuid::Uuid;

    fn new_user(email: &str, phone: &str) -> NewUser {
        NewUser {
            id: Uuid::now_v7(),
            name: "Test".to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            credential_hash: CredentialHash::from_stored("$argon2id$stub"),
        }
    }

    #[tokio::test]
    async fn create_then_find() {
        let store = MemoryCredentialStore::new();
        let created = store
            .create(new_user("a@x.com", "1234567890"))
            .await
            .unwrap();

        let by_email = store.find_by_email("a@x.com").await.unwrap().unwrap();
        let by_phone = store.find_by_phone("1234567890").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_phone.id, created.id);
        assert!(store.find_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn email_lookup_ignores_case() {
        let store = MemoryCredentialStore::new();
        store
            .create(new_user("a@x.com", "1234567890"))
            .await
            .unwrap();
        assert!(store.find_by_email("A@X.COM").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryCredentialStore::new();
        store
            .create(new_user("a@x.com", "1234567890"))
            .await
            .unwrap();
        let err = store
            .create(new_user("A@x.com", "0987654321"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(IdentityField::Email)));
    }

    #[tokio::test]
    async fn duplicate_phone_conflicts() {
        let store = MemoryCredentialStore::new();
        store
            .create(new_user("a@x.com", "1234567890"))
            .await
            .unwrap();
        let err = store
            .create(new_user("b@x.com", "1234567890"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(IdentityField::Phone)));
    }

    #[tokio::test]
    async fn email_conflict_wins_when_both_taken() {
        let store = MemoryCredentialStore::new();
        store
            .create(new_user("a@x.com", "1234567890"))
            .await
            .unwrap();
        store
            .create(new_user("b@x.com", "5555555555"))
            .await
            .unwrap();
        let err = store
            .create(new_user("a@x.com", "5555555555"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(IdentityField::Email)));
    }

    #[tokio::test]
    async fn concurrent_creates_with_same_email_have_one_winner() {
        let store = Arc::new(MemoryCredentialStore::new());
        let mut tasks = Vec::new();
        for n in 0..16 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .create(new_user("race@x.com", &format!("55500000{n:02}")))
                    .await
            }));
        }

        let mut created = 0;
        let mut conflicts = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(StoreError::Conflict(IdentityField::Email)) => conflicts += 1,
                Err(err) => panic!("unexpected error: {err}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(conflicts, 15);
    }

    #[tokio::test]
    async fn list_pages_in_insertion_order() {
        let store = MemoryCredentialStore::new();
        for n in 0..5 {
            store
                .create(new_user(&format!("u{n}@x.com"), &format!("12345678{n:02}")))
                .await
                .unwrap();
        }

        let all = store.list(10, 0).await.unwrap();
        let emails: Vec<&str> = all.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(
            emails,
            vec!["u0@x.com", "u1@x.com", "u2@x.com", "u3@x.com", "u4@x.com"]
        );
        assert!(all.windows(2).all(|w| w[0].created_at <= w[1].created_at));

        let page = store.list(2, 3).await.unwrap();
        let emails: Vec<&str> = page.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["u3@x.com", "u4@x.com"]);

        assert!(store.list(10, 50).await.unwrap().is_empty());
    }
}
