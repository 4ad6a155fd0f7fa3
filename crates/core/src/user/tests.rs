//! Profile updates and administrator user management.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use pennywise_shared::AppError;
use pennywise_shared::auth::Role;
use pennywise_shared::types::{Amount, UserId};
use rstest::rstest;

use super::*;
use crate::auth::{AuthService, Credential};
use crate::budget::{Budget, BudgetDraft};
use crate::clock::FixedClock;
use crate::memory::MemoryStore;
use crate::notification::{Notification, PROFILE_UPDATED};
use crate::resource::Scope;
use crate::store::{Notice, ResourceStore, StoreError, StoreResult, UserStore};

/// Delegates to a `MemoryStore` but fails every write that carries a credential.
struct CredentialWriteFails(Arc<MemoryStore>);

#[async_trait::async_trait]
impl UserStore for CredentialWriteFails {
    async fn list(&self) -> StoreResult<Vec<User>> {
        UserStore::list(self.0.as_ref()).await
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        self.0.find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<StoredUser>> {
        self.0.find_by_email(email).await
    }

    async fn find_stored(&self, id: UserId) -> StoreResult<Option<StoredUser>> {
        self.0.find_stored(id).await
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        self.0.email_exists(email).await
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        UserStore::insert(self.0.as_ref(), user).await
    }

    async fn update(
        &self,
        id: UserId,
        expected_version: i32,
        changes: UserChanges,
        notice: Option<Notice>,
    ) -> StoreResult<User> {
        if changes.credential.is_some() {
            return Err(StoreError::Backend("credential write failed".to_string()));
        }
        UserStore::update(self.0.as_ref(), id, expected_version, changes, notice).await
    }

    async fn set_credential(
        &self,
        _id: UserId,
        _credential: &Credential,
        _notice: Option<Notice>,
    ) -> StoreResult<()> {
        Err(StoreError::Backend("credential write failed".to_string()))
    }

    async fn delete(&self, id: UserId) -> StoreResult<()> {
        UserStore::delete(self.0.as_ref(), id).await
    }
}

fn setup() -> (Arc<MemoryStore>, UserService, AuthService) {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap()));
    let users = UserService::new(store.clone(), clock.clone());
    let auth = AuthService::new(store.clone(), clock);
    (store, users, auth)
}

async fn register(auth: &AuthService, email: &str) -> User {
    auth.register(
        Registration {
            email: email.to_string(),
            ..Registration::default()
        },
        "Str0ng!Pass",
    )
    .await
    .unwrap()
}

fn profile(email: &str) -> ProfileUpdate {
    ProfileUpdate {
        email: email.to_string(),
        first_name: " Grace ".to_string(),
        last_name: "Hopper".to_string(),
        gender: Gender::Female,
        version: None,
    }
}

#[rstest]
#[case("male", Gender::Male)]
#[case("FEMALE", Gender::Female)]
#[case("other", Gender::Other)]
#[case("", Gender::Unspecified)]
fn test_gender_from_str(#[case] raw: &str, #[case] expected: Gender) {
    assert_eq!(raw.parse::<Gender>().unwrap(), expected);
}

#[test]
fn test_user_serialization_omits_credential() {
    let user = User {
        id: UserId::new(4),
        email: "a@b.com".to_string(),
        role: Role::Admin,
        first_name: "A".to_string(),
        last_name: "B".to_string(),
        gender: Gender::Unspecified,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        version: 1,
    };
    let json = serde_json::to_value(&user).unwrap();

    assert_eq!(json["userID"], 4);
    assert_eq!(json["firstName"], "A");
    assert_eq!(json["role"], "admin");
    assert!(json.get("credential").is_none());
    assert!(json.get("password").is_none());
}

#[tokio::test]
async fn test_update_profile_writes_notification() {
    let (store, users, auth) = setup();
    let user = register(&auth, "a@b.com").await;

    let updated = users
        .update_profile(user.id, profile("Grace@Example.com"))
        .await
        .unwrap();

    assert_eq!(updated.email, "grace@example.com");
    assert_eq!(updated.first_name, "Grace");
    assert_eq!(updated.gender, Gender::Female);
    assert_eq!(updated.version, 2);

    let notices = ResourceStore::<Notification>::list(store.as_ref(), Scope::Owner(user.id))
        .await
        .unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, PROFILE_UPDATED);
}

#[tokio::test]
async fn test_update_profile_duplicate_email_is_conflict() {
    let (store, users, auth) = setup();
    register(&auth, "taken@b.com").await;
    let user = register(&auth, "a@b.com").await;

    let err = users
        .update_profile(user.id, profile("TAKEN@b.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Nothing was written.
    let notices = ResourceStore::<Notification>::list(store.as_ref(), Scope::All)
        .await
        .unwrap();
    assert!(notices.is_empty());
}

#[tokio::test]
async fn test_admin_update_requires_matching_id() {
    let (_, users, auth) = setup();
    let user = register(&auth, "a@b.com").await;

    let err = users
        .update(
            user.id,
            AdminUserUpdate {
                id: Some(UserId::new(user.id.get() + 1)),
                profile: profile("a@b.com"),
                role: None,
                password: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_admin_update_role_and_password() {
    let (_, users, auth) = setup();
    let user = register(&auth, "a@b.com").await;

    let updated = users
        .update(
            user.id,
            AdminUserUpdate {
                id: Some(user.id),
                profile: profile("a@b.com"),
                role: Some(Role::Admin),
                password: Some("Br4nd!New".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.role, Role::Admin);
    assert!(auth.login("a@b.com", "Br4nd!New").await.is_ok());
    assert!(auth.login("a@b.com", "Str0ng!Pass").await.is_err());
}

#[tokio::test]
async fn test_admin_update_empty_password_rejected_before_write() {
    let (_, users, auth) = setup();
    let user = register(&auth, "a@b.com").await;

    let err = users
        .update(
            user.id,
            AdminUserUpdate {
                id: Some(user.id),
                profile: profile("changed@b.com"),
                role: None,
                password: Some(String::new()),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(users.get(user.id).await.unwrap().email, "a@b.com");
}

#[tokio::test]
async fn test_delete_cascades_and_missing_is_not_found() {
    let (store, users, auth) = setup();
    let user = register(&auth, "a@b.com").await;
    ResourceStore::<Budget>::insert(
        store.as_ref(),
        user.id,
        BudgetDraft {
            category: "Food".to_string(),
            amount: Amount::from_cents(500).unwrap(),
            month_year: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        },
        Utc::now(),
    )
    .await
    .unwrap();

    users.delete(user.id).await.unwrap();

    assert!(matches!(users.get(user.id).await, Err(AppError::NotFound(_))));
    assert!(
        ResourceStore::<Budget>::list(store.as_ref(), Scope::All)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(matches!(users.delete(user.id).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_admin_create_and_list() {
    let (_, users, _) = setup();
    users
        .create(
            Registration {
                email: "ops@b.com".to_string(),
                role: Role::Admin,
                ..Registration::default()
            },
            "Str0ng!Pass",
        )
        .await
        .unwrap();

    let all = users.list().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].role, Role::Admin);
}

#[tokio::test]
async fn test_admin_update_with_failed_password_write_changes_nothing() {
    let (store, _, auth) = setup();
    let user = register(&auth, "a@b.com").await;
    let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap()));
    let users = UserService::new(Arc::new(CredentialWriteFails(store.clone())), clock);

    let err = users
        .update(
            user.id,
            AdminUserUpdate {
                id: Some(user.id),
                profile: profile("new@y.com"),
                role: Some(Role::Admin),
                password: Some("pw2".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Database(_)));

    let unchanged = users.get(user.id).await.unwrap();
    assert_eq!(unchanged.email, "a@b.com");
    assert_eq!(unchanged.role, Role::User);
    assert_eq!(unchanged.version, 1);
    assert!(auth.login("a@b.com", "Str0ng!Pass").await.is_ok());
    let notices = ResourceStore::<Notification>::list(store.as_ref(), Scope::All)
        .await
        .unwrap();
    assert!(notices.is_empty());
}
