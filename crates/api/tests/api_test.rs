//! Router tests against the in-memory store.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use pennywise_api::{AppState, create_router};
use pennywise_core::SystemClock;
use pennywise_core::auth::AuthService;
use pennywise_core::memory::MemoryStore;
use pennywise_core::user::Registration;
use pennywise_shared::JwtService;
use pennywise_shared::auth::Role;
use pennywise_shared::config::{CorsConfig, JwtConfig, ServerConfig};

const SECRET: &str = "test-secret-key-for-testing-0123456789";
const PASSWORD: &str = "Str0ng!Pass";

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    bytes: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        if self.bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&self.bytes).unwrap()
        }
    }

    fn text(&self) -> String {
        String::from_utf8(self.bytes.clone()).unwrap()
    }
}

fn app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let jwt = JwtService::new(JwtConfig {
        secret: SECRET.to_string(),
        ..JwtConfig::default()
    })
    .unwrap();
    let state = AppState {
        users: store.clone(),
        budgets: store.clone(),
        expenses: store.clone(),
        notifications: store.clone(),
        jwt_service: Arc::new(jwt),
        clock: Arc::new(SystemClock),
    };
    TestApp {
        router: create_router(state, &ServerConfig::default(), &CorsConfig::default()),
        store,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        Reply {
            status,
            headers,
            bytes,
        }
    }

    async fn login(&self, email: &str, password: &str) -> Reply {
        self.send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Registers and logs in; returns the user id and a token.
    async fn sign_up(&self, email: &str) -> (i64, String) {
        let reply = self
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        let id = reply.json()["userID"].as_i64().unwrap();
        let token = self.login(email, PASSWORD).await.json()["token"]
            .as_str()
            .unwrap()
            .to_string();
        (id, token)
    }

    async fn admin(&self) -> (i64, String) {
        let auth = AuthService::new(self.store.clone(), Arc::new(SystemClock));
        auth.register(
            Registration {
                email: "admin@pennywise.local".to_string(),
                role: Role::Admin,
                ..Registration::default()
            },
            PASSWORD,
        )
        .await
        .unwrap();
        let reply = self.login("admin@pennywise.local", PASSWORD).await;
        let body = reply.json();
        (
            body["user"]["userID"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    async fn create_budget(&self, token: &str) -> Value {
        let reply = self
            .send(
                Method::POST,
                "/budgets",
                Some(token),
                Some(json!({ "category": "Food", "amount": "100.00", "monthYear": "2024-01-01" })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED);
        reply.json()
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let app = app();
    let reply = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["status"], "healthy");
}

#[tokio::test]
async fn test_register_login_create_and_hide_from_other_user() {
    let app = app();
    let (alice, alice_token) = app.sign_up("a@b.com").await;
    let (_, bob_token) = app.sign_up("bob@b.com").await;

    let reply = app
        .send(
            Method::POST,
            "/budgets",
            Some(&alice_token),
            Some(json!({ "category": "Food", "amount": 100.00, "monthYear": "2024-01-01" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    let budget = reply.json();
    assert_eq!(budget["userID"].as_i64(), Some(alice));
    assert_eq!(budget["amount"], "100.00");
    let id = budget["budgetID"].as_i64().unwrap();
    assert_eq!(
        reply.headers.get(header::LOCATION).unwrap(),
        format!("/budgets/{id}").as_str()
    );

    let own = app.send(Method::GET, &format!("/budgets/{id}"), Some(&alice_token), None).await;
    assert_eq!(own.status, StatusCode::OK);

    let other = app.send(Method::GET, &format!("/budgets/{id}"), Some(&bob_token), None).await;
    assert_eq!(other.status, StatusCode::NOT_FOUND);
    assert_eq!(other.json()["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_body_owner_is_ignored_on_create() {
    let app = app();
    let (alice, alice_token) = app.sign_up("a@b.com").await;
    let (bob, _) = app.sign_up("bob@b.com").await;

    let reply = app
        .send(
            Method::POST,
            "/notifications",
            Some(&alice_token),
            Some(json!({ "userID": bob, "message": "hello" })),
        )
        .await;

    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.json()["userID"].as_i64(), Some(alice));
    assert_eq!(reply.json()["isRead"], false);
}

#[tokio::test]
async fn test_update_id_mismatch_is_rejected() {
    let app = app();
    let (_, token) = app.sign_up("a@b.com").await;

    let reply = app
        .send(
            Method::PUT,
            "/budgets/5",
            Some(&token),
            Some(json!({ "budgetID": 6, "category": "Food", "amount": "1.00", "monthYear": "2024-01-01" })),
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_update_bumps_version_and_stale_update_conflicts() {
    let app = app();
    let (_, token) = app.sign_up("a@b.com").await;
    let budget = app.create_budget(&token).await;
    let id = budget["budgetID"].as_i64().unwrap();
    let body = json!({
        "budgetID": id,
        "category": "Groceries",
        "amount": "250.5",
        "monthYear": "2024-02-17",
        "version": 1
    });

    let first = app
        .send(Method::PUT, &format!("/budgets/{id}"), Some(&token), Some(body.clone()))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    let updated = first.json();
    assert_eq!(updated["version"], 2);
    assert_eq!(updated["amount"], "250.50");
    assert_eq!(updated["monthYear"], "2024-02-01");

    let stale = app
        .send(Method::PUT, &format!("/budgets/{id}"), Some(&token), Some(body))
        .await;
    assert_eq!(stale.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_missing_rows_are_not_found() {
    let app = app();
    let (_, token) = app.sign_up("a@b.com").await;
    let body = json!({ "expenseID": 42, "category": "Food", "amount": "1.00", "date": "2024-01-02" });

    let get = app.send(Method::GET, "/expenses/42", Some(&token), None).await;
    let put = app.send(Method::PUT, "/expenses/42", Some(&token), Some(body)).await;
    let delete = app.send(Method::DELETE, "/expenses/42", Some(&token), None).await;

    assert_eq!(get.status, StatusCode::NOT_FOUND);
    assert_eq!(put.status, StatusCode::NOT_FOUND);
    assert_eq!(delete.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_and_out_of_range_ids_use_error_body() {
    let app = app();
    let (_, token) = app.sign_up("a@b.com").await;
    let (_, admin) = app.admin().await;

    for uri in ["/budgets/3000000000", "/admin/users/3000000000", "/csv/download/3000000000"] {
        let reply = app.send(Method::GET, uri, Some(&admin), None).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(reply.json()["error"], "NOT_FOUND", "{uri}");
    }

    let delete = app.send(Method::DELETE, "/budgets/-3000000000", Some(&token), None).await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);

    for uri in ["/budgets/abc", "/expenses/1.5"] {
        let reply = app.send(Method::GET, uri, Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(reply.json()["error"], "VALIDATION_ERROR", "{uri}");
        assert!(reply.json()["message"].as_str().unwrap().contains(uri.rsplit('/').next().unwrap()));
    }
}

#[tokio::test]
async fn test_invalid_payloads_are_rejected() {
    let app = app();
    let (_, token) = app.sign_up("a@b.com").await;

    for body in [
        json!({ "category": "Food", "amount": "-1.00", "monthYear": "2024-01-01" }),
        json!({ "category": "  ", "amount": "1.00", "monthYear": "2024-01-01" }),
        json!({ "category": "Food", "amount": "1.001", "monthYear": "2024-01-01" }),
        json!({ "category": "Food", "monthYear": "2024-01-01" }),
        json!({ "category": "Food", "amount": "1.00" }),
    ] {
        let reply = app.send(Method::POST, "/budgets", Some(&token), Some(body)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_budget_delete_is_restricted_by_expense() {
    let app = app();
    let (_, token) = app.sign_up("a@b.com").await;
    let budget_id = app.create_budget(&token).await["budgetID"].as_i64().unwrap();

    let expense = app
        .send(
            Method::POST,
            "/expenses",
            Some(&token),
            Some(json!({
                "budgetID": budget_id,
                "category": "Food",
                "amount": "12.5",
                "date": "2024-01-09",
                "description": "Lunch"
            })),
        )
        .await;
    assert_eq!(expense.status, StatusCode::CREATED);
    let expense_id = expense.json()["expenseID"].as_i64().unwrap();

    let blocked = app
        .send(Method::DELETE, &format!("/budgets/{budget_id}"), Some(&token), None)
        .await;
    assert_eq!(blocked.status, StatusCode::CONFLICT);

    let removed = app
        .send(Method::DELETE, &format!("/expenses/{expense_id}"), Some(&token), None)
        .await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);
    let removed = app
        .send(Method::DELETE, &format!("/budgets/{budget_id}"), Some(&token), None)
        .await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_expense_cannot_use_another_users_budget() {
    let app = app();
    let (_, alice_token) = app.sign_up("a@b.com").await;
    let (_, bob_token) = app.sign_up("bob@b.com").await;
    let budget_id = app.create_budget(&alice_token).await["budgetID"].as_i64().unwrap();

    let reply = app
        .send(
            Method::POST,
            "/expenses",
            Some(&bob_token),
            Some(json!({ "budgetID": budget_id, "category": "Food", "amount": "1.00", "date": "2024-01-02" })),
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_token_errors() {
    let app = app();

    let missing = app.send(Method::GET, "/budgets", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.json()["error"], "missing_token");

    let garbage = app.send(Method::GET, "/budgets", Some("not-a-token"), None).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.json()["error"], "invalid_token");
}

#[tokio::test]
async fn test_register_rejections_and_login_failures() {
    let app = app();
    app.sign_up("a@b.com").await;

    let duplicate = app
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "email": "A@B.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let empty = app
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "email": "new@b.com", "password": "" })),
        )
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let wrong = app.login("a@b.com", "nope").await;
    let unknown = app.login("ghost@b.com", PASSWORD).await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.json(), unknown.json());
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = app();
    let (_, token) = app.sign_up("a@b.com").await;

    for uri in ["/admin/budgets", "/admin/users", "/admin/notifications"] {
        let reply = app.send(Method::GET, uri, Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn test_admin_sees_and_creates_for_any_user() {
    let app = app();
    let (alice, alice_token) = app.sign_up("a@b.com").await;
    let (_, admin_token) = app.admin().await;
    app.create_budget(&alice_token).await;

    let all = app.send(Method::GET, "/admin/budgets", Some(&admin_token), None).await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.json().as_array().unwrap().len(), 1);

    // The regular route lists only the admin's own rows.
    let own = app.send(Method::GET, "/budgets", Some(&admin_token), None).await;
    assert!(own.json().as_array().unwrap().is_empty());

    let created = app
        .send(
            Method::POST,
            "/admin/notifications",
            Some(&admin_token),
            Some(json!({ "userID": alice, "message": "Welcome" })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json()["userID"].as_i64(), Some(alice));

    let dangling = app
        .send(
            Method::POST,
            "/admin/notifications",
            Some(&admin_token),
            Some(json!({ "userID": 9999, "message": "Nobody" })),
        )
        .await;
    assert_eq!(dangling.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_user_update_and_cascading_delete() {
    let app = app();
    let (alice, alice_token) = app.sign_up("a@b.com").await;
    let (_, admin_token) = app.admin().await;
    app.create_budget(&alice_token).await;

    let mismatch = app
        .send(
            Method::PUT,
            &format!("/admin/users/{alice}"),
            Some(&admin_token),
            Some(json!({ "userID": alice + 1, "email": "a@b.com" })),
        )
        .await;
    assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);

    let updated = app
        .send(
            Method::PUT,
            &format!("/admin/users/{alice}"),
            Some(&admin_token),
            Some(json!({
                "userID": alice,
                "email": "a@b.com",
                "firstName": "Alice",
                "role": "admin",
                "password": "N3w!Password"
            })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json()["role"], "admin");
    assert_eq!(app.login("a@b.com", "N3w!Password").await.status, StatusCode::OK);
    assert_eq!(app.login("a@b.com", PASSWORD).await.status, StatusCode::UNAUTHORIZED);

    let deleted = app
        .send(Method::DELETE, &format!("/admin/users/{alice}"), Some(&admin_token), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let budgets = app.send(Method::GET, "/admin/budgets", Some(&admin_token), None).await;
    assert!(budgets.json().as_array().unwrap().is_empty());
    let gone = app
        .send(Method::GET, &format!("/admin/users/{alice}"), Some(&admin_token), None)
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_creates_user_with_hashed_password() {
    let app = app();
    let (_, admin_token) = app.admin().await;

    let created = app
        .send(
            Method::POST,
            "/admin/users",
            Some(&admin_token),
            Some(json!({ "email": "New@B.com", "password": PASSWORD, "gender": "other" })),
        )
        .await;

    assert_eq!(created.status, StatusCode::CREATED);
    let body = created.json();
    assert_eq!(body["email"], "new@b.com");
    assert!(body.get("passwordHash").is_none());
    assert_eq!(app.login("new@b.com", PASSWORD).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_profile_update_writes_notification() {
    let app = app();
    let (alice, token) = app.sign_up("a@b.com").await;
    app.sign_up("taken@b.com").await;

    let updated = app
        .send(
            Method::PUT,
            "/user/profile",
            Some(&token),
            Some(json!({ "email": "a@b.com", "firstName": "Alice", "gender": "female" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json()["firstName"], "Alice");

    let profile = app.send(Method::GET, "/user/profile", Some(&token), None).await;
    assert_eq!(profile.json()["userID"].as_i64(), Some(alice));
    assert_eq!(profile.json()["gender"], "female");

    let taken = app
        .send(
            Method::PUT,
            "/user/profile",
            Some(&token),
            Some(json!({ "email": "taken@b.com" })),
        )
        .await;
    assert_eq!(taken.status, StatusCode::CONFLICT);

    let notices = app.send(Method::GET, "/notifications", Some(&token), None).await.json();
    let notices = notices.as_array().unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0]["message"], "Your profile was updated");
}

#[tokio::test]
async fn test_change_password() {
    let app = app();
    let (_, token) = app.sign_up("a@b.com").await;

    let wrong = app
        .send(
            Method::PUT,
            "/user/profile/change-password",
            Some(&token),
            Some(json!({ "currentPassword": "nope", "newPassword": "N3w!Password" })),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let changed = app
        .send(
            Method::PUT,
            "/user/profile/change-password",
            Some(&token),
            Some(json!({ "currentPassword": PASSWORD, "newPassword": "N3w!Password" })),
        )
        .await;
    assert_eq!(changed.status, StatusCode::NO_CONTENT);
    assert_eq!(app.login("a@b.com", "N3w!Password").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_csv_download_access() {
    let app = app();
    let (alice, alice_token) = app.sign_up("a@b.com").await;
    let (_, bob_token) = app.sign_up("bob@b.com").await;
    let (_, admin_token) = app.admin().await;
    app.create_budget(&alice_token).await;

    let own = app.send(Method::GET, "/csv/download", Some(&alice_token), None).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(
        own.headers.get(header::CONTENT_TYPE).unwrap(),
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        own.headers.get(header::CONTENT_DISPOSITION).unwrap(),
        format!("attachment; filename=\"pennywise-user-{alice}.csv\"").as_str()
    );
    let text = own.text();
    assert!(text.starts_with("User Information\n"));
    assert!(text.contains("\nBudgets\n"));
    assert!(text.contains("Food,100.00,2024-01"));

    let forbidden = app
        .send(Method::GET, &format!("/csv/download/{alice}"), Some(&bob_token), None)
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let admin = app
        .send(Method::GET, &format!("/csv/download/{alice}"), Some(&admin_token), None)
        .await;
    assert_eq!(admin.status, StatusCode::OK);

    let unknown = app
        .send(Method::GET, "/csv/download/9999", Some(&admin_token), None)
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}
