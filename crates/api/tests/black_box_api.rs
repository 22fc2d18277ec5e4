use std::sync::Arc;

use postgate_api::app::{AppServices, build_app};
use postgate_auth::Role;
use postgate_infra::config::AppConfig;
use reqwest::StatusCode;
use reqwest::header::{COOKIE, SET_COOKIE};
use serde_json::json;

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(AppConfig::default()).await
    }

    /// Same router as prod over in-memory backends, with an `root` admin.
    async fn spawn_with(config: AppConfig) -> Self {
        let services = Arc::new(AppServices::in_memory(&config));
        services
            .auth
            .register("root", "root-pw", Role::Admin)
            .await
            .expect("failed to seed admin");

        let app = build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in and return the `Cookie` header value to replay.
    async fn login(&self, username: &str, password: &str) -> String {
        let res = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "login as {username}");
        session_cookie(&res)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn session_cookie(res: &reqwest::Response) -> String {
    let set_cookie = res
        .headers()
        .get(SET_COOKIE)
        .expect("missing Set-Cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().trim().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_endpoints_require_a_session() {
    let srv = TestServer::spawn().await;

    for path in ["/whoami", "/items", "/content/user", "/content/admin"] {
        let res = srv.client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "unauthenticated");
    }

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .header(COOKIE, "session_id=not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bearer_header_is_not_a_token_source() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(srv.url("/login"))
        .json(&json!({ "username": "alice", "password": "pw" }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_sets_a_strict_http_only_cookie() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(srv.url("/login"))
        .json(&json!({ "username": "alice", "password": "pw" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let set_cookie = res.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.starts_with("session_id="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Max-Age=86400"));
    assert!(!set_cookie.contains("Secure"));

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["role"], "user");
    assert_eq!(body["token"].as_str().unwrap().len(), 43);
}

#[tokio::test]
async fn whoami_reflects_the_session() {
    let srv = TestServer::spawn().await;
    let cookie = srv.login("alice", "pw").await;

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "user");
    assert_eq!(body["permissions"], json!(["view", "create", "update"]));
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() {
    let srv = TestServer::spawn_with(AppConfig {
        auto_register: false,
        ..AppConfig::default()
    })
    .await;

    let wrong = srv
        .client
        .post(srv.url("/login"))
        .json(&json!({ "username": "root", "password": "nope" }))
        .send()
        .await
        .unwrap();
    let unknown = srv
        .client
        .post(srv.url("/login"))
        .json(&json!({ "username": "ghost", "password": "nope" }))
        .send()
        .await
        .unwrap();

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert!(wrong.headers().get(SET_COOKIE).is_none());
    let wrong: serde_json::Value = wrong.json().await.unwrap();
    let unknown: serde_json::Value = unknown.json().await.unwrap();
    assert_eq!(wrong, unknown);
    assert_eq!(wrong["error"], "invalid_credentials");
}

#[tokio::test]
async fn login_requires_both_fields() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(srv.url("/login"))
        .json(&json!({ "username": "alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn item_lifecycle_reads_its_own_writes() {
    let srv = TestServer::spawn().await;
    let cookie = srv.login("alice", "pw").await;

    let res = srv
        .client
        .post(srv.url("/items"))
        .header(COOKIE, &cookie)
        .json(&json!({ "blogname": "notes", "author": "Alice", "content": "first" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    // Warm the cache, then write through it.
    let res = srv
        .client
        .get(srv.url(&format!("/items/{id}")))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .client
        .put(srv.url(&format!("/items/{id}")))
        .header(COOKIE, &cookie)
        .json(&json!({ "blogname": "notes", "author": "Alice", "content": "second" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .client
        .get(srv.url(&format!("/items/{id}")))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["content"], "second");

    let res = srv
        .client
        .get(srv.url("/items"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    let list: serde_json::Value = res.json().await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["content"], "second");
}

#[tokio::test]
async fn missing_required_fields_are_rejected() {
    let srv = TestServer::spawn().await;
    let cookie = srv.login("alice", "pw").await;

    let res = srv
        .client
        .post(srv.url("/items"))
        .header(COOKIE, &cookie)
        .json(&json!({ "blogname": "notes" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .client
        .get(srv.url("/items/not-a-uuid"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn user_cannot_delete_but_admin_can() {
    let srv = TestServer::spawn().await;
    let alice = srv.login("alice", "pw").await;
    let root = srv.login("root", "root-pw").await;

    let res = srv
        .client
        .post(srv.url("/items"))
        .header(COOKIE, &alice)
        .json(&json!({ "blogname": "notes", "author": "Alice" }))
        .send()
        .await
        .unwrap();
    let created: serde_json::Value = res.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let res = srv
        .client
        .delete(srv.url(&format!("/items/{id}")))
        .header(COOKIE, &alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .delete(srv.url(&format!("/items/{id}")))
        .header(COOKIE, &root)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = srv
        .client
        .get(srv.url(&format!("/items/{id}")))
        .header(COOKIE, &root)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_only_see_their_own_items() {
    let srv = TestServer::spawn().await;
    let alice = srv.login("alice", "pw").await;
    let bob = srv.login("bob", "pw").await;
    let root = srv.login("root", "root-pw").await;

    let res = srv
        .client
        .post(srv.url("/items"))
        .header(COOKIE, &alice)
        .json(&json!({ "blogname": "alice's", "author": "Alice" }))
        .send()
        .await
        .unwrap();
    let created: serde_json::Value = res.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let res = srv
        .client
        .get(srv.url(&format!("/items/{id}")))
        .header(COOKIE, &bob)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .client
        .put(srv.url(&format!("/items/{id}")))
        .header(COOKIE, &bob)
        .json(&json!({ "blogname": "mine now", "author": "Bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let bobs: serde_json::Value = srv
        .client
        .get(srv.url("/items"))
        .header(COOKIE, &bob)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(bobs.as_array().unwrap().is_empty());

    let all: serde_json::Value = srv
        .client
        .get(srv.url("/items"))
        .header(COOKIE, &root)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn delete_all_is_admin_only() {
    let srv = TestServer::spawn().await;
    let alice = srv.login("alice", "pw").await;
    let root = srv.login("root", "root-pw").await;

    for name in ["a", "b"] {
        let res = srv
            .client
            .post(srv.url("/items"))
            .header(COOKIE, &alice)
            .json(&json!({ "blogname": name, "author": "Alice" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = srv
        .client
        .delete(srv.url("/items"))
        .header(COOKIE, &alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .delete(srv.url("/items"))
        .header(COOKIE, &root)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = srv
        .client
        .get(srv.url("/items"))
        .header(COOKIE, &alice)
        .send()
        .await
        .unwrap();
    let list: serde_json::Value = res.json().await.unwrap();
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn admin_content_and_registration_are_admin_only() {
    let srv = TestServer::spawn().await;
    let alice = srv.login("alice", "pw").await;
    let root = srv.login("root", "root-pw").await;

    let res = srv
        .client
        .get(srv.url("/content/admin"))
        .header(COOKIE, &alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .get(srv.url("/content/user"))
        .header(COOKIE, &alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .client
        .get(srv.url("/content/admin"))
        .header(COOKIE, &root)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["content"], "This is admin-level content");

    let res = srv
        .client
        .post(srv.url("/admin/users"))
        .header(COOKIE, &alice)
        .json(&json!({ "username": "eve", "password": "pw", "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .post(srv.url("/admin/users"))
        .header(COOKIE, &root)
        .json(&json!({ "username": "gina", "password": "pw", "role": "guest" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = srv
        .client
        .post(srv.url("/admin/users"))
        .header(COOKIE, &root)
        .json(&json!({ "username": "gina", "password": "pw", "role": "guest" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // A guest reads but cannot write.
    let gina = srv.login("gina", "pw").await;
    let res = srv
        .client
        .get(srv.url("/items"))
        .header(COOKIE, &gina)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = srv
        .client
        .post(srv.url("/items"))
        .header(COOKIE, &gina)
        .json(&json!({ "blogname": "x", "author": "y" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let srv = TestServer::spawn().await;
    let cookie = srv.login("alice", "pw").await;

    let res = srv
        .client
        .post(srv.url("/logout"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(res.headers()[SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Logging out again, or without a cookie, is fine.
    for req in [
        srv.client.post(srv.url("/logout")).header(COOKIE, &cookie),
        srv.client.post(srv.url("/logout")),
    ] {
        assert_eq!(req.send().await.unwrap().status(), StatusCode::NO_CONTENT);
    }
}
