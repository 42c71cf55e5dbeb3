//! SafeRoute API シナリオテスト
//!
//! `build_app` が組み立てる本番と同じルーター（認証ガード・タイムアウト込み）に
//! インメモリのリポジトリを注入し、複数のエンドポイントを横断して検証する。
//!
//! ## テストケース
//!
//! - 登録 → ログイン → 誤ったパスワードで `invalid_credentials`
//! - 認証ヘッダーの欠落・不正で 401
//! - 施設の作成 → 郡で絞り込み → 無効化 → 一覧から消える
//! - 存在しないレポートへの投票は 404 でカウンタは変化しない
//! - レポート審査 → 投稿者に通知 → 既読化は冪等
//! - 座標の往復

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use pretty_assertions::assert_eq;
use rstest::rstest;
use saferoute_api::app_builder::{AppDependencies, build_app};
use saferoute_domain::{
    clock::FixedClock,
    role::Role,
    user::{NewUser, User, UserId, Username},
};
use saferoute_infra::{
    JwtTokenService,
    TokenService,
    mock::{
        MockCommentRepository,
        MockFacilityRepository,
        MockNotificationRepository,
        MockPasswordHasher,
        MockReportRepository,
        MockUserRepository,
    },
};
use serde_json::{Value, json};
use tower::ServiceExt;

// --- テストヘルパー ---

struct TestApp {
    router: Router,
    users:  MockUserRepository,
    tokens: Arc<JwtTokenService>,
}

impl TestApp {
    fn new() -> Self {
        let users = MockUserRepository::new();
        let reports = MockReportRepository::new();
        // トークンの期限は実時刻で検証されるため、時刻も実時刻から取る
        let tokens = Arc::new(JwtTokenService::new("scenario-secret", chrono::Duration::days(30)));

        let router = build_app(AppDependencies {
            user_repository:         Arc::new(users.clone()),
            report_repository:       Arc::new(reports.clone()),
            comment_repository:      Arc::new(MockCommentRepository::new(reports)),
            facility_repository:     Arc::new(MockFacilityRepository::new()),
            notification_repository: Arc::new(MockNotificationRepository::new()),
            password_hasher:         Arc::new(MockPasswordHasher),
            password_checker:        Arc::new(MockPasswordHasher),
            token_service:           tokens.clone(),
            clock:                   Arc::new(FixedClock::new(Utc::now())),
            request_timeout:         Duration::from_secs(5),
        });

        Self {
            router,
            users,
            tokens,
        }
    }

    /// 管理者を直接作成し、そのトークンを返す
    fn admin_token(&self) -> String {
        let admin = User::new(
            NewUser {
                id:            UserId::new(),
                username:      Username::new("root-admin").unwrap(),
                email:         None,
                phone:         None,
                password_hash: None,
            },
            Utc::now(),
        )
        .promote(Utc::now())
        .unwrap();
        let token = self
            .tokens
            .issue(admin.id(), Role::Admin, Utc::now())
            .unwrap();
        self.users.add_user(admin);
        token
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// ユーザーを登録し、`(user_id, token)` を返す
    async fn register(&self, username: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        (
            body["data"]["user"]["user_id"].as_str().unwrap().to_string(),
            body["data"]["token"].as_str().unwrap().to_string(),
        )
    }
}

// --- テストケース ---

#[tokio::test]
async fn test_ヘルスチェックとサービス情報() {
    let app = TestApp::new();

    let (health, health_body) = app.send(Method::GET, "/health", None, None).await;
    let (info, info_body) = app.send(Method::GET, "/api/info", None, None).await;

    assert_eq!(health, StatusCode::OK);
    assert_eq!(health_body, json!({ "status": "ok" }));
    assert_eq!(info, StatusCode::OK);
    assert_eq!(info_body["name"], "SafeRoute API");
}

#[tokio::test]
async fn test_登録してログインできる() {
    let app = TestApp::new();
    let (user_id, _) = app.register("alice", "secret1").await;

    let (wrong, wrong_body) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong" })),
        )
        .await;
    let (ok, ok_body) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "secret1" })),
        )
        .await;

    assert_eq!(wrong, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body["error"], "invalid_credentials");
    assert_eq!(ok, StatusCode::OK);
    let token = ok_body["data"]["token"].as_str().unwrap();
    let context = app.tokens.verify(token).unwrap();
    assert_eq!(context.subject().to_string(), user_id);
    assert_eq!(context.role(), Role::User);
}

#[tokio::test]
async fn test_短いユーザー名は登録されない() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "username": "ab", "password": "secret1" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(app.users.is_empty());
}

#[tokio::test]
async fn test_認証ヘッダーの欠落と不正() {
    let app = TestApp::new();

    let (missing, missing_body) = app.send(Method::GET, "/api/v1/notifications", None, None).await;
    let (invalid, invalid_body) = app
        .send(Method::GET, "/api/v1/notifications", Some("garbage"), None)
        .await;
    let (optional_invalid, _) = app
        .send(
            Method::POST,
            "/api/v1/reports",
            Some("garbage"),
            Some(json!({ "title": "Flooded road", "report_type": "flooding" })),
        )
        .await;
    let (public, _) = app.send(Method::GET, "/api/v1/reports", None, None).await;

    assert_eq!(missing, StatusCode::UNAUTHORIZED);
    assert_eq!(missing_body["error"], "unauthorized");
    assert_eq!(invalid, StatusCode::UNAUTHORIZED);
    assert_eq!(invalid_body["error"], "invalid_token");
    assert_eq!(optional_invalid, StatusCode::UNAUTHORIZED);
    assert_eq!(public, StatusCode::OK);
}

#[tokio::test]
async fn test_施設の作成から無効化まで() {
    let app = TestApp::new();
    let admin = app.admin_token();

    let (created, body) = app
        .send(
            Method::POST,
            "/api/v1/facilities",
            Some(&admin),
            Some(json!({ "name": "City Clinic", "facility_type": "HEALTH_CENTER", "county": "Nairobi" })),
        )
        .await;
    assert_eq!(created, StatusCode::OK);
    let id = body["data"]["facility_id"].as_str().unwrap().to_string();

    let (_, listed) = app
        .send(Method::GET, "/api/v1/facilities?county=Nairobi", None, None)
        .await;
    assert!(
        listed["data"]
            .as_array()
            .unwrap()
            .iter()
            .any(|f| f["facility_id"] == id.as_str())
    );

    let (deleted, _) = app
        .send(Method::DELETE, &format!("/api/v1/facilities/{id}"), Some(&admin), None)
        .await;
    let (_, after) = app
        .send(Method::GET, "/api/v1/facilities?county=Nairobi", None, None)
        .await;
    let (fetched, fetched_body) = app
        .send(Method::GET, &format!("/api/v1/facilities/{id}"), None, None)
        .await;

    assert_eq!(deleted, StatusCode::OK);
    assert!(after["data"].as_array().unwrap().is_empty());
    assert_eq!(fetched, StatusCode::OK);
    assert_eq!(fetched_body["data"]["is_active"], false);
}

#[tokio::test]
async fn test_一般ユーザーの施設作成は403() {
    let app = TestApp::new();
    let (_, token) = app.register("alice", "secret1").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/facilities",
            Some(&token),
            Some(json!({ "name": "City Clinic", "facility_type": "HEALTH_CENTER", "county": "Nairobi" })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_存在しないレポートへの投票はカウンタを変えない() {
    let app = TestApp::new();
    let (_, report) = app
        .send(
            Method::POST,
            "/api/v1/reports",
            None,
            Some(json!({ "title": "Broken light", "report_type": "road_hazard" })),
        )
        .await;
    let report_id = report["data"]["report_id"].as_str().unwrap().to_string();
    let missing = uuid::Uuid::new_v4();

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/v1/reports/{missing}/vote"),
            None,
            Some(json!({ "vote_type": "UPVOTE" })),
        )
        .await;
    let (_, existing) = app
        .send(Method::GET, &format!("/api/v1/reports/{report_id}"), None, None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(existing["data"]["upvotes"], 0);
    assert_eq!(existing["data"]["downvotes"], 0);
}

#[tokio::test]
async fn test_座標は往復で保たれる() {
    let app = TestApp::new();

    let (_, created) = app
        .send(
            Method::POST,
            "/api/v1/reports",
            None,
            Some(json!({
                "title": "Flooded road",
                "report_type": "flooding",
                "severity": "HIGH",
                "lat": -1.2921,
                "lng": 36.8219,
                "county": "Nairobi"
            })),
        )
        .await;
    let id = created["data"]["report_id"].as_str().unwrap();
    let (_, fetched) = app
        .send(Method::GET, &format!("/api/v1/reports/{id}"), None, None)
        .await;

    assert_eq!(fetched["data"]["lat"], -1.2921);
    assert_eq!(fetched["data"]["lng"], 36.8219);
    assert_eq!(fetched["data"]["severity"], "HIGH");
    assert_eq!(fetched["data"]["county"], "Nairobi");
}

#[tokio::test]
async fn test_審査結果が投稿者に通知され既読化は冪等() {
    let app = TestApp::new();
    let admin = app.admin_token();
    let (user_id, token) = app.register("alice", "secret1").await;

    let (_, report) = app
        .send(
            Method::POST,
            "/api/v1/reports",
            Some(&token),
            Some(json!({ "title": "Flooded road", "report_type": "flooding" })),
        )
        .await;
    assert_eq!(report["data"]["reporter_id"], user_id.as_str());
    let report_id = report["data"]["report_id"].as_str().unwrap().to_string();

    let (_, pending) = app.send(Method::GET, "/api/v1/admin/pending", Some(&admin), None).await;
    assert_eq!(pending["data"].as_array().unwrap().len(), 1);

    let (verified, _) = app
        .send(
            Method::POST,
            &format!("/api/v1/admin/{report_id}/verify"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(verified, StatusCode::OK);

    let (_, notifications) = app
        .send(Method::GET, "/api/v1/notifications", Some(&token), None)
        .await;
    let items = notifications["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["type"], "REPORT_VERIFIED");
    let notification_id = items[0]["notification_id"].as_str().unwrap().to_string();

    let uri = format!("/api/v1/notifications/{notification_id}/read");
    let (_, first) = app.send(Method::POST, &uri, Some(&token), None).await;
    let (_, second) = app.send(Method::POST, &uri, Some(&token), None).await;

    assert_eq!(first["data"]["is_read"], true);
    assert_eq!(first["data"]["read_at"], second["data"]["read_at"]);

    let (_, stats) = app.send(Method::GET, "/api/v1/admin/stats", Some(&admin), None).await;
    assert_eq!(stats["data"], json!({ "verified": 1, "pending": 0, "rejected": 0 }));

    let (_, profile) = app
        .send(Method::GET, &format!("/api/v1/users/{user_id}"), Some(&token), None)
        .await;
    assert_eq!(profile["data"]["reports_count"], 1);
}

#[tokio::test]
async fn test_利用停止中のユーザーは書き込めない() {
    let app = TestApp::new();
    let suspended = app
        .tokens
        .issue(&UserId::new(), Role::Suspended, Utc::now())
        .unwrap();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/reports",
            Some(&suspended),
            Some(json!({ "title": "Flooded road", "report_type": "flooding" })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_管理者は自分を利用停止にできない() {
    let app = TestApp::new();
    let admin = app.admin_token();
    let subject = app.tokens.verify(&admin).unwrap().subject().clone();

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/v1/users/{subject}/suspend"),
            Some(&admin),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_transition");
}

#[rstest]
#[case::却下の理由なし(Method::POST, "/api/v1/admin/0190a5e2-7c1d-7000-8000-000000000001/reject", Some(json!({})))]
#[case::審査の不正なid(Method::POST, "/api/v1/admin/not-a-uuid/verify", None)]
#[case::施設作成の空ボディ(Method::POST, "/api/v1/facilities", Some(json!({})))]
#[case::施設更新の不正なid(Method::PUT, "/api/v1/facilities/not-a-uuid", Some(json!({})))]
#[case::施設削除の不正なid(Method::DELETE, "/api/v1/facilities/not-a-uuid", None)]
#[case::昇格の不正なid(Method::POST, "/api/v1/users/not-a-uuid/promote", None)]
#[tokio::test]
async fn test_管理者ルートは入力が不正でも一般ユーザーに403を返す(
    #[case] method: Method,
    #[case] uri: &str,
    #[case] body: Option<Value>,
) {
    let app = TestApp::new();
    let (_, token) = app.register("alice", "secret1").await;

    let (status, response) = app.send(method, uri, Some(&token), body).await;

    assert_eq!(status, StatusCode::FORBIDDEN, "{uri}: {response}");
    assert_eq!(response["error"], "forbidden");
}

#[rstest]
#[case::レポート作成(Method::POST, "/api/v1/reports", Some(json!({})))]
#[case::コメント(Method::POST, "/api/v1/reports/not-a-uuid/comments", Some(json!({})))]
#[case::投票(Method::POST, "/api/v1/reports/not-a-uuid/vote", Some(json!({ "vote_type": "SIDEWAYS" })))]
#[case::通報(Method::POST, "/api/v1/reports/not-a-uuid/flag", None)]
#[tokio::test]
async fn test_利用停止中のユーザーは入力検証より先に403(
    #[case] method: Method,
    #[case] uri: &str,
    #[case] body: Option<Value>,
) {
    let app = TestApp::new();
    let suspended = app
        .tokens
        .issue(&UserId::new(), Role::Suspended, Utc::now())
        .unwrap();

    let (status, response) = app.send(method, uri, Some(&suspended), body).await;

    assert_eq!(status, StatusCode::FORBIDDEN, "{uri}: {response}");
}

#[tokio::test]
async fn test_匿名の施設作成は入力が不正でも401() {
    let app = TestApp::new();

    let (status, body) = app
        .send(Method::POST, "/api/v1/facilities", None, Some(json!({})))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_本人は自分のプロフィールを取得できる() {
    let app = TestApp::new();
    let (user_id, token) = app.register("alice", "secret1").await;

    let (status, body) = app
        .send(Method::GET, &format!("/api/v1/users/{user_id}"), Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], user_id);
}
