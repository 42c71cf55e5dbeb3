//! # 通知ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/v1/notifications` - 自分の通知一覧（新しい順、最大 50 件）
//! - `POST /api/v1/notifications/{notification_id}/read` - 既読にする
//! - `DELETE /api/v1/notifications/{notification_id}` - 削除

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use saferoute_domain::notification::{Notification, NotificationId};
use saferoute_shared::ApiResponse;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::ApiError,
    extract::{ApiPath, Authenticated},
    handler::DeletedDto,
    usecase::NotificationUseCaseImpl,
};

/// 通知 API の共有状態
pub struct NotificationState {
    pub usecase: NotificationUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 通知 DTO
#[derive(Debug, Serialize)]
pub struct NotificationDto {
    pub notification_id:   Uuid,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title:             String,
    pub message:           String,
    pub is_read:           bool,
    pub read_at:           Option<String>,
    pub created_at:        String,
}

impl From<&Notification> for NotificationDto {
    fn from(notification: &Notification) -> Self {
        Self {
            notification_id:   *notification.id().as_uuid(),
            notification_type: notification.notification_type().to_string(),
            title:             notification.title().to_string(),
            message:           notification.message().to_string(),
            is_read:           notification.is_read(),
            read_at:           notification.read_at().map(|t| t.to_rfc3339()),
            created_at:        notification.created_at().to_rfc3339(),
        }
    }
}

// --- ハンドラ ---

/// GET /api/v1/notifications
#[tracing::instrument(skip_all)]
pub async fn list_notifications(
    State(state): State<Arc<NotificationState>>,
    Authenticated(caller): Authenticated,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = state.usecase.list_notifications(&caller).await?;

    let items: Vec<NotificationDto> = notifications.iter().map(NotificationDto::from).collect();

    let response = ApiResponse::new(items);
    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/v1/notifications/{notification_id}/read
///
/// 冪等。他人の通知は `not_found`。
#[tracing::instrument(skip_all, fields(%notification_id))]
pub async fn mark_notification_read(
    State(state): State<Arc<NotificationState>>,
    Authenticated(caller): Authenticated,
    ApiPath(notification_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = state
        .usecase
        .mark_read(&caller, &NotificationId::from_uuid(notification_id))
        .await?;

    let response = ApiResponse::new(NotificationDto::from(&notification));
    Ok((StatusCode::OK, Json(response)))
}

/// DELETE /api/v1/notifications/{notification_id}
#[tracing::instrument(skip_all, fields(%notification_id))]
pub async fn delete_notification(
    State(state): State<Arc<NotificationState>>,
    Authenticated(caller): Authenticated,
    ApiPath(notification_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .usecase
        .delete_notification(&caller, &NotificationId::from_uuid(notification_id))
        .await?;

    let response = ApiResponse::new(DeletedDto { deleted: true });
    Ok((StatusCode::OK, Json(response)))
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension,
        Router,
        body::Body,
        http::{Method, Request},
        routing::{get, post},
    };
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use saferoute_domain::{
        clock::FixedClock,
        notification::NotificationType,
        role::{AuthContext, Role},
        user::UserId,
    };
    use saferoute_infra::mock::MockNotificationRepository;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn create_test_app(repo: MockNotificationRepository, owner: &UserId) -> Router {
        let usecase = NotificationUseCaseImpl::new(
            Arc::new(repo),
            Arc::new(FixedClock::new(fixed_now())),
        );
        Router::new()
            .route("/notifications", get(list_notifications))
            .route(
                "/notifications/{notification_id}",
                axum::routing::delete(delete_notification),
            )
            .route(
                "/notifications/{notification_id}/read",
                post(mark_notification_read),
            )
            .with_state(Arc::new(NotificationState { usecase }))
            .layer(Extension(AuthContext::new(owner.clone(), Role::User)))
    }

    async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_既読化のレスポンス形状() {
        let owner = UserId::new();
        let repo = MockNotificationRepository::new();
        let notification = Notification::new(
            NotificationId::new(),
            owner.clone(),
            NotificationType::ReportVerified,
            "Report verified",
            "Your report has been verified",
            fixed_now(),
        );
        let id = notification.id().clone();
        repo.add_notification(notification);
        let app = create_test_app(repo, &owner);

        let (status, body) = send(&app, Method::POST, &format!("/notifications/{id}/read")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["type"], "REPORT_VERIFIED");
        assert_eq!(body["data"]["is_read"], true);
        assert_eq!(body["data"]["read_at"], fixed_now().to_rfc3339());
    }

    #[tokio::test]
    async fn test_存在しない通知は404() {
        let owner = UserId::new();
        let app = create_test_app(MockNotificationRepository::new(), &owner);
        let id = Uuid::new_v4();

        let (read, _) = send(&app, Method::POST, &format!("/notifications/{id}/read")).await;
        let (delete, _) = send(&app, Method::DELETE, &format!("/notifications/{id}")).await;
        let (list, body) = send(&app, Method::GET, "/notifications").await;

        assert_eq!(read, StatusCode::NOT_FOUND);
        assert_eq!(delete, StatusCode::NOT_FOUND);
        assert_eq!(list, StatusCode::OK);
        assert!(body["data"].as_array().unwrap().is_empty());
    }
}
