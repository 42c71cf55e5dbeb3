//! # アプリケーション構築
//!
//! 依存（リポジトリ・トークンサービス・時刻）からユースケースと State を組み立て、
//! ルーターを構築する。`main.rs` はインフラ初期化とサーバー起動に集中し、
//! 統合テストはモック実装を渡して同じルーターを得る。
//!
//! ## ルート構成
//!
//! ```text
//! /health, /api/info            ガードなし
//! /api/v1/auth/*                ガードなし
//! /api/v1/reports/*             optional_auth（書き込みは Writer）
//! /api/v1/facilities/*          optional_auth（書き込みは Admin）
//! /api/v1/admin/*               require_auth + Admin
//! /api/v1/users/*               require_auth（管理操作は Admin）
//! /api/v1/notifications/*       require_auth
//! ```
//!
//! ロールの検証は `route_layer` でパス・ボディの抽出より前に行う。

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use saferoute_domain::clock::Clock;
use saferoute_infra::{
    PasswordChecker,
    PasswordHasher,
    TokenService,
    repository::{
        CommentRepository,
        FacilityRepository,
        NotificationRepository,
        ReportRepository,
        UserRepository,
    },
};
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        AdminState,
        AuthState,
        FacilityState,
        NotificationState,
        ReportState,
        UserState,
        create_comment,
        create_facility,
        create_report,
        dashboard,
        delete_facility,
        delete_notification,
        delete_user,
        flag_report,
        get_facility,
        get_report,
        get_user,
        health_check,
        list_comments,
        list_facilities,
        list_notifications,
        list_pending,
        list_reports,
        list_users,
        login,
        mark_notification_read,
        promote_user,
        register,
        reject_report,
        report_stats,
        service_info,
        suspend_user,
        unsuspend_user,
        update_facility,
        verify_report,
        vote_report,
    },
    middleware::{
        AuthGuardState,
        RequiredRole,
        optional_auth,
        request_timeout,
        require_auth,
        require_role,
    },
    usecase::{
        AdminUseCaseImpl,
        AuthUseCaseImpl,
        FacilityUseCaseImpl,
        NotificationUseCaseImpl,
        ReportUseCaseImpl,
        UserUseCaseImpl,
    },
};

/// ルーター構築に必要な依存
///
/// 本番では PostgreSQL 実装、テストではインメモリ実装を渡す。
#[derive(Clone)]
pub struct AppDependencies {
    pub user_repository:         Arc<dyn UserRepository>,
    pub report_repository:       Arc<dyn ReportRepository>,
    pub comment_repository:      Arc<dyn CommentRepository>,
    pub facility_repository:     Arc<dyn FacilityRepository>,
    pub notification_repository: Arc<dyn NotificationRepository>,
    pub password_hasher:         Arc<dyn PasswordHasher>,
    pub password_checker:        Arc<dyn PasswordChecker>,
    pub token_service:           Arc<dyn TokenService>,
    pub clock:                   Arc<dyn Clock>,
    pub request_timeout:         Duration,
}

/// State → Router の順に組み立てる
pub fn build_app(deps: AppDependencies) -> Router {
    let guard = AuthGuardState {
        token_service: deps.token_service.clone(),
    };

    let auth_state = Arc::new(AuthState {
        usecase: AuthUseCaseImpl::new(
            deps.user_repository.clone(),
            deps.password_hasher,
            deps.password_checker,
            deps.token_service,
            deps.clock.clone(),
        ),
    });

    let report_state = Arc::new(ReportState {
        usecase: ReportUseCaseImpl::new(
            deps.report_repository.clone(),
            deps.comment_repository,
            deps.user_repository.clone(),
            deps.clock.clone(),
        ),
    });

    let admin_state = Arc::new(AdminState {
        usecase: AdminUseCaseImpl::new(
            deps.report_repository.clone(),
            deps.notification_repository.clone(),
            deps.clock.clone(),
        ),
    });

    let facility_state = Arc::new(FacilityState {
        usecase: FacilityUseCaseImpl::new(deps.facility_repository.clone(), deps.clock.clone()),
    });

    let user_state = Arc::new(UserState {
        usecase: UserUseCaseImpl::new(
            deps.user_repository,
            deps.report_repository,
            deps.facility_repository,
            deps.clock.clone(),
        ),
    });

    let notification_state = Arc::new(NotificationState {
        usecase: NotificationUseCaseImpl::new(deps.notification_repository, deps.clock),
    });

    let admin_only = from_fn_with_state(RequiredRole::Admin, require_role);
    let writer_only = from_fn_with_state(RequiredRole::Writer, require_role);

    let api = Router::new()
        // 認証 API
        .merge(
            Router::new()
                .route("/auth/register", post(register))
                .route("/auth/login", post(login))
                .with_state(auth_state),
        )
        // レポート API（認証任意）
        .merge(
            Router::new()
                .route(
                    "/reports",
                    get(list_reports)
                        .merge(post(create_report).route_layer(writer_only.clone())),
                )
                .route("/reports/{report_id}", get(get_report))
                .route(
                    "/reports/{report_id}/comments",
                    get(list_comments)
                        .merge(post(create_comment).route_layer(writer_only.clone())),
                )
                .route(
                    "/reports/{report_id}/vote",
                    post(vote_report).route_layer(writer_only.clone()),
                )
                .route(
                    "/reports/{report_id}/flag",
                    post(flag_report).route_layer(writer_only),
                )
                .layer(from_fn_with_state(guard.clone(), optional_auth))
                .with_state(report_state),
        )
        // 施設 API（読み取りは公開、書き込みは管理者）
        .merge(
            Router::new()
                .route(
                    "/facilities",
                    get(list_facilities)
                        .merge(post(create_facility).route_layer(admin_only.clone())),
                )
                .route(
                    "/facilities/{facility_id}",
                    get(get_facility).merge(
                        put(update_facility)
                            .delete(delete_facility)
                            .route_layer(admin_only.clone()),
                    ),
                )
                .layer(from_fn_with_state(guard.clone(), optional_auth))
                .with_state(facility_state),
        )
        // 審査 API
        .merge(
            Router::new()
                .route("/admin/pending", get(list_pending))
                .route("/admin/stats", get(report_stats))
                .route("/admin/{report_id}/verify", post(verify_report))
                .route("/admin/{report_id}/reject", post(reject_report))
                .route_layer(admin_only.clone())
                .layer(from_fn_with_state(guard.clone(), require_auth))
                .with_state(admin_state),
        )
        // ユーザー管理 API
        .merge(
            Router::new()
                .route("/users", get(list_users))
                .route("/users/analytics/dashboard", get(dashboard))
                .route("/users/{user_id}/promote", post(promote_user))
                .route("/users/{user_id}/suspend", post(suspend_user))
                .route("/users/{user_id}/unsuspend", post(unsuspend_user))
                .route_layer(admin_only)
                // 本人または管理者（所有者判定はユースケースで行う）
                .route("/users/{user_id}", get(get_user).delete(delete_user))
                .layer(from_fn_with_state(guard.clone(), require_auth))
                .with_state(user_state),
        )
        // 通知 API
        .merge(
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
                .layer(from_fn_with_state(guard, require_auth))
                .with_state(notification_state),
        );

    Router::new()
        .route("/health", get(health_check))
        .route("/api/info", get(service_info))
        .nest("/api/v1", api)
        .layer(from_fn_with_state(deps.request_timeout, request_timeout))
        .layer(TraceLayer::new_for_http())
}
