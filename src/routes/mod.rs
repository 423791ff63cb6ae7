//! API Routes Module
//!
//! 모든 HTTP 엔드포인트 정의
//!
//! # Routes
//!
//! ```text
//! GET  /health                     - 서버 상태 확인
//!
//! POST /auth/login                 - 지갑 서명 로그인 → bearer token
//! POST /auth/verify                - 토큰 검증
//!
//! POST /creator/tier               - 티어 생성 (온체인 + 저장)      [bearer]
//! GET  /creator/tiers/:address     - 크리에이터 티어 목록
//! POST /subscribe                  - 구독 구매 (온체인 + 저장)      [bearer]
//! GET  /subscriptions              - 내 구독 목록                   [bearer]
//!
//! POST /creator/profile            - 프로필 생성                    [bearer]
//! GET  /creator/profile/:address   - 프로필 조회
//! PUT  /creator/profile/:address   - 프로필 수정 (소유자만)         [bearer]
//! GET  /creators                   - 전체 크리에이터
//!
//! POST /creator/post               - 게시물 작성                    [bearer]
//! GET  /creator/posts/:address     - 게시물 목록 (티어 잠금 적용)   [optional bearer]
//! ```

pub mod auth;
pub mod extract;
pub mod health;
pub mod posts;
pub mod profile;
pub mod subscription;
pub mod tier;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// 라우터 생성
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))

        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/verify", post(auth::verify))

        // Tier / subscription
        .route("/creator/tier", post(tier::create_tier))
        .route("/creator/tiers/:address", get(tier::get_creator_tiers))
        .route("/subscribe", post(subscription::purchase_subscription))
        .route("/subscriptions", get(subscription::get_user_subscriptions))

        // Creator profile
        .route("/creator/profile", post(profile::create_profile))
        .route(
            "/creator/profile/:address",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/creators", get(profile::get_all_creators))

        // Posts
        .route("/creator/post", post(posts::create_post))
        .route("/creator/posts/:address", get(posts::get_creator_posts))

        // 미들웨어
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)

        // 상태 주입
        .with_state(state)
}

/// CORS 설정
///
/// 프로덕션: `ALLOWED_ORIGINS`만 허용. 개발: Next.js dev server 등 localhost.
fn cors_layer(state: &AppState) -> CorsLayer {
    if state.config.is_production() {
        let origins: Vec<HeaderValue> = state
            .config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        if origins.is_empty() {
            tracing::warn!("ALLOWED_ORIGINS is empty in production; cross-origin requests will be rejected");
        }

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        CorsLayer::new()
            .allow_origin([
                HeaderValue::from_static("http://localhost:3000"), // Next.js dev server
                HeaderValue::from_static("http://127.0.0.1:3000"),
                HeaderValue::from_static("http://localhost:5173"),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
