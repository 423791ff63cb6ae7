//! Creator Subscription API Library
//!
//! # Overview
//!
//! 크리에이터 프로필/티어/게시물/구독을 다루는 백엔드 API.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                         API                              │
//! │                                                          │
//! │  ┌─────────┐  ┌──────────────┐  ┌─────────────────────┐ │
//! │  │ Routes  │─▶│ AuthService  │  │ Arc<dyn Store>      │ │
//! │  │(AuthUser│  └──────────────┘  │ Postgres / Memory   │ │
//! │  │extractor│─────────────────▶  └─────────────────────┘ │
//! │  └────┬────┘                                             │
//! │       │       ┌──────────────────────────┐               │
//! │       └──────▶│ Arc<dyn ContractGateway> │               │
//! │               └────────────┬─────────────┘               │
//! └────────────────────────────┼─────────────────────────────┘
//!                              ▼
//!        CreatorSubscriptionManager    GaslessPaymaster
//! ```
//!
//! 모든 의존성은 `AppState`로 주입된다. 테스트는 `MemoryStore`와 가짜 게이트웨이를 넣는다.
//!
//! ## Modules
//!
//! - `config`: 환경 설정 관리
//! - `error`: 에러 타입 및 HTTP 매핑
//! - `routes`: HTTP 엔드포인트 핸들러
//! - `services`: 인증, 컨트랙트 게이트웨이
//! - `db`: 저장소 (PostgreSQL, in-memory)
//! - `types`: 공통 타입 정의

use std::sync::Arc;

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use db::{Database, MemoryStore, Store};
pub use error::ApiError;
pub use routes::create_router;
pub use services::{AuthService, ContractGateway, EthersGateway};

/// 애플리케이션 전역 상태
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Store>,
    pub auth: Arc<AuthService>,
    pub chain: Arc<dyn ContractGateway>,
    pub config: Arc<Config>,
}

/// 라우트 바인딩 전 저장소 준비
///
/// `RESET_ON_STARTUP`이 켜져 있을 때만 네 컬렉션을 전부 삭제한다.
/// 삭제가 일어나면 컬렉션별 삭제 건수를 반환한다.
pub async fn bootstrap_store(
    store: &dyn Store,
    config: &Config,
) -> anyhow::Result<Option<db::CollectionCounts>> {
    if !config.reset_on_startup {
        let counts = store.counts().await?;
        tracing::info!(
            profiles = counts.creator_profiles,
            tiers = counts.tiers,
            posts = counts.posts,
            subscriptions = counts.subscriptions,
            "Store ready"
        );
        return Ok(None);
    }

    tracing::warn!("RESET_ON_STARTUP is set: deleting all creator profiles, tiers, posts and subscriptions");
    let deleted = store.reset().await?;
    tracing::warn!(
        profiles = deleted.creator_profiles,
        tiers = deleted.tiers,
        posts = deleted.posts,
        subscriptions = deleted.subscriptions,
        "Database cleanup completed"
    );

    Ok(Some(deleted))
}
