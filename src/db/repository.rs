//! Repository Pattern Implementation
//!
//! 라우트 레이어는 `Store` trait만 안다.
//!
//! ```text
//! routes ──▶ Arc<dyn Store> ──┬──▶ Database    (PostgreSQL)
//!                             └──▶ MemoryStore (ephemeral / tests)
//! ```
//!
//! 엔티티 간 트랜잭션은 없다. 프로필 업데이트는 동시성 토큰 없이 last-writer-wins.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::{
    CollectionCounts, CreatorProfile, NewPost, NewProfile, NewSubscription, NewTier, Post,
    ProfileUpdate, Subscription, Tier,
};

/// 저장소 에러
#[derive(Debug, Error)]
pub enum StoreError {
    /// unique 제약 위반 (같은 주소의 프로필 등)
    #[error("{0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// 네 컬렉션에 대한 저장소 인터페이스
///
/// 주소 인자는 호출 측에서 lowercase로 정규화해서 넘긴다.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> StoreResult<()>;

    // ============ CreatorProfile ============
    async fn insert_profile(&self, profile: NewProfile) -> StoreResult<CreatorProfile>;
    async fn find_profile_by_address(&self, address: &str) -> StoreResult<Option<CreatorProfile>>;
    async fn list_profiles(&self) -> StoreResult<Vec<CreatorProfile>>;
    async fn update_profile(
        &self,
        address: &str,
        update: ProfileUpdate,
    ) -> StoreResult<Option<CreatorProfile>>;

    // ============ Tier ============
    async fn insert_tier(&self, tier: NewTier) -> StoreResult<Tier>;
    async fn find_tiers_by_creator(&self, creator: Uuid) -> StoreResult<Vec<Tier>>;
    async fn find_tier_by_chain_id(
        &self,
        creator: Uuid,
        chain_tier_id: &str,
    ) -> StoreResult<Option<Tier>>;

    // ============ Post ============
    async fn insert_post(&self, post: NewPost) -> StoreResult<Post>;
    async fn find_posts_by_creator(&self, creator: Uuid) -> StoreResult<Vec<Post>>;

    // ============ Subscription ============
    async fn insert_subscription(&self, subscription: NewSubscription) -> StoreResult<Subscription>;
    async fn find_subscriptions_by_subscriber(
        &self,
        subscriber: &str,
    ) -> StoreResult<Vec<Subscription>>;

    // ============ Maintenance ============
    async fn counts(&self) -> StoreResult<CollectionCounts>;

    /// 네 컬렉션 전체 삭제. 삭제된 문서 수를 반환한다.
    async fn reset(&self) -> StoreResult<CollectionCounts>;
}
