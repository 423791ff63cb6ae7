//! In-memory `Store`
//!
//! `DATABASE_URL=memory://` 이거나 테스트에서 사용. 프로세스 종료 시 데이터는 사라진다.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    CollectionCounts, CreatorProfile, NewPost, NewProfile, NewSubscription, NewTier, Post,
    ProfileUpdate, Subscription, Tier,
};
use super::repository::{Store, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    // Vec으로 삽입 순서 유지
    profiles: Vec<CreatorProfile>,
    tiers: Vec<Tier>,
    posts: Vec<Post>,
    subscriptions: Vec<Subscription>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_profile(&self, profile: NewProfile) -> StoreResult<CreatorProfile> {
        let mut tables = self.tables.write().await;
        let address = profile.address.to_lowercase();

        if tables.profiles.iter().any(|p| p.address == address) {
            return Err(StoreError::Conflict("Profile already exists".to_string()));
        }

        let now = Utc::now();
        let created = CreatorProfile {
            id: Uuid::new_v4(),
            address,
            name: profile.name,
            category: profile.category,
            description: profile.description,
            image: profile.image,
            cover: profile.cover,
            patrons: profile.patrons.unwrap_or(0),
            featured: profile.featured.unwrap_or_default(),
            social_links: profile.social_links,
            created_at: now,
            updated_at: now,
        };
        tables.profiles.push(created.clone());
        Ok(created)
    }

    async fn find_profile_by_address(&self, address: &str) -> StoreResult<Option<CreatorProfile>> {
        let address = address.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables.profiles.iter().find(|p| p.address == address).cloned())
    }

    async fn list_profiles(&self) -> StoreResult<Vec<CreatorProfile>> {
        Ok(self.tables.read().await.profiles.clone())
    }

    async fn update_profile(
        &self,
        address: &str,
        update: ProfileUpdate,
    ) -> StoreResult<Option<CreatorProfile>> {
        let address = address.to_lowercase();
        let mut tables = self.tables.write().await;

        let Some(profile) = tables.profiles.iter_mut().find(|p| p.address == address) else {
            return Ok(None);
        };
        update.apply_to(profile);
        profile.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn insert_tier(&self, tier: NewTier) -> StoreResult<Tier> {
        let created = Tier {
            id: Uuid::new_v4(),
            creator: tier.creator,
            chain_tier_id: tier.chain_tier_id,
            name: tier.name,
            price: tier.price,
            benefits: tier.benefits,
            created_at: Utc::now(),
        };
        self.tables.write().await.tiers.push(created.clone());
        Ok(created)
    }

    async fn find_tiers_by_creator(&self, creator: Uuid) -> StoreResult<Vec<Tier>> {
        let tables = self.tables.read().await;
        Ok(tables.tiers.iter().filter(|t| t.creator == creator).cloned().collect())
    }

    async fn find_tier_by_chain_id(
        &self,
        creator: Uuid,
        chain_tier_id: &str,
    ) -> StoreResult<Option<Tier>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tiers
            .iter()
            .find(|t| t.creator == creator && t.chain_tier_id.as_deref() == Some(chain_tier_id))
            .cloned())
    }

    async fn insert_post(&self, post: NewPost) -> StoreResult<Post> {
        let now = Utc::now();
        let created = Post {
            id: Uuid::new_v4(),
            creator: post.creator,
            title: post.title,
            content: post.content,
            visible_to_tiers: post.visible_to_tiers,
            attachments: post.attachments,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.posts.push(created.clone());
        Ok(created)
    }

    /// 최신 글 먼저
    async fn find_posts_by_creator(&self, creator: Uuid) -> StoreResult<Vec<Post>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .rev()
            .filter(|p| p.creator == creator)
            .cloned()
            .collect())
    }

    async fn insert_subscription(&self, subscription: NewSubscription) -> StoreResult<Subscription> {
        let created = Subscription {
            id: Uuid::new_v4(),
            subscriber: subscription.subscriber.to_lowercase(),
            creator: subscription.creator,
            tier: subscription.tier,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
            status: subscription.status,
            tx_hash: subscription.tx_hash,
        };
        self.tables.write().await.subscriptions.push(created.clone());
        Ok(created)
    }

    async fn find_subscriptions_by_subscriber(
        &self,
        subscriber: &str,
    ) -> StoreResult<Vec<Subscription>> {
        let subscriber = subscriber.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .iter()
            .rev()
            .filter(|s| s.subscriber == subscriber)
            .cloned()
            .collect())
    }

    async fn counts(&self) -> StoreResult<CollectionCounts> {
        let tables = self.tables.read().await;
        Ok(CollectionCounts {
            creator_profiles: tables.profiles.len() as u64,
            tiers: tables.tiers.len() as u64,
            posts: tables.posts.len() as u64,
            subscriptions: tables.subscriptions.len() as u64,
        })
    }

    async fn reset(&self) -> StoreResult<CollectionCounts> {
        let mut tables = self.tables.write().await;
        let deleted = CollectionCounts {
            creator_profiles: tables.profiles.len() as u64,
            tiers: tables.tiers.len() as u64,
            posts: tables.posts.len() as u64,
            subscriptions: tables.subscriptions.len() as u64,
        };
        *tables = Tables::default();
        Ok(deleted)
    }
}
