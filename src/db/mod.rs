//! Database Module
//!
//! PostgreSQL 구현 (`Database`)과 인메모리 구현 (`MemoryStore`).
//! 둘 다 `Store` trait을 구현하며 `AppState`에는 `Arc<dyn Store>`로 주입된다.
//!
//! 컬렉션 → 테이블:
//! - `creator_profiles` (address UNIQUE, lowercase)
//! - `tiers`, `posts`, `subscriptions` (creator_profiles.id 참조)

mod memory;
mod models;
mod repository;

pub use memory::MemoryStore;
pub use models::*;
pub use repository::{Store, StoreError, StoreResult};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

/// 데이터베이스 연결 및 쿼리 담당
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 데이터베이스 연결
    ///
    /// # Connection Pool Settings
    ///
    /// - max_connections: 10
    /// - min_connections: 1
    /// - acquire_timeout: 3초
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(3))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// 마이그레이션 실행
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict("Profile already exists".to_string())
            }
            _ => {
                tracing::error!("SQLx error: {:?}", err);
                StoreError::Backend(err.to_string())
            }
        }
    }
}

// ============ Rows ============

const PROFILE_COLUMNS: &str = "id, address, name, category, description, image, cover, patrons, \
     featured, twitter, instagram, facebook, website, created_at, updated_at";

const SUBSCRIPTION_COLUMNS: &str =
    "id, subscriber, creator_id, tier_id, start_date, end_date, status, tx_hash";

#[derive(FromRow)]
struct ProfileRow {
    id: Uuid,
    address: String,
    name: String,
    category: String,
    description: Option<String>,
    image: Option<String>,
    cover: Option<String>,
    patrons: i64,
    featured: String,
    twitter: Option<String>,
    instagram: Option<String>,
    facebook: Option<String>,
    website: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for CreatorProfile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> StoreResult<Self> {
        let featured = Featured::parse(&row.featured)
            .ok_or_else(|| StoreError::Backend(format!("invalid featured value: {}", row.featured)))?;

        Ok(CreatorProfile {
            id: row.id,
            address: row.address,
            name: row.name,
            category: row.category,
            description: row.description,
            image: row.image,
            cover: row.cover,
            patrons: row.patrons,
            featured,
            social_links: SocialLinks {
                twitter: row.twitter,
                instagram: row.instagram,
                facebook: row.facebook,
                website: row.website,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct TierRow {
    id: Uuid,
    creator_id: Uuid,
    chain_tier_id: Option<String>,
    name: String,
    price: f64,
    benefits: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<TierRow> for Tier {
    fn from(row: TierRow) -> Self {
        Tier {
            id: row.id,
            creator: row.creator_id,
            chain_tier_id: row.chain_tier_id,
            name: row.name,
            price: row.price,
            benefits: row.benefits,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct PostRow {
    id: Uuid,
    creator_id: Uuid,
    title: String,
    content: String,
    visible_to_tiers: Vec<Uuid>,
    attachments: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            creator: row.creator_id,
            title: row.title,
            content: row.content,
            visible_to_tiers: row.visible_to_tiers,
            attachments: row.attachments,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct SubscriptionRow {
    id: Uuid,
    subscriber: String,
    creator_id: Uuid,
    tier_id: Uuid,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    status: String,
    tx_hash: Option<String>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = StoreError;

    fn try_from(row: SubscriptionRow) -> StoreResult<Self> {
        let status = SubscriptionStatus::parse(&row.status)
            .ok_or_else(|| StoreError::Backend(format!("invalid status value: {}", row.status)))?;

        Ok(Subscription {
            id: row.id,
            subscriber: row.subscriber,
            creator: row.creator_id,
            tier: row.tier_id,
            start_date: row.start_date,
            end_date: row.end_date,
            status,
            tx_hash: row.tx_hash,
        })
    }
}

#[async_trait]
impl Store for Database {
    /// Health check
    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_profile(&self, profile: NewProfile) -> StoreResult<CreatorProfile> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            INSERT INTO creator_profiles (
                id, address, name, category, description, image, cover, patrons,
                featured, twitter, instagram, facebook, website, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NOW(), NOW())
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(profile.address.to_lowercase())
        .bind(&profile.name)
        .bind(&profile.category)
        .bind(&profile.description)
        .bind(&profile.image)
        .bind(&profile.cover)
        .bind(profile.patrons.unwrap_or(0))
        .bind(profile.featured.unwrap_or_default().as_str())
        .bind(&profile.social_links.twitter)
        .bind(&profile.social_links.instagram)
        .bind(&profile.social_links.facebook)
        .bind(&profile.social_links.website)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_profile_by_address(&self, address: &str) -> StoreResult<Option<CreatorProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM creator_profiles WHERE address = $1"
        ))
        .bind(address.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CreatorProfile::try_from).transpose()
    }

    async fn list_profiles(&self) -> StoreResult<Vec<CreatorProfile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM creator_profiles ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CreatorProfile::try_from).collect()
    }

    /// 제공된 필드만 덮어쓰는 병합 업데이트 (COALESCE)
    async fn update_profile(
        &self,
        address: &str,
        update: ProfileUpdate,
    ) -> StoreResult<Option<CreatorProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            UPDATE creator_profiles SET
                name = COALESCE($2, name),
                category = COALESCE($3, category),
                description = COALESCE($4, description),
                image = COALESCE($5, image),
                cover = COALESCE($6, cover),
                patrons = COALESCE($7, patrons),
                featured = COALESCE($8, featured),
                twitter = COALESCE($9, twitter),
                instagram = COALESCE($10, instagram),
                facebook = COALESCE($11, facebook),
                website = COALESCE($12, website),
                updated_at = NOW()
            WHERE address = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(address.to_lowercase())
        .bind(&update.name)
        .bind(&update.category)
        .bind(&update.description)
        .bind(&update.image)
        .bind(&update.cover)
        .bind(update.patrons)
        .bind(update.featured.map(|f| f.as_str()))
        .bind(&update.social_links.twitter)
        .bind(&update.social_links.instagram)
        .bind(&update.social_links.facebook)
        .bind(&update.social_links.website)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CreatorProfile::try_from).transpose()
    }

    async fn insert_tier(&self, tier: NewTier) -> StoreResult<Tier> {
        let row = sqlx::query_as::<_, TierRow>(
            r#"
            INSERT INTO tiers (id, creator_id, chain_tier_id, name, price, benefits, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING id, creator_id, chain_tier_id, name, price, benefits, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tier.creator)
        .bind(&tier.chain_tier_id)
        .bind(&tier.name)
        .bind(tier.price)
        .bind(&tier.benefits)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_tiers_by_creator(&self, creator: Uuid) -> StoreResult<Vec<Tier>> {
        let rows = sqlx::query_as::<_, TierRow>(
            r#"
            SELECT id, creator_id, chain_tier_id, name, price, benefits, created_at
            FROM tiers
            WHERE creator_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(creator)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Tier::from).collect())
    }

    async fn find_tier_by_chain_id(
        &self,
        creator: Uuid,
        chain_tier_id: &str,
    ) -> StoreResult<Option<Tier>> {
        let row = sqlx::query_as::<_, TierRow>(
            r#"
            SELECT id, creator_id, chain_tier_id, name, price, benefits, created_at
            FROM tiers
            WHERE creator_id = $1 AND chain_tier_id = $2
            "#,
        )
        .bind(creator)
        .bind(chain_tier_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Tier::from))
    }

    async fn insert_post(&self, post: NewPost) -> StoreResult<Post> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (
                id, creator_id, title, content, visible_to_tiers, attachments, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING id, creator_id, title, content, visible_to_tiers, attachments, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post.creator)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.visible_to_tiers)
        .bind(&post.attachments)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_posts_by_creator(&self, creator: Uuid) -> StoreResult<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, creator_id, title, content, visible_to_tiers, attachments, created_at, updated_at
            FROM posts
            WHERE creator_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(creator)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn insert_subscription(&self, subscription: NewSubscription) -> StoreResult<Subscription> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            r#"
            INSERT INTO subscriptions (
                id, subscriber, creator_id, tier_id, start_date, end_date, status, tx_hash
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(subscription.subscriber.to_lowercase())
        .bind(subscription.creator)
        .bind(subscription.tier)
        .bind(subscription.start_date)
        .bind(subscription.end_date)
        .bind(subscription.status.as_str())
        .bind(&subscription.tx_hash)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_subscriptions_by_subscriber(
        &self,
        subscriber: &str,
    ) -> StoreResult<Vec<Subscription>> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE subscriber = $1 ORDER BY start_date DESC"
        ))
        .bind(subscriber.to_lowercase())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn counts(&self) -> StoreResult<CollectionCounts> {
        let (profiles, tiers, posts, subscriptions): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM creator_profiles),
                (SELECT COUNT(*) FROM tiers),
                (SELECT COUNT(*) FROM posts),
                (SELECT COUNT(*) FROM subscriptions)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CollectionCounts {
            creator_profiles: profiles as u64,
            tiers: tiers as u64,
            posts: posts as u64,
            subscriptions: subscriptions as u64,
        })
    }

    /// 참조하는 쪽부터 삭제 (FK 순서)
    async fn reset(&self) -> StoreResult<CollectionCounts> {
        let subscriptions = sqlx::query("DELETE FROM subscriptions")
            .execute(&self.pool)
            .await?
            .rows_affected();
        let posts = sqlx::query("DELETE FROM posts")
            .execute(&self.pool)
            .await?
            .rows_affected();
        let tiers = sqlx::query("DELETE FROM tiers")
            .execute(&self.pool)
            .await?
            .rows_affected();
        let creator_profiles = sqlx::query("DELETE FROM creator_profiles")
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(CollectionCounts {
            creator_profiles,
            tiers,
            posts,
            subscriptions,
        })
    }
}
