//! Database Models
//!
//! Creator profiles, tiers, posts and subscriptions.
//! JSON field names follow the frontend (camelCase).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 크리에이터 노출 여부 ("yes" / "no")
///
/// 필터링은 클라이언트에서 한다. 서버는 저장만.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Featured {
    Yes,
    #[default]
    No,
}

impl Featured {
    pub fn as_str(&self) -> &'static str {
        match self {
            Featured::Yes => "yes",
            Featured::No => "no",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "yes" => Some(Featured::Yes),
            "no" => Some(Featured::No),
            _ => None,
        }
    }
}

/// 구독 상태
///
/// 생성 시 한 번 설정되고 시스템이 전이시키지 않는다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(SubscriptionStatus::Active),
            "expired" => Some(SubscriptionStatus::Expired),
            "cancelled" => Some(SubscriptionStatus::Cancelled),
            _ => None,
        }
    }
}

/// 소셜 링크
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl SocialLinks {
    /// `other`에 있는 값만 덮어쓴다
    pub fn merge(&mut self, other: SocialLinks) {
        if other.twitter.is_some() {
            self.twitter = other.twitter;
        }
        if other.instagram.is_some() {
            self.instagram = other.instagram;
        }
        if other.facebook.is_some() {
            self.facebook = other.facebook;
        }
        if other.website.is_some() {
            self.website = other.website;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.twitter.is_none()
            && self.instagram.is_none()
            && self.facebook.is_none()
            && self.website.is_none()
    }
}

/// 크리에이터 프로필
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorProfile {
    pub id: Uuid,

    /// 지갑 주소 (lowercase, unique)
    pub address: String,

    pub name: String,
    pub category: String,
    pub description: Option<String>,

    /// 프로필 이미지 URL
    pub image: Option<String>,

    /// 배너 이미지 URL
    pub cover: Option<String>,

    pub patrons: i64,
    pub featured: Featured,
    pub social_links: SocialLinks,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 프로필 생성 입력
#[derive(Debug, Clone, Default)]
pub struct NewProfile {
    pub address: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub cover: Option<String>,
    pub patrons: Option<i64>,
    pub featured: Option<Featured>,
    pub social_links: SocialLinks,
}

/// 프로필 병합 업데이트 (None = 기존 값 유지)
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub cover: Option<String>,
    pub patrons: Option<i64>,
    pub featured: Option<Featured>,
    pub social_links: SocialLinks,
}

impl ProfileUpdate {
    /// 업데이트를 프로필에 적용 (updated_at은 호출자가 설정)
    pub fn apply_to(self, profile: &mut CreatorProfile) {
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(category) = self.category {
            profile.category = category;
        }
        if self.description.is_some() {
            profile.description = self.description;
        }
        if self.image.is_some() {
            profile.image = self.image;
        }
        if self.cover.is_some() {
            profile.cover = self.cover;
        }
        if let Some(patrons) = self.patrons {
            profile.patrons = patrons;
        }
        if let Some(featured) = self.featured {
            profile.featured = featured;
        }
        profile.social_links.merge(self.social_links);
    }
}

/// 구독 티어
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub id: Uuid,

    /// CreatorProfile id
    pub creator: Uuid,

    /// 온체인 티어 id (U256 decimal)
    pub chain_tier_id: Option<String>,

    pub name: String,
    pub price: f64,

    /// 혜택 목록 (순서 유지)
    pub benefits: Vec<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTier {
    pub creator: Uuid,
    pub chain_tier_id: Option<String>,
    pub name: String,
    pub price: f64,
    pub benefits: Vec<String>,
}

/// 게시물
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub creator: Uuid,
    pub title: String,
    pub content: String,

    /// 비어 있으면 공개 게시물
    pub visible_to_tiers: Vec<Uuid>,

    /// 첨부 파일 URL
    pub attachments: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub creator: Uuid,
    pub title: String,
    pub content: String,
    pub visible_to_tiers: Vec<Uuid>,
    pub attachments: Vec<String>,
}

/// 구독
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,

    /// 구독자 지갑 주소 (lowercase)
    pub subscriber: String,

    pub creator: Uuid,
    pub tier: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: SubscriptionStatus,

    /// 구매 트랜잭션 해시
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub subscriber: String,
    pub creator: Uuid,
    pub tier: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: SubscriptionStatus,
    pub tx_hash: Option<String>,
}

/// 컬렉션별 문서 수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCounts {
    pub creator_profiles: u64,
    pub tiers: u64,
    pub posts: u64,
    pub subscriptions: u64,
}

impl CollectionCounts {
    pub fn total(&self) -> u64 {
        self.creator_profiles + self.tiers + self.posts + self.subscriptions
    }
}
