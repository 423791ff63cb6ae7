//! Creator Profile Endpoints
//!
//! 주소는 항상 lowercase로 저장/조회한다.
//! 수정 권한은 토큰 주소 == 경로 주소 (대소문자 무시) 하나뿐이다.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::{CreatorProfile, Featured, NewProfile, ProfileUpdate, SocialLinks},
    error::ApiError,
    routes::extract::{AppJson, AuthUser},
    types::{normalize_address, Success},
    AppState,
};

// ============ Request/Response Types ============

/// 프로필 생성/수정 body
///
/// `address`는 받지 않는다 (토큰 / 경로에서 결정).
/// 소셜 링크는 `socialLinks` 객체와 최상위 `twitter` 등 둘 다 허용, 최상위 값이 우선.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub cover: Option<String>,
    pub patrons: Option<i64>,
    pub featured: Option<String>,
    pub social_links: Option<SocialLinks>,
    pub twitter: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub website: Option<String>,
}

impl ProfileRequest {
    fn featured(&self) -> Result<Option<Featured>, ApiError> {
        match self.featured.as_deref() {
            None => Ok(None),
            Some(value) => Featured::parse(value)
                .map(Some)
                .ok_or_else(|| ApiError::ValidationError("featured must be 'yes' or 'no'".to_string())),
        }
    }

    fn social_links(&mut self) -> SocialLinks {
        let mut links = self.social_links.take().unwrap_or_default();
        links.merge(SocialLinks {
            twitter: self.twitter.take(),
            instagram: self.instagram.take(),
            facebook: self.facebook.take(),
            website: self.website.take(),
        });
        links
    }
}

#[derive(Debug, Serialize)]
pub struct CreateProfileResponse {
    pub profile: CreatorProfile,
}

// ============ Handlers ============

/// POST /creator/profile
///
/// 토큰 주소로 프로필 생성. 같은 주소가 이미 있으면 409.
pub async fn create_profile(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(mut req): AppJson<ProfileRequest>,
) -> Result<Json<Success<CreateProfileResponse>>, ApiError> {
    let featured = req.featured()?;
    let social_links = req.social_links();

    let name = non_empty(req.name)
        .ok_or_else(|| ApiError::ValidationError("name is required".to_string()))?;
    let category = non_empty(req.category)
        .ok_or_else(|| ApiError::ValidationError("category is required".to_string()))?;

    let profile = state
        .db
        .insert_profile(NewProfile {
            address: user.address.clone(),
            name,
            category,
            description: req.description,
            image: req.image,
            cover: req.cover,
            patrons: req.patrons,
            featured,
            social_links,
        })
        .await
        .map_err(|e| {
            tracing::warn!(address = %user.address, error = %e, "profile creation failed");
            ApiError::from(e)
        })?;

    tracing::info!(address = %profile.address, id = %profile.id, "profile created");
    Ok(Json(Success::new(CreateProfileResponse { profile })))
}

/// GET /creator/profile/:address
pub async fn get_profile(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<CreatorProfile>, ApiError> {
    let address = normalize_address(&address)
        .ok_or_else(|| ApiError::ValidationError("Address is required".to_string()))?;

    let profile = state
        .db
        .find_profile_by_address(&address)
        .await?
        .ok_or_else(|| {
            tracing::debug!(%address, "creator not found");
            ApiError::NotFound("Creator".to_string())
        })?;

    Ok(Json(profile))
}

/// PUT /creator/profile/:address
///
/// 병합 업데이트. 소유자가 아니면 403 (문서는 변경되지 않음).
pub async fn update_profile(
    State(state): State<AppState>,
    Path(address): Path<String>,
    user: AuthUser,
    AppJson(mut req): AppJson<ProfileRequest>,
) -> Result<Json<CreatorProfile>, ApiError> {
    let address = normalize_address(&address)
        .ok_or_else(|| ApiError::ValidationError("Address is required".to_string()))?;

    if !user.owns(&address) {
        tracing::warn!(
            %address,
            token_address = %user.address,
            "token address does not match profile address"
        );
        return Err(ApiError::Forbidden);
    }

    let update = ProfileUpdate {
        featured: req.featured()?,
        social_links: req.social_links(),
        name: non_empty(req.name),
        category: non_empty(req.category),
        description: req.description,
        image: req.image,
        cover: req.cover,
        patrons: req.patrons,
    };

    let profile = state
        .db
        .update_profile(&address, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile".to_string()))?;

    tracing::info!(%address, "profile updated");
    Ok(Json(profile))
}

/// GET /creators
///
/// 전체 목록. featured 필터링은 클라이언트 몫.
pub async fn get_all_creators(
    State(state): State<AppState>,
) -> Result<Json<Vec<CreatorProfile>>, ApiError> {
    let creators = state.db.list_profiles().await?;
    tracing::debug!(count = creators.len(), "creators fetched");
    Ok(Json(creators))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
