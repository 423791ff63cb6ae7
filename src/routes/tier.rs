//! Tier Endpoints
//!
//! 티어는 온체인(CreatorSubscriptionManager)에 먼저 생성되고,
//! confirmation 후 발급된 tier id와 함께 로컬에도 저장된다.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::{NewTier, Tier},
    error::ApiError,
    routes::extract::{AppJson, AuthUser},
    types::{normalize_address, Success},
    AppState,
};

// ============ Request/Response Types ============

/// 티어 생성 요청
#[derive(Debug, Deserialize)]
pub struct CreateTierRequest {
    /// 가격 (ETH)
    pub price: Option<f64>,
    /// 컨트랙트에 넘기는 메타데이터 (문자열이 아니면 JSON 문자열로 직렬화)
    pub metadata: Option<serde_json::Value>,
    /// 표시 이름, 없으면 metadata 사용
    pub name: Option<String>,
    pub benefits: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTierResponse {
    /// 온체인 tier id (decimal)
    pub tier_id: String,
    pub tier: Tier,
}

// ============ Handlers ============

/// POST /creator/tier
///
/// # Flow
///
/// 1. price 검증
/// 2. 호출자 프로필 확인 (없으면 트랜잭션 전에 404)
/// 3. createSubscriptionTier 전송, 1 confirmation 대기
/// 4. 로컬 저장
pub async fn create_tier(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<CreateTierRequest>,
) -> Result<Json<Success<CreateTierResponse>>, ApiError> {
    let price = req
        .price
        .ok_or_else(|| ApiError::ValidationError("price is required".to_string()))?;
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::ValidationError(
            "price must be a non-negative number".to_string(),
        ));
    }

    let profile = state
        .db
        .find_profile_by_address(&user.address)
        .await?
        .ok_or_else(|| ApiError::NotFound("Creator profile".to_string()))?;

    let metadata = match req.metadata {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    };

    let tier_id = state.chain.create_tier(&price.to_string(), &metadata).await?;
    tracing::info!(creator = %user.address, %tier_id, price, "tier created on-chain");

    let name = req
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| {
            if metadata.is_empty() {
                format!("Tier {}", tier_id)
            } else {
                metadata.clone()
            }
        });

    let tier = state
        .db
        .insert_tier(NewTier {
            creator: profile.id,
            chain_tier_id: Some(tier_id.to_string()),
            name,
            price,
            benefits: req.benefits.unwrap_or_default(),
        })
        .await
        .map_err(|e| {
            // 온체인 티어는 이미 생성됨, 수동 정산 필요
            tracing::error!(
                creator = %user.address,
                %tier_id,
                error = %e,
                "tier created on-chain but not stored"
            );
            ApiError::from(e)
        })?;

    Ok(Json(Success::new(CreateTierResponse {
        tier_id: tier_id.to_string(),
        tier,
    })))
}

/// GET /creator/tiers/:address
///
/// 프로필이 없는 주소는 빈 목록
pub async fn get_creator_tiers(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<Vec<Tier>>, ApiError> {
    let Some(address) = normalize_address(&address) else {
        return Ok(Json(vec![]));
    };

    let Some(profile) = state.db.find_profile_by_address(&address).await? else {
        tracing::debug!(%address, "no profile, returning empty tier list");
        return Ok(Json(vec![]));
    };

    let tiers = state.db.find_tiers_by_creator(profile.id).await?;
    tracing::debug!(%address, count = tiers.len(), "tiers fetched");

    Ok(Json(tiers))
}
