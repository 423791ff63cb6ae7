//! Subscription Endpoints
//!
//! 구독 구매는 온체인 결제가 confirmation 된 뒤에만 로컬 기록을 남긴다.
//! status는 `active`로 생성되며 이후 전이는 없다.

use axum::{extract::State, Json};
use chrono::{DateTime, Duration, Utc};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{
    db::{NewSubscription, Subscription, SubscriptionStatus},
    error::ApiError,
    routes::extract::{AppJson, AuthUser},
    services::to_wei,
    types::{is_valid_ethereum_address, DecimalString, Success},
    AppState,
};

// ============ Request/Response Types ============

/// 구독 구매 요청
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    /// 크리에이터 지갑 주소
    pub creator: Option<String>,
    /// 온체인 tier id
    pub tier_id: Option<DecimalString>,
    /// 결제 금액 (ETH)
    pub amount: Option<DecimalString>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub tx_hash: String,
    pub subscription: Subscription,
}

// ============ Handlers ============

/// POST /subscribe
pub async fn purchase_subscription(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<SubscribeRequest>,
) -> Result<Json<Success<SubscribeResponse>>, ApiError> {
    let (Some(creator), Some(tier_id), Some(amount)) = (req.creator, req.tier_id, req.amount) else {
        return Err(ApiError::ValidationError(
            "creator, tierId and amount are required".to_string(),
        ));
    };

    let creator = creator.trim().to_lowercase();
    if !is_valid_ethereum_address(&creator) {
        return Err(ApiError::ValidationError("Invalid creator address".to_string()));
    }
    let creator_address: Address = creator
        .parse()
        .map_err(|_| ApiError::ValidationError("Invalid creator address".to_string()))?;

    let chain_tier_id = U256::from_dec_str(tier_id.as_str())
        .map_err(|_| ApiError::ValidationError("Invalid tierId".to_string()))?;

    // 트랜잭션 전에 금액 형식 확인
    to_wei(amount.as_str())?;

    let profile = state
        .db
        .find_profile_by_address(&creator)
        .await?
        .ok_or_else(|| ApiError::NotFound("Creator".to_string()))?;

    let tier = state
        .db
        .find_tier_by_chain_id(profile.id, &chain_tier_id.to_string())
        .await?
        .ok_or_else(|| ApiError::NotFound("Tier".to_string()))?;

    // 결제 전에 기간 계산 (overflow면 트랜잭션을 보내지 않음)
    let start_date = Utc::now();
    let end_date = subscription_end(start_date, state.config.subscription_period_days)
        .ok_or_else(|| {
            tracing::error!(
                "subscription period of {} days is out of range",
                state.config.subscription_period_days
            );
            ApiError::InternalError
        })?;

    let tx_hash = state
        .chain
        .purchase_subscription(creator_address, chain_tier_id, amount.as_str())
        .await?;
    let tx_hash = format!("{:?}", tx_hash);
    tracing::info!(
        subscriber = %user.address,
        %creator,
        tier = %chain_tier_id,
        %tx_hash,
        "subscription purchased"
    );

    let subscription = state
        .db
        .insert_subscription(NewSubscription {
            subscriber: user.address.clone(),
            creator: profile.id,
            tier: tier.id,
            start_date,
            end_date: Some(end_date),
            status: SubscriptionStatus::Active,
            tx_hash: Some(tx_hash.clone()),
        })
        .await
        .map_err(|e| {
            // 온체인 결제는 확정됨, 수동 정산 필요
            tracing::error!(
                subscriber = %user.address,
                %creator,
                tier = %chain_tier_id,
                %tx_hash,
                error = %e,
                "subscription confirmed on-chain but not stored"
            );
            ApiError::from(e)
        })?;

    Ok(Json(Success::new(SubscribeResponse {
        tx_hash,
        subscription,
    })))
}

/// GET /subscriptions
///
/// 호출자 본인의 구독 목록
pub async fn get_user_subscriptions(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Subscription>>, ApiError> {
    let subscriptions = state
        .db
        .find_subscriptions_by_subscriber(&user.address)
        .await?;
    tracing::debug!(subscriber = %user.address, count = subscriptions.len(), "subscriptions fetched");

    Ok(Json(subscriptions))
}

fn subscription_end(start: DateTime<Utc>, period_days: i64) -> Option<DateTime<Utc>> {
    if period_days <= 0 {
        return None;
    }
    Duration::try_days(period_days).and_then(|period| start.checked_add_signed(period))
}
