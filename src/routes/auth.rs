//! Auth Endpoints
//!
//! 지갑 서명 로그인과 토큰 검증.
//! 로그인 메시지에는 `WEB3AUTH_CLIENT_ID`가 들어 있어야 한다 (다른 앱용 서명 재사용 방지).

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, routes::extract::AppJson, services::verify_wallet_signature, AppState};

// ============ Request/Response Types ============

/// 로그인 요청
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// 지갑 주소
    pub address: Option<String>,
    /// 서명한 원문 메시지
    pub message: Option<String>,
    /// personal_sign 결과 (hex)
    pub signature: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

// ============ Handlers ============

/// POST /auth/login
///
/// # Flow
///
/// 1. address / message / signature 필수 확인
/// 2. message에 client id 포함 여부 확인
/// 3. 서명에서 signer 복원 → address와 비교
/// 4. 24시간 토큰 발급
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(address), Some(message), Some(signature)) = (req.address, req.message, req.signature)
    else {
        return Err(ApiError::ValidationError(
            "address, message and signature are required".to_string(),
        ));
    };

    if !message.contains(&state.config.web3auth_client_id) {
        tracing::warn!(%address, "login message not bound to this client");
        return Err(ApiError::BadRequest("Authentication failed".to_string()));
    }

    let address = verify_wallet_signature(&address, &message, &signature).map_err(|e| {
        tracing::warn!(%address, error = %e, "wallet signature rejected");
        ApiError::from(e)
    })?;

    let token = state.auth.issue_token(&address)?;
    tracing::info!(%address, "login succeeded");

    Ok(Json(LoginResponse { token, address }))
}

/// POST /auth/verify
///
/// 유효하면 `{valid: true, address}`, 아니면 401 `{valid: false}`
pub async fn verify(
    State(state): State<AppState>,
    AppJson(req): AppJson<VerifyRequest>,
) -> Response {
    let verified = req
        .token
        .as_deref()
        .ok_or(())
        .and_then(|token| state.auth.verify_token(token).map_err(|_| ()));

    match verified {
        Ok(address) => Json(VerifyResponse {
            valid: true,
            address: Some(address),
        })
        .into_response(),
        Err(()) => (
            StatusCode::UNAUTHORIZED,
            Json(VerifyResponse {
                valid: false,
                address: None,
            }),
        )
            .into_response(),
    }
}
