//! Request Extractors
//!
//! - `AuthUser`: `Authorization: Bearer <jwt>` 검증 후 인증된 주소
//! - `AppJson`: JSON body, 파싱 실패를 `ApiError`(400)로 변환

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{error::ApiError, AppState};

/// 인증된 호출자
///
/// 보호된 핸들러는 이 값을 인자로 받는다. 주소는 lowercase.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub address: String,
}

impl AuthUser {
    /// 소유 주소와 대소문자 무시 비교
    pub fn owns(&self, address: &str) -> bool {
        self.address.eq_ignore_ascii_case(address.trim())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                tracing::debug!(path = %parts.uri.path(), "missing bearer token");
                ApiError::Unauthorized("No authorization token provided".to_string())
            })?;

        let address = state.auth.verify_token(token)?;
        Ok(AuthUser { address })
    }
}

/// `axum::Json`과 같지만 rejection이 `ApiError`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);
