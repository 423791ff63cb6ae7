//! Auth Service
//!
//! Bearer token (HS256 JWT) 발급/검증과 지갑 서명 로그인.
//!
//! # Flow
//!
//! ```text
//! wallet ── personal_sign("... <client id> ...") ──▶ POST /auth/login
//!                                                    │ recover signer == address?
//!                                                    ▼
//!                                       JWT { address, iat, exp = iat + 24h }
//! ```
//!
//! refresh / revocation / scope 없음. 유효한 서명이 곧 인증이고,
//! 리소스 권한은 토큰 주소와 소유 주소의 lowercase 비교뿐이다.

use chrono::{DateTime, Duration, Utc};
use ethers::types::{Address, Signature};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 토큰 유효 기간 (고정)
pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum AuthError {
    /// 빈 secret으로는 서비스를 만들지 않는다
    #[error("signing secret is empty")]
    MissingSecret,

    /// 서명 불일치, 만료, 형식 오류 모두 여기로
    #[error("invalid token")]
    InvalidToken,

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("wallet signature does not match address")]
    SignatureMismatch,

    #[error("malformed wallet signature: {0}")]
    MalformedSignature(String),
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 지갑 주소 (lowercase)
    pub address: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct AuthService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl AuthService {
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // 만료 시각을 그대로 적용
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// 현재 시각 기준 24시간짜리 토큰 발급
    pub fn issue_token(&self, address: &str) -> Result<String, AuthError> {
        self.issue_token_at(address, Utc::now())
    }

    /// `issued_at` 기준으로 토큰 발급
    pub fn issue_token_at(
        &self,
        address: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            address: address.to_lowercase(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// 서명과 만료를 검증하고 토큰의 주소를 반환
    pub fn verify_token(&self, token: &str) -> Result<String, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            AuthError::InvalidToken
        })?;

        Ok(data.claims.address.to_lowercase())
    }
}

/// EIP-191 서명에서 signer를 복원해 `address`와 비교
///
/// 성공 시 lowercase 0x 주소를 반환한다.
pub fn verify_wallet_signature(
    address: &str,
    message: &str,
    signature: &str,
) -> Result<String, AuthError> {
    let expected: Address = address
        .trim()
        .parse()
        .map_err(|_| AuthError::MalformedSignature(format!("invalid address: {}", address)))?;

    let signature: Signature = signature
        .trim()
        .parse()
        .map_err(|e| AuthError::MalformedSignature(format!("{}", e)))?;

    let recovered = signature
        .recover(message)
        .map_err(|e| AuthError::MalformedSignature(format!("{}", e)))?;

    if recovered != expected {
        return Err(AuthError::SignatureMismatch);
    }

    Ok(format!("{:?}", recovered))
}
