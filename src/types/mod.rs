//! Common Types Module
//!
//! 애플리케이션 전반에서 사용되는 공통 타입 정의

use serde::{Deserialize, Deserializer, Serialize};

/// 성공 플래그 + payload
///
/// `{ "success": true, ...payload }` 형태로 직렬화된다.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Success<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// 지갑 주소 정규화 (trim + lowercase)
///
/// 경로 파라미터 등 저장소 조회용 주소. 빈 문자열이면 None.
/// 형식 검증은 하지 않는다 (온체인으로 가는 주소는 `ethers::types::Address`로 파싱).
pub fn normalize_address(addr: &str) -> Option<String> {
    let addr = addr.trim();
    if addr.is_empty() {
        None
    } else {
        Some(addr.to_lowercase())
    }
}

/// 0x로 시작하는 40자리 hex 주소인지
pub fn is_valid_ethereum_address(addr: &str) -> bool {
    addr.starts_with("0x") && addr.len() == 42 && addr[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// 숫자 또는 문자열로 들어오는 decimal 값
///
/// 프론트엔드는 `amount: 0.1`과 `amount: "0.1"`을 섞어서 보낸다.
#[derive(Debug, Clone, PartialEq)]
pub struct DecimalString(pub String);

impl DecimalString {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for DecimalString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(serde_json::Number),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => DecimalString(n.to_string()),
            Raw::Text(s) => DecimalString(s.trim().to_string()),
        })
    }
}
