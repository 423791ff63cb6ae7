//! Configuration Module
//!
//! 모든 설정은 환경변수에서 읽는다 (`.env` 파일은 dotenvy가 로드).
//!
//! 필수 값이 없으면 `from_env()`가 즉시 실패한다 (fail-fast):
//! - `DATABASE_URL`: 저장소 없이 서버를 띄울 수 없음
//! - `WEB3AUTH_CLIENT_ID`: 지갑 로그인 메시지 바인딩에 사용
//! - `JWT_SECRET`: 빈 secret으로 토큰을 서명하지 않음 (fail closed)

use std::env;
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// 인메모리 저장소를 선택하는 DATABASE_URL 스킴
pub const MEMORY_DATABASE_URL: &str = "memory://";

/// 허용되는 구독 기간 (일)
pub const SUBSCRIPTION_PERIOD_RANGE: RangeInclusive<i64> = 1..=36500;

/// 애플리케이션 설정
#[derive(Clone)]
pub struct Config {
    /// 서버 포트 (기본값: 3001)
    pub port: u16,

    /// PostgreSQL 연결 문자열, 또는 `memory://`
    pub database_url: String,

    /// Web3Auth client id (로그인 메시지에 포함되어야 함)
    pub web3auth_client_id: String,

    /// 토큰 서명 secret
    pub jwt_secret: String,

    /// Ethereum RPC URL
    pub eth_rpc_url: String,

    /// CreatorSubscriptionManager 컨트랙트 주소
    pub subscription_contract_address: Option<String>,

    /// GaslessPaymaster 컨트랙트 주소
    pub paymaster_contract_address: Option<String>,

    /// 트랜잭션 서명용 relayer 키
    pub signer_private_key: Option<String>,

    /// 트랜잭션 1 confirmation 대기 상한
    pub chain_tx_timeout: Duration,

    /// 구독 기간 (일)
    pub subscription_period_days: i64,

    /// 시작 시 네 컬렉션 전체 삭제 여부 (opt-in)
    pub reset_on_startup: bool,

    /// 프로덕션 CORS 허용 origin 목록
    pub allowed_origins: Vec<String>,

    /// 환경 (development, staging, production)
    pub environment: Environment,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Config {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 임의의 key lookup 함수로 설정 로드
    ///
    /// 빈 문자열은 값이 없는 것으로 취급한다.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = match get("ENVIRONMENT")
            .unwrap_or_else(|| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        let Some(database_url) = get("DATABASE_URL") else {
            bail!("DATABASE_URL is required");
        };
        let Some(web3auth_client_id) = get("WEB3AUTH_CLIENT_ID") else {
            bail!("WEB3AUTH_CLIENT_ID is required");
        };
        let Some(jwt_secret) = get("JWT_SECRET") else {
            bail!("JWT_SECRET is required");
        };

        let chain_tx_timeout_secs: u64 = get("CHAIN_TX_TIMEOUT_SECS")
            .unwrap_or_else(|| "60".to_string())
            .parse()
            .context("CHAIN_TX_TIMEOUT_SECS must be a valid number")?;

        let subscription_period_days: i64 = get("SUBSCRIPTION_PERIOD_DAYS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .context("SUBSCRIPTION_PERIOD_DAYS must be a valid number")?;
        if !SUBSCRIPTION_PERIOD_RANGE.contains(&subscription_period_days) {
            bail!(
                "SUBSCRIPTION_PERIOD_DAYS must be between {} and {}",
                SUBSCRIPTION_PERIOD_RANGE.start(),
                SUBSCRIPTION_PERIOD_RANGE.end()
            );
        }

        let reset_on_startup = match get("RESET_ON_STARTUP") {
            None => false,
            Some(v) => parse_flag(&v).context("RESET_ON_STARTUP must be true or false")?,
        };

        Ok(Config {
            port: get("PORT")
                .unwrap_or_else(|| "3001".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            database_url,
            web3auth_client_id,
            jwt_secret,
            eth_rpc_url: get("ETH_RPC_URL").unwrap_or_else(|| "http://localhost:8545".to_string()),
            subscription_contract_address: get("SUBSCRIPTION_CONTRACT_ADDRESS"),
            paymaster_contract_address: get("PAYMASTER_CONTRACT_ADDRESS"),
            signer_private_key: get("SIGNER_PRIVATE_KEY"),
            chain_tx_timeout: Duration::from_secs(chain_tx_timeout_secs),
            subscription_period_days,
            reset_on_startup,
            allowed_origins: get("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            environment,
        })
    }

    /// 프로덕션 환경인지 확인
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// 인메모리 저장소 사용 여부
    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with(MEMORY_DATABASE_URL)
    }
}

// secret 값은 로그에 남기지 않는다
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("database_url", &"<redacted>")
            .field("web3auth_client_id", &self.web3auth_client_id)
            .field("jwt_secret", &"<redacted>")
            .field("eth_rpc_url", &self.eth_rpc_url)
            .field("subscription_contract_address", &self.subscription_contract_address)
            .field("paymaster_contract_address", &self.paymaster_contract_address)
            .field("signer_private_key", &self.signer_private_key.as_ref().map(|_| "<redacted>"))
            .field("chain_tx_timeout", &self.chain_tx_timeout)
            .field("subscription_period_days", &self.subscription_period_days)
            .field("reset_on_startup", &self.reset_on_startup)
            .field("allowed_origins", &self.allowed_origins)
            .field("environment", &self.environment)
            .finish()
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("invalid flag value: {}", other),
    }
}
