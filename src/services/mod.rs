//! Services Module
//!
//! 비즈니스 로직을 담당하는 서비스 레이어
//!
//! # Services
//! - `AuthService`: bearer token 발급/검증, 지갑 서명 확인
//! - `ContractGateway`: 구독 컨트랙트 트랜잭션

mod auth;
mod chain;

pub use auth::{verify_wallet_signature, AuthError, AuthService, Claims, TOKEN_TTL_HOURS};
pub use chain::{to_wei, ContractGateway, EthersGateway, GatewayError, GatewayStatus};
