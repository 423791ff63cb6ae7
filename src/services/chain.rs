//! Contract Gateway
//!
//! CreatorSubscriptionManager / GaslessPaymaster 컨트랙트 호출.
//!
//! # Transaction Policy
//!
//! - 전송 후 1 confirmation 대기, 전체를 `chain_tx_timeout`으로 제한
//! - 재시도 없음: 실패/타임아웃은 그대로 클라이언트에 보고
//! - nonce 직렬화 없음: 동시 요청은 nonce 경쟁이 가능하다

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers::abi::Detokenize;
use ethers::contract::{abigen, parse_log, ContractCall};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TransactionReceipt, TxHash, U256, U64};
use ethers::utils::parse_ether;
use serde::Serialize;
use thiserror::Error;

use crate::config::Config;

abigen!(
    CreatorSubscriptionManager,
    r#"[
        function createSubscriptionTier(uint256 price, string metadata) external returns (uint256)
        function purchaseSubscription(address creator, uint256 tierId) external payable
        event TierCreated(address indexed creator, uint256 indexed tierId, uint256 price, string metadata)
    ]"#
);

pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// 시작 시 provider/주소/키가 없어서 컨트랙트가 바인딩되지 않음
    #[error("contract not initialized")]
    ContractUninitialized,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    #[error("transaction not confirmed within {0:?}")]
    Timeout(Duration),
}

/// `/health`에 노출되는 바인딩 상태
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GatewayStatus {
    pub subscription_contract: bool,
    pub paymaster: bool,
}

/// 온체인 쓰기 작업
#[async_trait]
pub trait ContractGateway: Send + Sync {
    fn status(&self) -> GatewayStatus;

    /// 티어 생성 후 `TierCreated` 이벤트의 tier id 반환
    ///
    /// `price`는 ETH 단위 decimal 문자열 (wei로 변환해서 전송)
    async fn create_tier(&self, price: &str, metadata: &str) -> Result<U256, GatewayError>;

    /// 구독 구매. `amount`(ETH decimal)를 wei로 변환해 tx value로 첨부
    async fn purchase_subscription(
        &self,
        creator: Address,
        tier_id: U256,
        amount: &str,
    ) -> Result<TxHash, GatewayError>;
}

/// ETH decimal 문자열 → wei
pub fn to_wei(amount: &str) -> Result<U256, GatewayError> {
    let amount = amount.trim();
    if amount.is_empty() || amount.starts_with('-') {
        return Err(GatewayError::InvalidAmount(format!("'{}'", amount)));
    }
    parse_ether(amount).map_err(|e| GatewayError::InvalidAmount(format!("'{}': {}", amount, e)))
}

struct BoundContracts {
    subscription: CreatorSubscriptionManager<SignerClient>,
    paymaster: Option<Address>,
}

/// ethers 기반 게이트웨이
pub struct EthersGateway {
    contracts: Option<BoundContracts>,
    tx_timeout: Duration,
}

impl EthersGateway {
    /// 바인딩 없는 게이트웨이 (모든 호출이 `ContractUninitialized`)
    pub fn uninitialized(tx_timeout: Duration) -> Self {
        Self {
            contracts: None,
            tx_timeout,
        }
    }

    /// RPC 연결 후 컨트랙트 바인딩
    ///
    /// 주소나 서명 키가 설정되지 않았으면 에러 대신 uninitialized 게이트웨이를 반환한다.
    pub async fn connect(config: &Config) -> Result<Self> {
        let (Some(subscription_addr), Some(private_key)) = (
            config.subscription_contract_address.as_deref(),
            config.signer_private_key.as_deref(),
        ) else {
            tracing::warn!(
                "SUBSCRIPTION_CONTRACT_ADDRESS or SIGNER_PRIVATE_KEY not set; contract gateway disabled"
            );
            return Ok(Self::uninitialized(config.chain_tx_timeout));
        };

        let provider = Provider::<Http>::try_from(config.eth_rpc_url.as_str())
            .map_err(|e| anyhow!("Failed to create HTTP provider: {}", e))?;

        let chain_id = provider
            .get_chainid()
            .await
            .context("Failed to get chain ID")?
            .as_u64();

        let wallet = private_key
            .parse::<LocalWallet>()
            .map_err(|e| anyhow!("Invalid signer private key: {}", e))?
            .with_chain_id(chain_id);

        let subscription_address: Address = subscription_addr
            .parse()
            .map_err(|e| anyhow!("Invalid subscription contract address: {}", e))?;
        ensure_code(&provider, subscription_address).await?;

        let paymaster = match config.paymaster_contract_address.as_deref() {
            Some(addr) => {
                let address: Address = addr
                    .parse()
                    .map_err(|e| anyhow!("Invalid paymaster contract address: {}", e))?;
                ensure_code(&provider, address).await?;
                Some(address)
            }
            None => {
                tracing::warn!("PAYMASTER_CONTRACT_ADDRESS not set");
                None
            }
        };

        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        tracing::info!(
            chain_id,
            subscription = ?subscription_address,
            paymaster = ?paymaster,
            "Contracts bound"
        );

        Ok(Self::bind(
            client,
            subscription_address,
            paymaster,
            config.chain_tx_timeout,
        ))
    }

    /// 이미 구성된 client로 컨트랙트 바인딩 (코드 존재 확인 없음)
    pub fn bind(
        client: Arc<SignerClient>,
        subscription_address: Address,
        paymaster: Option<Address>,
        tx_timeout: Duration,
    ) -> Self {
        Self {
            contracts: Some(BoundContracts {
                subscription: CreatorSubscriptionManager::new(subscription_address, client),
                paymaster,
            }),
            tx_timeout,
        }
    }

    fn contracts(&self) -> Result<&BoundContracts, GatewayError> {
        self.contracts
            .as_ref()
            .ok_or(GatewayError::ContractUninitialized)
    }

    /// 전송 + 1 confirmation, timeout 적용
    async fn submit<D>(
        &self,
        call: ContractCall<SignerClient, D>,
    ) -> Result<TransactionReceipt, GatewayError>
    where
        D: Detokenize + Send + Sync + 'static,
    {
        let confirm = async move {
            let pending = call
                .send()
                .await
                .map_err(|e| GatewayError::TransactionFailed(e.to_string()))?;
            let tx_hash = pending.tx_hash();
            tracing::info!(?tx_hash, "Transaction sent");

            let receipt = pending
                .confirmations(1)
                .await
                .map_err(|e| GatewayError::TransactionFailed(e.to_string()))?
                .ok_or_else(|| GatewayError::TransactionFailed("transaction dropped".to_string()))?;

            if receipt.status != Some(U64::from(1)) {
                return Err(GatewayError::TransactionFailed(format!(
                    "transaction {:?} reverted",
                    tx_hash
                )));
            }
            Ok(receipt)
        };

        tokio::time::timeout(self.tx_timeout, confirm)
            .await
            .map_err(|_| GatewayError::Timeout(self.tx_timeout))?
    }
}

async fn ensure_code(provider: &Provider<Http>, address: Address) -> Result<()> {
    let code = provider
        .get_code(address, None)
        .await
        .context("Failed to get contract code")?;
    if code.is_empty() {
        return Err(anyhow!("No contract code at address {:?}", address));
    }
    Ok(())
}

#[async_trait]
impl ContractGateway for EthersGateway {
    fn status(&self) -> GatewayStatus {
        match &self.contracts {
            Some(c) => GatewayStatus {
                subscription_contract: true,
                paymaster: c.paymaster.is_some(),
            },
            None => GatewayStatus::default(),
        }
    }

    async fn create_tier(&self, price: &str, metadata: &str) -> Result<U256, GatewayError> {
        let contracts = self.contracts()?;
        let price_wei = to_wei(price)?;

        let call = contracts
            .subscription
            .create_subscription_tier(price_wei, metadata.to_string());
        let receipt = self.submit(call).await?;

        receipt
            .logs
            .into_iter()
            .find_map(|log| parse_log::<TierCreatedFilter>(log).ok())
            .map(|event| event.tier_id)
            .ok_or_else(|| {
                GatewayError::TransactionFailed("TierCreated event missing from receipt".to_string())
            })
    }

    async fn purchase_subscription(
        &self,
        creator: Address,
        tier_id: U256,
        amount: &str,
    ) -> Result<TxHash, GatewayError> {
        let contracts = self.contracts()?;
        let value = to_wei(amount)?;

        let call = contracts
            .subscription
            .purchase_subscription(creator, tier_id)
            .value(value);
        let receipt = self.submit(call).await?;

        Ok(receipt.transaction_hash)
    }
}
