//! Router-level tests
//!
//! 실제 `Router`에 `MemoryStore`와 가짜 게이트웨이를 주입해서 요청을 보낸다.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
        Method, Request, StatusCode,
    },
    Router,
};
use chrono::Utc;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TxHash, U256};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use creator_subs_api::{
    bootstrap_store,
    db::{
        CollectionCounts, CreatorProfile, NewPost, NewProfile, NewSubscription, NewTier, Post,
        ProfileUpdate, StoreError, StoreResult, Subscription, SubscriptionStatus, Tier,
    },
    services::{to_wei, GatewayError, GatewayStatus, TOKEN_TTL_HOURS},
    AppState, AuthService, Config, ContractGateway, EthersGateway, MemoryStore, Store,
};

const SECRET: &str = "test-secret";
const CLIENT_ID: &str = "client-123";

// Hardhat accounts #0 / #1
const CREATOR_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const CREATOR: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
const FAN_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
const FAN: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

// ============ Fixtures ============

#[derive(Default)]
struct FakeGateway {
    next_tier: AtomicU64,
    purchases: Mutex<Vec<(Address, U256, String)>>,
}

#[async_trait]
impl ContractGateway for FakeGateway {
    fn status(&self) -> GatewayStatus {
        GatewayStatus {
            subscription_contract: true,
            paymaster: true,
        }
    }

    async fn create_tier(&self, price: &str, _metadata: &str) -> Result<U256, GatewayError> {
        to_wei(price)?;
        Ok(U256::from(self.next_tier.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn purchase_subscription(
        &self,
        creator: Address,
        tier_id: U256,
        amount: &str,
    ) -> Result<TxHash, GatewayError> {
        to_wei(amount)?;
        self.purchases
            .lock()
            .unwrap()
            .push((creator, tier_id, amount.to_string()));
        Ok(TxHash::repeat_byte(0xab))
    }
}

/// 모든 호출이 confirmation 대기 중 timeout
struct StalledGateway;

#[async_trait]
impl ContractGateway for StalledGateway {
    fn status(&self) -> GatewayStatus {
        GatewayStatus {
            subscription_contract: true,
            paymaster: false,
        }
    }

    async fn create_tier(&self, _price: &str, _metadata: &str) -> Result<U256, GatewayError> {
        Err(GatewayError::Timeout(Duration::from_secs(60)))
    }

    async fn purchase_subscription(
        &self,
        _creator: Address,
        _tier_id: U256,
        _amount: &str,
    ) -> Result<TxHash, GatewayError> {
        Err(GatewayError::Timeout(Duration::from_secs(60)))
    }
}

/// 티어/구독 insert만 실패하는 저장소
struct BrokenWrites(Arc<MemoryStore>);

#[async_trait]
impl Store for BrokenWrites {
    async fn health_check(&self) -> StoreResult<()> {
        self.0.health_check().await
    }
    async fn insert_profile(&self, profile: NewProfile) -> StoreResult<CreatorProfile> {
        self.0.insert_profile(profile).await
    }
    async fn find_profile_by_address(&self, address: &str) -> StoreResult<Option<CreatorProfile>> {
        self.0.find_profile_by_address(address).await
    }
    async fn list_profiles(&self) -> StoreResult<Vec<CreatorProfile>> {
        self.0.list_profiles().await
    }
    async fn update_profile(
        &self,
        address: &str,
        update: ProfileUpdate,
    ) -> StoreResult<Option<CreatorProfile>> {
        self.0.update_profile(address, update).await
    }
    async fn insert_tier(&self, _tier: NewTier) -> StoreResult<Tier> {
        Err(StoreError::Backend("connection reset".to_string()))
    }
    async fn find_tiers_by_creator(&self, creator: Uuid) -> StoreResult<Vec<Tier>> {
        self.0.find_tiers_by_creator(creator).await
    }
    async fn find_tier_by_chain_id(
        &self,
        creator: Uuid,
        chain_tier_id: &str,
    ) -> StoreResult<Option<Tier>> {
        self.0.find_tier_by_chain_id(creator, chain_tier_id).await
    }
    async fn insert_post(&self, post: NewPost) -> StoreResult<Post> {
        self.0.insert_post(post).await
    }
    async fn find_posts_by_creator(&self, creator: Uuid) -> StoreResult<Vec<Post>> {
        self.0.find_posts_by_creator(creator).await
    }
    async fn insert_subscription(&self, _subscription: NewSubscription) -> StoreResult<Subscription> {
        Err(StoreError::Backend("connection reset".to_string()))
    }
    async fn find_subscriptions_by_subscriber(
        &self,
        subscriber: &str,
    ) -> StoreResult<Vec<Subscription>> {
        self.0.find_subscriptions_by_subscriber(subscriber).await
    }
    async fn counts(&self) -> StoreResult<CollectionCounts> {
        self.0.counts().await
    }
    async fn reset(&self) -> StoreResult<CollectionCounts> {
        self.0.reset().await
    }
}

fn test_config(reset_on_startup: bool) -> Config {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("memory://".to_string()),
        "WEB3AUTH_CLIENT_ID" => Some(CLIENT_ID.to_string()),
        "JWT_SECRET" => Some(SECRET.to_string()),
        "RESET_ON_STARTUP" => reset_on_startup.then(|| "true".to_string()),
        _ => None,
    })
    .unwrap()
}

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    auth: Arc<AuthService>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_gateway(Arc::new(FakeGateway::default()))
    }

    fn with_gateway(chain: Arc<dyn ContractGateway>) -> Self {
        Self::with_parts(chain, test_config(false), |store| store)
    }

    /// `wrap`으로 저장소를 감싸서 주입. `self.store`는 감싸기 전 원본
    fn with_parts(
        chain: Arc<dyn ContractGateway>,
        config: Config,
        wrap: impl FnOnce(Arc<MemoryStore>) -> Arc<dyn Store>,
    ) -> Self {
        let store = Arc::new(MemoryStore::new());
        let auth = Arc::new(AuthService::new(SECRET).unwrap());
        let state = AppState {
            db: wrap(store.clone()),
            auth: auth.clone(),
            chain,
            config: Arc::new(config),
        };
        Self {
            router: creator_subs_api::create_router(state),
            store,
            auth,
        }
    }

    fn token(&self, address: &str) -> String {
        self.auth.issue_token(address).unwrap()
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn create_profile(&self, address: &str, name: &str) -> Value {
        let token = self.token(address);
        let (status, body) = self
            .send(
                Method::POST,
                "/creator/profile",
                Some(&token),
                Some(json!({ "name": name, "category": "music" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["profile"].clone()
    }
}

// ============ Profiles ============

#[tokio::test]
async fn profile_lookup_ignores_address_case() {
    let app = TestApp::new();
    let profile = app.create_profile("0xAbCdEf", "Alice").await;
    assert_eq!(profile["address"], "0xabcdef");

    let (s1, upper) = app.send(Method::GET, "/creator/profile/0xABCDEF", None, None).await;
    let (s2, lower) = app.send(Method::GET, "/creator/profile/0xabcdef", None, None).await;
    assert_eq!(s1, StatusCode::OK);
    assert_eq!(s2, StatusCode::OK);
    assert_eq!(upper, lower);
}

#[tokio::test]
async fn unknown_profile_is_404() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/creator/profile/0xnobody", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn create_profile_requires_token_and_fields() {
    let app = TestApp::new();

    let (status, _) = app
        .send(
            Method::POST,
            "/creator/profile",
            None,
            Some(json!({ "name": "A", "category": "art" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Method::POST,
            "/creator/profile",
            Some("garbage"),
            Some(json!({ "name": "A", "category": "art" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.token("0xabc");
    let (status, _) = app
        .send(Method::POST, "/creator/profile", Some(&token), Some(json!({ "name": "A" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/creator/profile",
            Some(&token),
            Some(json!({ "name": "A", "category": "art", "featured": "sometimes" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_profile_is_conflict() {
    let app = TestApp::new();
    app.create_profile("0xabc", "Alice").await;

    let token = app.token("0xABC");
    let (status, _) = app
        .send(
            Method::POST,
            "/creator/profile",
            Some(&token),
            Some(json!({ "name": "Again", "category": "art" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn profile_body_cannot_override_token_address() {
    let app = TestApp::new();
    let token = app.token("0xabc");
    let (_, body) = app
        .send(
            Method::POST,
            "/creator/profile",
            Some(&token),
            Some(json!({ "address": "0xevil", "name": "A", "category": "art" })),
        )
        .await;
    assert_eq!(body["profile"]["address"], "0xabc");
}

#[tokio::test]
async fn update_by_non_owner_is_forbidden_and_does_not_mutate() {
    let app = TestApp::new();
    app.create_profile("0xabc", "Alice").await;

    let intruder = app.token("0xdef");
    let (status, _) = app
        .send(
            Method::PUT,
            "/creator/profile/0xabc",
            Some(&intruder),
            Some(json!({ "name": "Hacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, profile) = app.send(Method::GET, "/creator/profile/0xabc", None, None).await;
    assert_eq!(profile["name"], "Alice");
}

#[tokio::test]
async fn owner_update_merges_fields() {
    let app = TestApp::new();
    app.create_profile("0xabc", "Alice").await;

    // 경로 주소 대소문자가 달라도 소유자
    let owner = app.token("0xabc");
    let (status, profile) = app
        .send(
            Method::PUT,
            "/creator/profile/0xABC",
            Some(&owner),
            Some(json!({ "description": "new bio", "featured": "yes", "twitter": "@alice" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["name"], "Alice");
    assert_eq!(profile["category"], "music");
    assert_eq!(profile["description"], "new bio");
    assert_eq!(profile["featured"], "yes");
    assert_eq!(profile["socialLinks"]["twitter"], "@alice");
}

#[tokio::test]
async fn update_missing_profile_is_404() {
    let app = TestApp::new();
    let owner = app.token("0xabc");
    let (status, _) = app
        .send(
            Method::PUT,
            "/creator/profile/0xabc",
            Some(&owner),
            Some(json!({ "name": "Ghost" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn creators_are_returned_unfiltered() {
    let app = TestApp::new();
    let n = 7;
    for i in 0..n {
        let token = app.token(&format!("0x{:03}", i));
        let featured = if i % 3 == 0 { "yes" } else { "no" };
        let (status, _) = app
            .send(
                Method::POST,
                "/creator/profile",
                Some(&token),
                Some(json!({ "name": format!("c{}", i), "category": "art", "featured": featured })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app.send(Method::GET, "/creators", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let creators = body.as_array().unwrap();
    assert_eq!(creators.len(), n);
    assert!(creators.iter().any(|c| c["featured"] == "no"));
    assert!(creators.iter().any(|c| c["featured"] == "yes"));
}

// ============ Auth ============

#[tokio::test]
async fn verify_accepts_fresh_and_rejects_expired_tokens() {
    let app = TestApp::new();

    let fresh = app.token("0xABC");
    let (status, body) = app
        .send(Method::POST, "/auth/verify", None, Some(json!({ "token": fresh })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "valid": true, "address": "0xabc" }));

    let issued = Utc::now() - chrono::Duration::hours(TOKEN_TTL_HOURS) - chrono::Duration::minutes(1);
    let expired = app.auth.issue_token_at("0xabc", issued).unwrap();
    let (status, body) = app
        .send(Method::POST, "/auth/verify", None, Some(json!({ "token": expired })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "valid": false }));

    let (status, _) = app.send(Method::POST, "/auth/verify", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wallet_login_issues_token() {
    let app = TestApp::new();
    let wallet: LocalWallet = CREATOR_KEY.parse().unwrap();
    let message = format!("Sign in to {} at {}", CLIENT_ID, Utc::now().timestamp());
    let signature = wallet.sign_message(message.as_str()).await.unwrap();

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({
                "address": "0xF39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
                "message": message,
                "signature": signature.to_string(),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["address"], CREATOR);

    let token = body["token"].as_str().unwrap();
    assert_eq!(app.auth.verify_token(token).unwrap(), CREATOR);
}

#[tokio::test]
async fn wallet_login_rejects_bad_signatures() {
    let app = TestApp::new();
    let other: LocalWallet = FAN_KEY.parse().unwrap();
    let message = format!("Sign in to {}", CLIENT_ID);
    let signature = other.sign_message(message.as_str()).await.unwrap();

    // 다른 키로 서명
    let (status, _) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "address": CREATOR, "message": message, "signature": signature.to_string() })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // client id 없는 메시지
    let unbound = other.sign_message("hello").await.unwrap();
    let (status, _) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "address": FAN, "message": "hello", "signature": unbound.to_string() })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 필드 누락
    let (status, _) = app
        .send(Method::POST, "/auth/login", None, Some(json!({ "address": FAN })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============ Tiers / subscriptions ============

#[tokio::test]
async fn created_tier_is_listed_for_creator() {
    let app = TestApp::new();
    app.create_profile("0xabc", "Alice").await;

    let token = app.token("0xabc");
    let (status, body) = app
        .send(
            Method::POST,
            "/creator/tier",
            Some(&token),
            Some(json!({ "price": 10, "benefits": ["x"], "metadata": "Gold" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["tierId"], "1");

    let (status, tiers) = app.send(Method::GET, "/creator/tiers/0xabc", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let tiers = tiers.as_array().unwrap();
    assert_eq!(tiers.len(), 1);
    assert_eq!(tiers[0]["price"], 10.0);
    assert_eq!(tiers[0]["benefits"], json!(["x"]));
    assert_eq!(tiers[0]["name"], "Gold");
    assert_eq!(tiers[0]["chainTierId"], "1");
}

#[tokio::test]
async fn tiers_for_unknown_creator_are_empty() {
    let app = TestApp::new();
    let (status, tiers) = app.send(Method::GET, "/creator/tiers/0xnobody", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tiers, json!([]));
}

#[tokio::test]
async fn tier_requires_profile_and_valid_price() {
    let app = TestApp::new();
    let token = app.token("0xabc");

    let (status, _) = app
        .send(Method::POST, "/creator/tier", Some(&token), Some(json!({ "price": 1 })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.create_profile("0xabc", "Alice").await;
    let (status, _) = app
        .send(Method::POST, "/creator/tier", Some(&token), Some(json!({ "price": -1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::POST, "/creator/tier", Some(&token), Some(json!({ "benefits": [] })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tier_creation_without_bound_contract_fails_and_persists_nothing() {
    let app = TestApp::with_gateway(Arc::new(EthersGateway::uninitialized(Duration::from_secs(1))));
    app.create_profile("0xabc", "Alice").await;

    let token = app.token("0xabc");
    let (status, body) = app
        .send(Method::POST, "/creator/tier", Some(&token), Some(json!({ "price": 1 })))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "CONTRACT_ERROR");
    assert_eq!(app.store.counts().await.unwrap().tiers, 0);
}

#[tokio::test]
async fn subscribe_records_subscription_for_caller() {
    let app = TestApp::new();
    app.create_profile(CREATOR, "Alice").await;
    let creator_token = app.token(CREATOR);
    let (_, tier) = app
        .send(
            Method::POST,
            "/creator/tier",
            Some(&creator_token),
            Some(json!({ "price": 0.5, "name": "Gold", "benefits": ["a", "b"] })),
        )
        .await;
    let tier_id = tier["tierId"].as_str().unwrap().to_string();

    let fan_token = app.token(FAN);
    let (status, body) = app
        .send(
            Method::POST,
            "/subscribe",
            Some(&fan_token),
            Some(json!({ "creator": CREATOR, "tierId": tier_id.parse::<u64>().unwrap(), "amount": "0.5" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["subscription"]["status"], "active");
    assert_eq!(body["subscription"]["subscriber"], FAN);
    assert!(body["subscription"]["endDate"].is_string());

    let (status, subs) = app.send(Method::GET, "/subscriptions", Some(&fan_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(subs.as_array().unwrap().len(), 1);

    // 크리에이터 본인의 구독 목록은 비어 있음
    let (_, subs) = app.send(Method::GET, "/subscriptions", Some(&creator_token), None).await;
    assert_eq!(subs, json!([]));
}

#[tokio::test]
async fn subscribe_validates_input() {
    let app = TestApp::new();
    app.create_profile(CREATOR, "Alice").await;
    let fan_token = app.token(FAN);

    let cases = [
        (json!({ "creator": CREATOR, "tierId": 1 }), StatusCode::BAD_REQUEST),
        (json!({ "creator": "0xabc", "tierId": 1, "amount": 1 }), StatusCode::BAD_REQUEST),
        (json!({ "creator": CREATOR, "tierId": "one", "amount": 1 }), StatusCode::BAD_REQUEST),
        (json!({ "creator": CREATOR, "tierId": 1, "amount": "lots" }), StatusCode::BAD_REQUEST),
        (json!({ "creator": CREATOR, "tierId": 99, "amount": 1 }), StatusCode::NOT_FOUND),
        (json!({ "creator": FAN, "tierId": 1, "amount": 1 }), StatusCode::NOT_FOUND),
    ];
    for (body, expected) in cases {
        let (status, _) = app
            .send(Method::POST, "/subscribe", Some(&fan_token), Some(body.clone()))
            .await;
        assert_eq!(status, expected, "{}", body);
    }

    let (status, _) = app.send(Method::GET, "/subscriptions", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============ Posts ============

#[tokio::test]
async fn gated_posts_unlock_for_subscribers_only() {
    let app = TestApp::new();
    app.create_profile(CREATOR, "Alice").await;
    let creator_token = app.token(CREATOR);

    let (_, tier) = app
        .send(
            Method::POST,
            "/creator/tier",
            Some(&creator_token),
            Some(json!({ "price": 1, "name": "Gold" })),
        )
        .await;
    let tier_uuid = tier["tier"]["id"].clone();
    let chain_id = tier["tierId"].as_str().unwrap().to_string();

    for (title, tiers) in [("public", json!([])), ("members", json!([tier_uuid]))] {
        let (status, body) = app
            .send(
                Method::POST,
                "/creator/post",
                Some(&creator_token),
                Some(json!({ "title": title, "content": "hello", "visibleToTiers": tiers })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }

    let find = |posts: &Value, title: &str| -> Value {
        posts
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["title"] == title)
            .cloned()
            .unwrap()
    };

    // 익명
    let (_, posts) = app.send(Method::GET, &format!("/creator/posts/{}", CREATOR), None, None).await;
    assert_eq!(find(&posts, "public")["locked"], false);
    let members = find(&posts, "members");
    assert_eq!(members["locked"], true);
    assert_eq!(members["content"], "");

    // 구독 후
    let fan_token = app.token(FAN);
    let (status, _) = app
        .send(
            Method::POST,
            "/subscribe",
            Some(&fan_token),
            Some(json!({ "creator": CREATOR, "tierId": chain_id, "amount": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, posts) = app
        .send(Method::GET, &format!("/creator/posts/{}", CREATOR), Some(&fan_token), None)
        .await;
    let members = find(&posts, "members");
    assert_eq!(members["locked"], false);
    assert_eq!(members["content"], "hello");

    // 크리에이터 본인
    let (_, posts) = app
        .send(Method::GET, &format!("/creator/posts/{}", CREATOR), Some(&creator_token), None)
        .await;
    assert_eq!(find(&posts, "members")["locked"], false);
}

#[tokio::test]
async fn post_requires_non_blank_title_and_content() {
    let app = TestApp::new();
    app.create_profile("0xabc", "Alice").await;
    let token = app.token("0xabc");

    for body in [
        json!({ "title": "t", "content": "" }),
        json!({ "title": "t", "content": "   " }),
        json!({ "title": " ", "content": "c" }),
        json!({ "title": "t" }),
    ] {
        let (status, _) = app
            .send(Method::POST, "/creator/post", Some(&token), Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    }
    assert_eq!(app.store.counts().await.unwrap().posts, 0);
}

#[tokio::test]
async fn post_rejects_foreign_tiers() {
    let app = TestApp::new();
    app.create_profile("0xabc", "Alice").await;
    let token = app.token("0xabc");

    let (status, _) = app
        .send(
            Method::POST,
            "/creator/post",
            Some(&token),
            Some(json!({ "title": "t", "content": "c", "visibleToTiers": [uuid::Uuid::new_v4()] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============ Startup / misc ============

#[tokio::test]
async fn reset_on_startup_wipes_all_collections() {
    let store = MemoryStore::new();
    let profile = store
        .insert_profile(NewProfile {
            address: "0xabc".to_string(),
            name: "Alice".to_string(),
            category: "art".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let tier = store
        .insert_tier(NewTier {
            creator: profile.id,
            chain_tier_id: Some("1".to_string()),
            name: "Gold".to_string(),
            price: 1.0,
            benefits: vec![],
        })
        .await
        .unwrap();
    store
        .insert_post(NewPost {
            creator: profile.id,
            title: "t".to_string(),
            content: "c".to_string(),
            visible_to_tiers: vec![],
            attachments: vec![],
        })
        .await
        .unwrap();
    store
        .insert_subscription(NewSubscription {
            subscriber: FAN.to_string(),
            creator: profile.id,
            tier: tier.id,
            start_date: Utc::now(),
            end_date: None,
            status: SubscriptionStatus::Active,
            tx_hash: None,
        })
        .await
        .unwrap();

    // 플래그가 없으면 유지
    let kept = tokio_test::assert_ok!(bootstrap_store(&store, &test_config(false)).await);
    assert!(kept.is_none());
    assert_eq!(store.counts().await.unwrap().total(), 4);

    let deleted = tokio_test::assert_ok!(bootstrap_store(&store, &test_config(true)).await).unwrap();
    assert_eq!(deleted.total(), 4);
    assert_eq!(store.counts().await.unwrap().total(), 0);
}

#[tokio::test]
async fn health_and_security_headers() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[X_CONTENT_TYPE_OPTIONS], "nosniff");

    let (_, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["connected"], true);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::post("/auth/verify")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============ Chain / store failures ============

/// 크리에이터 프로필과 온체인 id "1" 티어를 저장소에 직접 준비
async fn seed_creator_with_tier(store: &MemoryStore) {
    let profile = store
        .insert_profile(NewProfile {
            address: CREATOR.to_string(),
            name: "Alice".to_string(),
            category: "music".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    store
        .insert_tier(NewTier {
            creator: profile.id,
            chain_tier_id: Some("1".to_string()),
            name: "Gold".to_string(),
            price: 1.0,
            benefits: vec![],
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn chain_timeout_is_contract_error_and_persists_nothing() {
    let app = TestApp::with_gateway(Arc::new(StalledGateway));
    seed_creator_with_tier(&app.store).await;
    let before = app.store.counts().await.unwrap();

    let creator_token = app.token(CREATOR);
    let (status, body) = app
        .send(Method::POST, "/creator/tier", Some(&creator_token), Some(json!({ "price": 2 })))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "CONTRACT_ERROR");

    let fan_token = app.token(FAN);
    let (status, body) = app
        .send(
            Method::POST,
            "/subscribe",
            Some(&fan_token),
            Some(json!({ "creator": CREATOR, "tierId": 1, "amount": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "CONTRACT_ERROR");

    let after = app.store.counts().await.unwrap();
    assert_eq!(after.tiers, before.tiers);
    assert_eq!(after.subscriptions, 0);
}

#[tokio::test]
async fn out_of_range_period_fails_before_payment() {
    let gateway = Arc::new(FakeGateway::default());
    let mut config = test_config(false);
    config.subscription_period_days = 200_000_000;
    let app = TestApp::with_parts(gateway.clone(), config, |store| store);
    seed_creator_with_tier(&app.store).await;

    let fan_token = app.token(FAN);
    let (status, body) = app
        .send(
            Method::POST,
            "/subscribe",
            Some(&fan_token),
            Some(json!({ "creator": CREATOR, "tierId": 1, "amount": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert!(gateway.purchases.lock().unwrap().is_empty());
    assert_eq!(app.store.counts().await.unwrap().subscriptions, 0);
}

#[tokio::test]
async fn store_failure_after_confirmation_is_database_error() {
    let gateway = Arc::new(FakeGateway::default());
    let app = TestApp::with_parts(gateway.clone(), test_config(false), |store| {
        Arc::new(BrokenWrites(store))
    });
    seed_creator_with_tier(&app.store).await;

    let creator_token = app.token(CREATOR);
    let (status, body) = app
        .send(Method::POST, "/creator/tier", Some(&creator_token), Some(json!({ "price": 2 })))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "DATABASE_ERROR");

    let fan_token = app.token(FAN);
    let (status, body) = app
        .send(
            Method::POST,
            "/subscribe",
            Some(&fan_token),
            Some(json!({ "creator": CREATOR, "tierId": 1, "amount": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "DATABASE_ERROR");

    // 결제는 확정된 상태
    assert_eq!(gateway.purchases.lock().unwrap().len(), 1);
    assert_eq!(app.store.counts().await.unwrap().subscriptions, 0);
}
