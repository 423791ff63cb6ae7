//! Creator Subscription API Server
//!
//! # Startup Sequence
//!
//! ```text
//! Config::from_env ──▶ Store (Postgres + migrations | memory)
//!                          │
//!                          ▼
//!                 bootstrap_store (RESET_ON_STARTUP일 때만 전체 삭제)
//!                          │
//!                          ▼
//!        AuthService ──▶ EthersGateway::connect ──▶ Router ──▶ listen
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use creator_subs_api::{
    bootstrap_store, create_router, AppState, AuthService, Config, ContractGateway, Database,
    EthersGateway, MemoryStore, Store,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    // RUST_LOG=debug,sqlx=warn 형태로 레벨 제어 가능
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "creator_subs_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting Creator Subscription API Server");

    // 설정 로드 (필수 값 없으면 종료)
    let config = Config::from_env()?;
    tracing::info!(?config, "📋 Configuration loaded");

    // 저장소 연결
    let db: Arc<dyn Store> = if config.uses_memory_store() {
        tracing::warn!("🗄️  Using in-memory store; data is lost on restart");
        Arc::new(MemoryStore::new())
    } else {
        let db = Database::connect(&config.database_url).await?;
        tracing::info!("🗄️  Database connected");

        db.run_migrations().await?;
        tracing::info!("📦 Migrations completed");
        Arc::new(db)
    };

    bootstrap_store(db.as_ref(), &config).await?;

    // 서비스 초기화
    let auth = AuthService::new(&config.jwt_secret)?;
    tracing::info!("🔐 Auth service initialized");

    let chain: Arc<dyn ContractGateway> = match EthersGateway::connect(&config).await {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            // 조회 API는 체인 없이도 동작하므로 치명적이지 않음
            tracing::error!(error = ?e, "⛓️  Contract gateway unavailable");
            Arc::new(EthersGateway::uninitialized(config.chain_tx_timeout))
        }
    };

    let port = config.port;

    // 앱 상태 구성
    let state = AppState {
        db,
        auth: Arc::new(auth),
        chain,
        config: Arc::new(config),
    };

    // 라우터 구성
    let app = create_router(state);

    // 서버 시작
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("🌐 Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
