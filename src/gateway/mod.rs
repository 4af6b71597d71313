pub mod handlers;
pub mod state;
pub mod types;

use anyhow::Context;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::account::{AccountLedger, MemoryLedger, PgLedger};
use crate::config::AppConfig;
use crate::db::Database;
use crate::registry::{
    PgSnapshotStore, RegistryRefresher, RegistrySnapshot, RegistrySyncWorker, RemoteBankRegistry,
    SnapshotStore, directory,
};
use crate::transfer::{
    LoggingSettlementClient, MemoryTransferStore, PgTransferStore, TransferCoordinator,
    TransferStore,
};
use crate::user_auth::{TokenVerifier, jwt_auth_middleware};
use state::AppState;

/// Build the HTTP router
pub fn router(state: Arc<AppState>) -> Router {
    // Bearer token required
    let transfer_routes = Router::new()
        .route(
            "/transfer",
            post(handlers::create_transfer).get(handlers::list_transfers),
        )
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(transfer_routes)
        .with_state(state)
}

/// Wire ledger, stores, registry and coordinator from configuration
///
/// PostgreSQL-backed when `postgres_url` is set, in-memory otherwise.
pub async fn build_state(config: &AppConfig) -> anyhow::Result<Arc<AppState>> {
    let directory = directory::from_config(&config.central_bank)
        .context("Failed to create central directory client")?;

    let mut pg_db: Option<Arc<Database>> = None;
    let ledger: Arc<dyn AccountLedger>;
    let store: Arc<dyn TransferStore>;
    let mut snapshot_store: Option<Arc<dyn SnapshotStore>> = None;

    match &config.postgres_url {
        Some(url) => {
            let db = Database::connect(url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            crate::db::schema::ensure_schema(db.pool()).await?;
            let pool = db.pool().clone();
            ledger = Arc::new(PgLedger::new(pool.clone()));
            store = Arc::new(PgTransferStore::new(pool.clone()));
            snapshot_store = Some(Arc::new(PgSnapshotStore::new(pool)));
            pg_db = Some(Arc::new(db));
        }
        None => {
            tracing::warn!(
                seed_accounts = config.seed_accounts.len(),
                "postgres_url not set, using in-memory ledger and transfer log"
            );
            ledger = Arc::new(MemoryLedger::with_accounts(config.seed_accounts.clone()));
            store = Arc::new(MemoryTransferStore::new());
        }
    }

    // Seed from the last persisted snapshot so remote lookups work before the first refresh
    let registry = match &snapshot_store {
        Some(store) => match store.load().await {
            Ok(banks) => {
                tracing::info!(banks = banks.len(), "Registry seeded from persisted snapshot");
                RemoteBankRegistry::with_snapshot(RegistrySnapshot::from_banks(banks))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not load persisted registry snapshot");
                RemoteBankRegistry::new()
            }
        },
        None => RemoteBankRegistry::new(),
    };

    let mut refresher = RegistryRefresher::new(
        Arc::new(registry),
        directory,
        config.central_bank.timeout(),
    );
    if let Some(store) = snapshot_store {
        refresher = refresher.with_store(store);
    }

    let coordinator = Arc::new(TransferCoordinator::new(
        config.bank.prefix.clone(),
        ledger,
        store,
        Arc::new(refresher),
        Arc::new(LoggingSettlementClient),
    ));

    let mut state = AppState::new(
        coordinator,
        Arc::new(TokenVerifier::new(&config.jwt_secret)),
        config.bank.name.clone(),
    );
    if let Some(db) = pg_db {
        state = state.with_database(db);
    }
    Ok(Arc::new(state))
}

/// Start registry warm-up and, if configured, the periodic sync worker
pub fn spawn_registry_sync(state: &AppState, interval: Option<Duration>) {
    let refresher = state.coordinator.refresher().clone();

    let warm_up = RegistrySyncWorker::new(refresher.clone(), Duration::ZERO);
    tokio::spawn(async move {
        warm_up.warm_up().await;
    });

    if let Some(interval) = interval {
        let worker = RegistrySyncWorker::new(refresher, interval);
        tokio::spawn(async move {
            worker.run().await;
        });
    }
}

/// Start HTTP Gateway server
pub async fn run_server(config: &AppConfig) -> anyhow::Result<()> {
    let state = build_state(config).await?;
    spawn_registry_sync(&state, config.central_bank.refresh_interval());

    let refresher = state.coordinator.refresher().clone();
    let app = router(state);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(
        addr = %addr,
        bank = %config.bank.name,
        bank_prefix = %config.bank.prefix,
        "Gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
            refresher.cancel_in_flight();
        })
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::registry::FixtureDirectory;
    use crate::registry::RemoteBank;
    use crate::user_auth::issue_token;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const SECRET: &str = "test-secret";

    fn test_app() -> Router {
        let ledger = Arc::new(MemoryLedger::with_accounts([
            Account::new("alice", "111alice01", 100, "EUR"),
            Account::new("bob", "111bob0001", 10, "EUR"),
        ]));
        let foo = RemoteBank::from_json(json!({
            "name": "fooBank",
            "transactionUrl": "http://foobank.example/transactions/b2b",
            "apiKey": "key",
            "bankPrefix": "755",
            "jwksUrl": "http://foobank.example/jwks.json"
        }))
        .unwrap();
        let refresher = RegistryRefresher::new(
            Arc::new(RemoteBankRegistry::new()),
            Arc::new(FixtureDirectory::new(vec![foo])),
            Duration::from_secs(1),
        );
        let coordinator = Arc::new(TransferCoordinator::new(
            "111",
            ledger,
            Arc::new(MemoryTransferStore::new()),
            Arc::new(refresher),
            Arc::new(LoggingSettlementClient),
        ));
        let state = AppState::new(coordinator, Arc::new(TokenVerifier::new(SECRET)), "Local Pank");
        router(Arc::new(state))
    }

    fn bearer(user: &str, name: &str) -> String {
        format!("Bearer {}", issue_token(SECRET, user, name, 3600).unwrap())
    }

    fn post_transfer(auth: Option<String>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/transfer")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn transfer_json(to: &str, amount: i64) -> String {
        json!({
            "accountFrom": "111alice01",
            "accountTo": to,
            "amount": amount,
            "currency": "EUR",
            "explanation": "dinner"
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_local_transfer_returns_201() {
        let response = test_app()
            .oneshot(post_transfer(
                Some(bearer("alice", "Alice")),
                &transfer_json("111bob0001", 40),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Local transfer completed!");
        assert_eq!(body["transfer"]["status"], "completed");
        assert_eq!(body["transfer"]["senderName"], "Alice");
    }

    #[tokio::test]
    async fn test_remote_transfer_returns_201() {
        let response = test_app()
            .oneshot(post_transfer(
                Some(bearer("alice", "Alice")),
                &transfer_json("755remote1", 40),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Remote transfer added!");
        assert_eq!(body["transfer"]["status"], "submitted");
    }

    #[tokio::test]
    async fn test_missing_token_is_401() {
        let response = test_app()
            .oneshot(post_transfer(None, &transfer_json("111bob0001", 40)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["code"], "NOT_AUTHENTICATED");
    }

    #[tokio::test]
    async fn test_bad_token_is_401() {
        let response = test_app()
            .oneshot(post_transfer(
                Some("Bearer garbage".to_string()),
                &transfer_json("111bob0001", 40),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let response = test_app()
            .oneshot(post_transfer(
                Some(bearer("alice", "Alice")),
                r#"{"accountFrom": "111alice01", "amount": "lots"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_validation_error_names_field() {
        let body = json!({
            "accountFrom": "111alice01",
            "accountTo": "111bob0001",
            "amount": 10,
            "currency": "eur",
            "explanation": "dinner"
        })
        .to_string();
        let response = test_app()
            .oneshot(post_transfer(Some(bearer("alice", "Alice")), &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["field"], "currency");
    }

    #[tokio::test]
    async fn test_insufficient_funds_is_409() {
        let response = test_app()
            .oneshot(post_transfer(
                Some(bearer("alice", "Alice")),
                &transfer_json("111bob0001", 101),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["error"], "Insufficent funds!");
    }

    #[tokio::test]
    async fn test_history_and_health() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(post_transfer(
                Some(bearer("alice", "Alice")),
                &transfer_json("111bob0001", 5),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/transfer")
                    .header(header::AUTHORIZATION, bearer("alice", "Alice"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["bankPrefix"], "111");
        assert_eq!(body["database"], "disabled");
    }
}
