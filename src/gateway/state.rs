use std::sync::Arc;

use crate::db::Database;
use crate::transfer::TransferCoordinator;
use crate::user_auth::TokenVerifier;

/// Gateway shared state
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<TransferCoordinator>,
    pub token_verifier: Arc<TokenVerifier>,
    /// PostgreSQL (absent when running on in-memory stores)
    pub pg_db: Option<Arc<Database>>,
    pub bank_name: String,
}

impl AppState {
    pub fn new(
        coordinator: Arc<TransferCoordinator>,
        token_verifier: Arc<TokenVerifier>,
        bank_name: impl Into<String>,
    ) -> Self {
        Self {
            coordinator,
            token_verifier,
            pg_db: None,
            bank_name: bank_name.into(),
        }
    }

    pub fn with_database(mut self, db: Arc<Database>) -> Self {
        self.pg_db = Some(db);
        self
    }
}
