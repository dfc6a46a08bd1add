use std::sync::Arc;
use sow_storage::*;
use sow_store_postgres::PostgresStore;
use sow_store_sqlite::SqliteStore;

/// StoreBackend abstracts over SQLite and PostgreSQL implementations
#[derive(Clone)]
pub enum StoreBackend {
    Sqlite(Arc<SqliteStore>),
    Postgres(Arc<PostgresStore>),
}

impl StoreBackend {
    /// Open the backend named by the URL scheme: `postgres:` selects
    /// PostgreSQL, anything else is handed to SQLite.
    pub async fn connect(db_url: &str) -> Result<Self, StoreError> {
        if db_url.starts_with("postgres:") {
            Ok(StoreBackend::Postgres(Arc::new(PostgresStore::open(db_url).await?)))
        } else {
            Ok(StoreBackend::Sqlite(Arc::new(SqliteStore::open(db_url).await?)))
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StoreBackend::Sqlite(_) => "sqlite",
            StoreBackend::Postgres(_) => "postgres",
        }
    }
}

#[async_trait::async_trait]
impl Store for StoreBackend {
    async fn create_sow_with_token(
        &self,
        params: &CreateSowParams,
    ) -> Result<(Sow, SigningToken), StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.create_sow_with_token(params).await,
            StoreBackend::Postgres(s) => s.create_sow_with_token(params).await,
        }
    }

    async fn get_sow(&self, sow_id: &SowId) -> Result<Sow, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.get_sow(sow_id).await,
            StoreBackend::Postgres(s) => s.get_sow(sow_id).await,
        }
    }

    async fn list_sows(&self) -> Result<Vec<Sow>, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.list_sows().await,
            StoreBackend::Postgres(s) => s.list_sows().await,
        }
    }

    async fn delete_sow(&self, sow_id: &SowId) -> Result<(), StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.delete_sow(sow_id).await,
            StoreBackend::Postgres(s) => s.delete_sow(sow_id).await,
        }
    }

    async fn issue_token(&self, params: &IssueTokenParams) -> Result<SigningToken, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.issue_token(params).await,
            StoreBackend::Postgres(s) => s.issue_token(params).await,
        }
    }

    async fn get_token(&self, token: &str) -> Result<SigningToken, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.get_token(token).await,
            StoreBackend::Postgres(s) => s.get_token(token).await,
        }
    }

    async fn list_tokens(&self, sow_id: &SowId) -> Result<Vec<SigningToken>, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.list_tokens(sow_id).await,
            StoreBackend::Postgres(s) => s.list_tokens(sow_id).await,
        }
    }

    async fn complete_signing(&self, params: &CompleteSigningParams) -> Result<Sow, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.complete_signing(params).await,
            StoreBackend::Postgres(s) => s.complete_signing(params).await,
        }
    }
}
