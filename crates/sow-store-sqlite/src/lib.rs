use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, SqliteConnection, SqlitePool};
use uuid::Uuid;
use sow_storage::{
    CompleteSigningParams, CreateSowParams, IssueTokenParams, SigningToken, SigningTokenId, Sow,
    SowData, SowId, SowStatus, Store, StoreError,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const SOW_COLUMNS: &str = "id, client_name, client_email, data, provider_signature, \
     provider_signed_at, client_signature, client_signed_at, status, created_at, updated_at";

const TOKEN_COLUMNS: &str = "id, token, sow_id, expires_at, used, used_at, created_at";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open("sqlite::memory:").await
    }

    /// Open (and migrate) the database at `url`.
    ///
    /// The pool holds a single connection: SQLite serializes writers anyway, and an
    /// in-memory database only exists on the connection that created it.
    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(db_err)?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { pool })
    }
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn unique_err(e: sqlx::Error) -> StoreError {
    let s = e.to_string();
    if s.contains("UNIQUE") {
        StoreError::AlreadyExists
    } else {
        StoreError::Backend(s)
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Backend(format!("timestamp out of range: {}", ms)))
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::try_parse(s).map_err(|e| StoreError::Backend(e.to_string()))
}

#[derive(sqlx::FromRow)]
struct SowRow {
    id: String,
    client_name: String,
    client_email: String,
    data: String,
    provider_signature: String,
    provider_signed_at: i64,
    client_signature: Option<String>,
    client_signed_at: Option<i64>,
    status: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SowRow> for Sow {
    type Error = StoreError;

    fn try_from(row: SowRow) -> Result<Self, Self::Error> {
        let data: SowData =
            serde_json::from_str(&row.data).map_err(|e| StoreError::Backend(e.to_string()))?;
        let status = row
            .status
            .parse::<SowStatus>()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Sow {
            id: SowId(parse_uuid(&row.id)?),
            client_name: row.client_name,
            client_email: row.client_email,
            data,
            provider_signature: row.provider_signature,
            provider_signed_at: from_millis(row.provider_signed_at)?,
            client_signature: row.client_signature,
            client_signed_at: row.client_signed_at.map(from_millis).transpose()?,
            status,
            created_at: from_millis(row.created_at)?,
            updated_at: from_millis(row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: String,
    token: String,
    sow_id: String,
    expires_at: i64,
    used: bool,
    used_at: Option<i64>,
    created_at: i64,
}

impl TryFrom<TokenRow> for SigningToken {
    type Error = StoreError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        Ok(SigningToken {
            id: SigningTokenId(parse_uuid(&row.id)?),
            token: row.token,
            sow_id: SowId(parse_uuid(&row.sow_id)?),
            expires_at: from_millis(row.expires_at)?,
            used: row.used,
            used_at: row.used_at.map(from_millis).transpose()?,
            created_at: from_millis(row.created_at)?,
        })
    }
}

async fn fetch_sow(conn: &mut SqliteConnection, sow_id: &SowId) -> Result<Sow, StoreError> {
    let row = sqlx::query_as::<_, SowRow>(&format!("SELECT {} FROM sows WHERE id = ?", SOW_COLUMNS))
        .bind(sow_id.0.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?;
    row.ok_or(StoreError::NotFound)?.try_into()
}

async fn insert_token(
    conn: &mut SqliteConnection,
    sow_id: &SowId,
    token: &str,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
) -> Result<SigningToken, StoreError> {
    let id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO sow_tokens(id, token, sow_id, expires_at, used, created_at)
         VALUES(?, ?, ?, ?, 0, ?)",
    )
    .bind(id.to_string())
    .bind(token)
    .bind(sow_id.0.to_string())
    .bind(expires_at.timestamp_millis())
    .bind(created_at.timestamp_millis())
    .execute(&mut *conn)
    .await
    .map_err(unique_err)?;

    Ok(SigningToken {
        id: SigningTokenId(id),
        token: token.to_string(),
        sow_id: sow_id.clone(),
        expires_at: from_millis(expires_at.timestamp_millis())?,
        used: false,
        used_at: None,
        created_at: from_millis(created_at.timestamp_millis())?,
    })
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    // ───────────────────────────── SOWs ─────────────────────────────

    async fn create_sow_with_token(
        &self,
        params: &CreateSowParams,
    ) -> Result<(Sow, SigningToken), StoreError> {
        let sow_id = SowId(Uuid::now_v7());
        let now = Utc::now();
        let data =
            serde_json::to_string(&params.data).map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            "INSERT INTO sows(id, client_name, client_email, data, provider_signature,
                              provider_signed_at, status, created_at, updated_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(sow_id.0.to_string())
        .bind(&params.client_name)
        .bind(&params.client_email)
        .bind(&data)
        .bind(&params.provider_signature)
        .bind(params.provider_signed_at.timestamp_millis())
        .bind(SowStatus::Sent.as_str())
        .bind(now.timestamp_millis())
        .bind(now.timestamp_millis())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let token =
            insert_token(&mut tx, &sow_id, &params.token, params.token_expires_at, now).await?;
        let sow = fetch_sow(&mut tx, &sow_id).await?;

        tx.commit().await.map_err(db_err)?;

        Ok((sow, token))
    }

    async fn get_sow(&self, sow_id: &SowId) -> Result<Sow, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        fetch_sow(&mut conn, sow_id).await
    }

    async fn list_sows(&self) -> Result<Vec<Sow>, StoreError> {
        let rows = sqlx::query_as::<_, SowRow>(&format!(
            "SELECT {} FROM sows ORDER BY created_at DESC, id DESC",
            SOW_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(Sow::try_from).collect()
    }

    async fn delete_sow(&self, sow_id: &SowId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("DELETE FROM sow_tokens WHERE sow_id = ?")
            .bind(sow_id.0.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let result = sqlx::query("DELETE FROM sows WHERE id = ?")
            .bind(sow_id.0.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    // ───────────────────────────── Tokens ─────────────────────────────

    async fn issue_token(&self, params: &IssueTokenParams) -> Result<SigningToken, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let sow = fetch_sow(&mut tx, &params.sow_id).await?;
        if sow.status == SowStatus::Completed {
            return Err(StoreError::Conflict);
        }

        let token = insert_token(
            &mut tx,
            &params.sow_id,
            &params.token,
            params.expires_at,
            Utc::now(),
        )
        .await?;

        tx.commit().await.map_err(db_err)?;
        Ok(token)
    }

    async fn get_token(&self, token: &str) -> Result<SigningToken, StoreError> {
        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "SELECT {} FROM sow_tokens WHERE token = ?",
            TOKEN_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.ok_or(StoreError::NotFound)?.try_into()
    }

    async fn list_tokens(&self, sow_id: &SowId) -> Result<Vec<SigningToken>, StoreError> {
        let rows = sqlx::query_as::<_, TokenRow>(&format!(
            "SELECT {} FROM sow_tokens WHERE sow_id = ? ORDER BY created_at ASC, id ASC",
            TOKEN_COLUMNS
        ))
        .bind(sow_id.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(SigningToken::try_from).collect()
    }

    // ───────────────────────────── Signing ─────────────────────────────

    async fn complete_signing(&self, params: &CompleteSigningParams) -> Result<Sow, StoreError> {
        let signed_at = params.signed_at.timestamp_millis();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Claim the token. Only an unused, unexpired row matches, so a second caller
        // sees zero rows no matter how the requests interleave.
        let claimed: Option<(String,)> = sqlx::query_as(
            "UPDATE sow_tokens SET used = 1, used_at = ?
             WHERE token = ? AND used = 0 AND expires_at > ?
             RETURNING sow_id",
        )
        .bind(signed_at)
        .bind(&params.token)
        .bind(signed_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let sow_id = match claimed {
            Some((sow_id,)) => SowId(parse_uuid(&sow_id)?),
            None => {
                drop(tx);
                let token = self.get_token(&params.token).await?;
                return Err(StoreError::for_token_state(token.state_at(params.signed_at))
                    .unwrap_or(StoreError::Conflict));
            }
        };

        let updated = sqlx::query(
            "UPDATE sows SET client_signature = ?, client_signed_at = ?, status = ?, updated_at = ?
             WHERE id = ? AND status <> ?",
        )
        .bind(&params.acknowledgement)
        .bind(signed_at)
        .bind(SowStatus::Completed.as_str())
        .bind(signed_at)
        .bind(sow_id.0.to_string())
        .bind(SowStatus::Completed.as_str())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        if updated.rows_affected() == 0 {
            // Completed through another token; dropping the transaction releases our claim.
            return Err(StoreError::Conflict);
        }

        // Retire any other outstanding links for this document.
        sqlx::query("UPDATE sow_tokens SET used = 1, used_at = ? WHERE sow_id = ? AND used = 0")
            .bind(signed_at)
            .bind(sow_id.0.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let sow = fetch_sow(&mut tx, &sow_id).await?;
        tx.commit().await.map_err(db_err)?;

        Ok(sow)
    }
}
