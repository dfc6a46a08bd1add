use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, PgConnection, PgPool};
use uuid::Uuid;
use sow_storage::{
    CompleteSigningParams, CreateSowParams, IssueTokenParams, SigningToken, SigningTokenId, Sow,
    SowData, SowId, SowStatus, Store, StoreError,
};


static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const SOW_COLUMNS: &str = "id, client_name, client_email, data, provider_signature, \
     provider_signed_at, client_signature, client_signed_at, status, created_at, updated_at";

const TOKEN_COLUMNS: &str = "id, token, sow_id, expires_at, used, used_at, created_at";

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
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
    if s.contains("duplicate key") || s.contains("unique constraint") {
        StoreError::AlreadyExists
    } else {
        StoreError::Backend(s)
    }
}

#[derive(sqlx::FromRow)]
struct SowRow {
    id: Uuid,
    client_name: String,
    client_email: String,
    data: Json<SowData>,
    provider_signature: String,
    provider_signed_at: DateTime<Utc>,
    client_signature: Option<String>,
    client_signed_at: Option<DateTime<Utc>>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SowRow> for Sow {
    type Error = StoreError;

    fn try_from(row: SowRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<SowStatus>()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Sow {
            id: SowId(row.id),
            client_name: row.client_name,
            client_email: row.client_email,
            data: row.data.0,
            provider_signature: row.provider_signature,
            provider_signed_at: row.provider_signed_at,
            client_signature: row.client_signature,
            client_signed_at: row.client_signed_at,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: Uuid,
    token: String,
    sow_id: Uuid,
    expires_at: DateTime<Utc>,
    used: bool,
    used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<TokenRow> for SigningToken {
    fn from(row: TokenRow) -> Self {
        SigningToken {
            id: SigningTokenId(row.id),
            token: row.token,
            sow_id: SowId(row.sow_id),
            expires_at: row.expires_at,
            used: row.used,
            used_at: row.used_at,
            created_at: row.created_at,
        }
    }
}

async fn fetch_sow(conn: &mut PgConnection, sow_id: &SowId) -> Result<Sow, StoreError> {
    let row = sqlx::query_as::<_, SowRow>(&format!("SELECT {} FROM sows WHERE id = $1", SOW_COLUMNS))
        .bind(sow_id.0)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?;
    row.ok_or(StoreError::NotFound)?.try_into()
}

async fn insert_token(
    conn: &mut PgConnection,
    sow_id: &SowId,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<SigningToken, StoreError> {
    let row = sqlx::query_as::<_, TokenRow>(&format!(
        "INSERT INTO sow_tokens(id, token, sow_id, expires_at, used)
         VALUES($1, $2, $3, $4, false)
         RETURNING {}",
        TOKEN_COLUMNS
    ))
    .bind(Uuid::now_v7())
    .bind(token)
    .bind(sow_id.0)
    .bind(expires_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(unique_err)?;

    Ok(row.into())
}

#[async_trait::async_trait]
impl Store for PostgresStore {
    // ───────────────────────────── SOWs ─────────────────────────────

    async fn create_sow_with_token(
        &self,
        params: &CreateSowParams,
    ) -> Result<(Sow, SigningToken), StoreError> {
        let sow_id = SowId(Uuid::now_v7());
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query_as::<_, SowRow>(&format!(
            "INSERT INTO sows(id, client_name, client_email, data, provider_signature,
                              provider_signed_at, status)
             VALUES($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            SOW_COLUMNS
        ))
        .bind(sow_id.0)
        .bind(&params.client_name)
        .bind(&params.client_email)
        .bind(Json(&params.data))
        .bind(&params.provider_signature)
        .bind(params.provider_signed_at)
        .bind(SowStatus::Sent.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        let token = insert_token(&mut tx, &sow_id, &params.token, params.token_expires_at).await?;

        tx.commit().await.map_err(db_err)?;

        Ok((row.try_into()?, token))
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
        // sow_tokens rows go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM sows WHERE id = $1")
            .bind(sow_id.0)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ───────────────────────────── Tokens ─────────────────────────────

    async fn issue_token(&self, params: &IssueTokenParams) -> Result<SigningToken, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Lock the SOW row so a concurrent completion cannot slip in between the
        // status check and the insert.
        let status: Option<(String,)> =
            sqlx::query_as("SELECT status FROM sows WHERE id = $1 FOR UPDATE")
                .bind(params.sow_id.0)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;

        match status {
            None => return Err(StoreError::NotFound),
            Some((s,)) if s == SowStatus::Completed.as_str() => return Err(StoreError::Conflict),
            Some(_) => {}
        }

        let token = insert_token(&mut tx, &params.sow_id, &params.token, params.expires_at).await?;

        tx.commit().await.map_err(db_err)?;
        Ok(token)
    }

    async fn get_token(&self, token: &str) -> Result<SigningToken, StoreError> {
        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "SELECT {} FROM sow_tokens WHERE token = $1",
            TOKEN_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(SigningToken::from).ok_or(StoreError::NotFound)
    }

    async fn list_tokens(&self, sow_id: &SowId) -> Result<Vec<SigningToken>, StoreError> {
        let rows = sqlx::query_as::<_, TokenRow>(&format!(
            "SELECT {} FROM sow_tokens WHERE sow_id = $1 ORDER BY created_at ASC, id ASC",
            TOKEN_COLUMNS
        ))
        .bind(sow_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(SigningToken::from).collect())
    }

    // ───────────────────────────── Signing ─────────────────────────────

    async fn complete_signing(&self, params: &CompleteSigningParams) -> Result<Sow, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // The row lock taken by this UPDATE makes a concurrent claimer wait, re-check the
        // predicate after we commit, and match nothing.
        let claimed: Option<(Uuid,)> = sqlx::query_as(
            "UPDATE sow_tokens SET used = true, used_at = $1
             WHERE token = $2 AND used = false AND expires_at > $1
             RETURNING sow_id",
        )
        .bind(params.signed_at)
        .bind(&params.token)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let sow_id = match claimed {
            Some((id,)) => SowId(id),
            None => {
                tx.rollback().await.map_err(db_err)?;
                let token = self.get_token(&params.token).await?;
                return Err(StoreError::for_token_state(token.state_at(params.signed_at))
                    .unwrap_or(StoreError::Conflict));
            }
        };

        let updated = sqlx::query(
            "UPDATE sows
             SET client_signature = $1, client_signed_at = $2, status = $3, updated_at = $2
             WHERE id = $4 AND status <> $3",
        )
        .bind(&params.acknowledgement)
        .bind(params.signed_at)
        .bind(SowStatus::Completed.as_str())
        .bind(sow_id.0)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(db_err)?;
            return Err(StoreError::Conflict);
        }

        sqlx::query(
            "UPDATE sow_tokens SET used = true, used_at = $1 WHERE sow_id = $2 AND used = false",
        )
        .bind(params.signed_at)
        .bind(sow_id.0)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let sow = fetch_sow(&mut tx, &sow_id).await?;
        tx.commit().await.map_err(db_err)?;

        Ok(sow)
    }
}
