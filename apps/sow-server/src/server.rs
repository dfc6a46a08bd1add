use crate::config::ServerConfig;
use crate::dashboard::{Dashboard, DashboardQuery};
use crate::email::EmailProvider;
use crate::error::{ApiError, LinkRejection};
use crate::metrics;
use crate::notify::{DeliveryReport, Notifier};
use crate::token::generate_signing_token;
use chrono::Utc;
use sow_storage::{
    CompleteSigningParams, CreateSowParams, IssueTokenParams, SigningToken, Sow, SowData, SowId,
    Store, StoreError, TokenState,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a new SOW needs from the provider side.
#[derive(Debug, Clone)]
pub struct CreateSowRequest {
    pub client_name: String,
    pub client_email: String,
    pub provider_signature: String,
    pub data: SowData,
}

/// A SOW together with the signing link that was mailed for it.
#[derive(Debug, Clone)]
pub struct IssuedSow {
    pub sow: Sow,
    pub token: SigningToken,
    pub signing_url: String,
    pub delivery: DeliveryReport,
}

/// Result of a successful client signature.
#[derive(Debug, Clone)]
pub struct ExecutedSow {
    pub sow: Sow,
    pub delivery: DeliveryReport,
}

#[derive(Clone)]
pub struct SowServer {
    pub store: Arc<dyn Store>,
    pub notifier: Notifier,
    pub config: Arc<ServerConfig>,
}

impl SowServer {
    pub fn new(
        store: Arc<dyn Store>,
        config: ServerConfig,
        email_provider: Option<Arc<dyn EmailProvider>>,
    ) -> Self {
        let notifier = Notifier::new(&config, email_provider);
        Self {
            store,
            notifier,
            config: Arc::new(config),
        }
    }

    // ───────────────────────────────────── Creation ─────────────────────────────────────

    /// Persist a SOW with its first signing token, then email the link.
    ///
    /// The record and token are written in one transaction. Email delivery
    /// happens after commit and its outcome is reported, never raised.
    pub async fn create_sow(&self, req: CreateSowRequest) -> Result<IssuedSow, ApiError> {
        let client_name = required(&req.client_name, "client_name")?;
        let client_email = required(&req.client_email, "client_email")?;
        let provider_signature = required(&req.provider_signature, "arcodic_signature")?;
        if !client_email.contains('@') {
            return Err(ApiError::Validation(
                "client_email must be an email address".to_string(),
            ));
        }

        let now = Utc::now();
        let params = CreateSowParams {
            client_name: client_name.to_string(),
            client_email: client_email.to_string(),
            data: req.data,
            provider_signature: provider_signature.to_string(),
            provider_signed_at: now,
            token: generate_signing_token(),
            token_expires_at: now + self.config.token_ttl,
        };

        let (sow, token) = self.store.create_sow_with_token(&params).await?;
        let signing_url = self.config.signing_url(&token.token);

        metrics::record_sow_created();
        info!(sow_id = %sow.id.0, client = %sow.client_name, "statement of work created");

        let delivery = self.notifier.send_signing_request(&sow, &signing_url).await;

        Ok(IssuedSow {
            sow,
            token,
            signing_url,
            delivery,
        })
    }

    /// Issue a fresh signing link for a SOW that is not yet completed and
    /// email it to the client. Earlier links stay usable until they expire.
    pub async fn reissue_token(&self, sow_id: &SowId) -> Result<IssuedSow, ApiError> {
        let token = self
            .store
            .issue_token(&IssueTokenParams {
                sow_id: sow_id.clone(),
                token: generate_signing_token(),
                expires_at: Utc::now() + self.config.token_ttl,
            })
            .await?;
        let sow = self.store.get_sow(sow_id).await?;
        let signing_url = self.config.signing_url(&token.token);

        info!(sow_id = %sow_id.0, "signing link reissued");

        let delivery = self.notifier.send_signing_request(&sow, &signing_url).await;

        Ok(IssuedSow {
            sow,
            token,
            signing_url,
            delivery,
        })
    }

    /// Links for `sow_id` that can still be used, oldest first.
    pub async fn outstanding_links(&self, sow_id: &SowId) -> Result<Vec<SigningToken>, ApiError> {
        let now = Utc::now();
        let tokens = self.store.list_tokens(sow_id).await?;
        Ok(tokens
            .into_iter()
            .filter(|t| t.state_at(now) == TokenState::Valid)
            .collect())
    }

    // ───────────────────────────────────── Signing ──────────────────────────────────────

    /// Resolve a signing link to the document it grants access to.
    pub async fn begin_signing(&self, token: &str) -> Result<Sow, ApiError> {
        let token = self
            .store
            .get_token(token)
            .await
            .map_err(ApiError::from_token_error)?;

        match token.state_at(Utc::now()) {
            TokenState::Valid => {}
            TokenState::Used => return Err(ApiError::Link(LinkRejection::Used)),
            TokenState::Expired => return Err(ApiError::Link(LinkRejection::Expired)),
        }

        self.store
            .get_sow(&token.sow_id)
            .await
            .map_err(ApiError::from_token_error)
    }

    /// Consume a signing link and record the client's acknowledgement.
    ///
    /// Exactly one caller can consume a given link. Everyone else gets
    /// `Used`/`Expired`/`Invalid` and causes no writes and no emails.
    pub async fn complete_signing(
        &self,
        token: &str,
        acknowledgement: &str,
    ) -> Result<ExecutedSow, ApiError> {
        let token = required(token, "token")?;
        let acknowledgement = required(acknowledgement, "client_signature")?;

        let result = self
            .store
            .complete_signing(&CompleteSigningParams {
                token: token.to_string(),
                acknowledgement: acknowledgement.to_string(),
                signed_at: Utc::now(),
            })
            .await;

        let sow = match result {
            Ok(sow) => sow,
            Err(e) => {
                let err = match e {
                    StoreError::NotFound => ApiError::Link(LinkRejection::Invalid),
                    StoreError::Conflict => ApiError::Link(LinkRejection::Used),
                    other => ApiError::from(other),
                };
                if let ApiError::Link(rejection) = &err {
                    metrics::record_signing_rejected(rejection.state());
                    warn!(reason = rejection.state(), "signing attempt rejected");
                }
                return Err(err);
            }
        };

        metrics::record_signing_completed();
        info!(sow_id = %sow.id.0, "statement of work fully executed");

        let delivery = self.notifier.send_executed(&sow).await;

        Ok(ExecutedSow { sow, delivery })
    }

    // ───────────────────────────────────── Admin ────────────────────────────────────────

    pub async fn dashboard(&self, query: &DashboardQuery) -> Result<Dashboard, ApiError> {
        let all = self.store.list_sows().await?;
        Ok(Dashboard::build(all, query))
    }

    pub async fn get_sow(&self, sow_id: &SowId) -> Result<Sow, ApiError> {
        Ok(self.store.get_sow(sow_id).await?)
    }

    pub async fn delete_sow(&self, sow_id: &SowId) -> Result<(), ApiError> {
        self.store.delete_sow(sow_id).await?;
        info!(sow_id = %sow_id.0, "statement of work deleted");
        Ok(())
    }
}

/// Trimmed value of a field that must not be blank.
fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed)
}
