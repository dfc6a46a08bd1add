//! Best-effort email dispatch for signing requests and executed documents.
//!
//! Delivery never fails the caller: every send is retried with exponential
//! backoff and the final outcome is logged, counted and handed back in a
//! [`DeliveryReport`].

use crate::config::ServerConfig;
use crate::email::{
    EmailProvider, ExecutedEmail, OutgoingEmail, Recipient, SigningRequestEmail,
};
use crate::metrics;
use sow_storage::Sow;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub const MAX_ATTEMPTS: u32 = 3;
pub const BASE_BACKOFF: Duration = Duration::from_millis(250);

/// How often and how patiently a single email is retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_backoff: BASE_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`, doubling from the base.
    fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    Failed { attempts: u32, error: String },
    /// No provider configured
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub to: String,
    pub outcome: DeliveryOutcome,
}

/// Outcome of every email one operation tried to send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub deliveries: Vec<Delivery>,
}

impl DeliveryReport {
    pub fn all_delivered(&self) -> bool {
        self.deliveries
            .iter()
            .all(|d| matches!(d.outcome, DeliveryOutcome::Delivered { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries
            .iter()
            .filter(|d| matches!(d.outcome, DeliveryOutcome::Failed { .. }))
    }
}

#[derive(Clone)]
pub struct Notifier {
    provider: Option<Arc<dyn EmailProvider>>,
    from: String,
    provider_name: String,
    provider_email: Option<String>,
    token_ttl_days: i64,
    retry: RetryPolicy,
}

impl Notifier {
    pub fn new(config: &ServerConfig, provider: Option<Arc<dyn EmailProvider>>) -> Self {
        let from = match &config.email {
            Some(email) => email.from_header(),
            None => format!("{} <noreply@localhost>", config.provider_name),
        };

        Self {
            provider,
            from,
            provider_name: config.provider_name.clone(),
            provider_email: config.provider_email.clone(),
            token_ttl_days: config.token_ttl.num_days(),
            retry: RetryPolicy::default(),
        }
    }

    #[cfg(test)]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Send the "ready to sign" email to the client.
    pub async fn send_signing_request(&self, sow: &Sow, signing_url: &str) -> DeliveryReport {
        let content = SigningRequestEmail {
            provider_name: &self.provider_name,
            client_name: &sow.client_name,
            signing_url,
            expires_in_days: self.token_ttl_days,
        }
        .render();

        let email = OutgoingEmail {
            from: self.from.clone(),
            to: sow.client_email.clone(),
            content,
        };

        let delivery = self.deliver("signing_request", &sow.id.0.to_string(), email).await;
        DeliveryReport {
            deliveries: vec![delivery],
        }
    }

    /// Send the "fully executed" email to the client and, when configured, the
    /// provider. Both sends run concurrently and are awaited together.
    pub async fn send_executed(&self, sow: &Sow) -> DeliveryReport {
        let sow_id = sow.id.0.to_string();
        let client = self.deliver(
            "executed",
            &sow_id,
            self.executed_email(sow, Recipient::Client, &sow.client_email),
        );

        let deliveries = match &self.provider_email {
            Some(provider_email) => {
                let provider = self.deliver(
                    "executed",
                    &sow_id,
                    self.executed_email(sow, Recipient::Provider, provider_email),
                );
                let (client, provider) = tokio::join!(client, provider);
                vec![client, provider]
            }
            None => vec![client.await],
        };

        DeliveryReport { deliveries }
    }

    fn executed_email(&self, sow: &Sow, recipient: Recipient, to: &str) -> OutgoingEmail {
        let client_signed_at = sow.client_signed_at.unwrap_or(sow.updated_at);
        let total = sow.data.pricing_total();
        let content = ExecutedEmail {
            recipient,
            provider_name: &self.provider_name,
            client_name: &sow.client_name,
            project_title: sow.data.display_title(),
            currency: sow.data.pricing_currency(),
            total: total.as_deref(),
            provider_signature: &sow.provider_signature,
            provider_signed_at: sow.provider_signed_at,
            client_signature: sow.client_signature.as_deref().unwrap_or_default(),
            client_signed_at,
        }
        .render();

        OutgoingEmail {
            from: self.from.clone(),
            to: to.to_string(),
            content,
        }
    }

    async fn deliver(&self, kind: &'static str, sow_id: &str, email: OutgoingEmail) -> Delivery {
        let Some(provider) = &self.provider else {
            warn!(sow_id, kind, to = %email.to, "no email provider configured, skipping");
            return Delivery {
                to: email.to,
                outcome: DeliveryOutcome::Skipped,
            };
        };

        let mut attempt = 1;
        let outcome = loop {
            match provider.send(&email).await {
                Ok(()) => {
                    info!(sow_id, kind, to = %email.to, attempt, "email sent");
                    metrics::record_email_sent(kind);
                    break DeliveryOutcome::Delivered { attempts: attempt };
                }
                Err(e) if attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        sow_id, kind, to = %email.to, attempt, error = %e,
                        "email send failed, retrying in {:?}", delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(sow_id, kind, to = %email.to, attempt, error = %e, "email send failed");
                    metrics::record_email_failure(kind);
                    break DeliveryOutcome::Failed {
                        attempts: attempt,
                        error: e.to_string(),
                    };
                }
            }
        };

        Delivery {
            to: email.to,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.backoff(1), Duration::from_millis(250));
        assert_eq!(retry.backoff(2), Duration::from_millis(500));
    }

    #[test]
    fn test_report_helpers() {
        let report = DeliveryReport {
            deliveries: vec![
                Delivery {
                    to: "a@example.com".to_string(),
                    outcome: DeliveryOutcome::Delivered { attempts: 1 },
                },
                Delivery {
                    to: "b@example.com".to_string(),
                    outcome: DeliveryOutcome::Failed {
                        attempts: 3,
                        error: "boom".to_string(),
                    },
                },
            ],
        };
        assert!(!report.all_delivered());
        assert_eq!(report.failures().count(), 1);
        assert!(DeliveryReport::default().all_delivered());
    }
}
