//! Email templates for signing requests and executed documents.

use chrono::{DateTime, Utc};

/// Rendered email body in both formats.
#[derive(Debug, Clone)]
pub struct EmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// "Ready to sign" email sent to the client after creation or reissue.
pub struct SigningRequestEmail<'a> {
    pub provider_name: &'a str,
    pub client_name: &'a str,
    pub signing_url: &'a str,
    pub expires_in_days: i64,
}

impl SigningRequestEmail<'_> {
    pub const SUBJECT: &'static str = "Action Required: Please sign your Statement of Work";

    pub fn render(&self) -> EmailContent {
        EmailContent {
            subject: Self::SUBJECT.to_string(),
            text: self.text_template(),
            html: self.html_template(),
        }
    }

    fn text_template(&self) -> String {
        format!(
            r#"Hi {client},

Your Statement of Work is ready for review and signature.
Open the link below to view the document and sign:

{url}

This link expires in {days} days. If you have any questions, reply to this email.

--
{provider}"#,
            client = self.client_name,
            url = self.signing_url,
            days = self.expires_in_days,
            provider = self.provider_name,
        )
    }

    fn html_template(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{ font-family: monospace; margin: 0; padding: 0; background: #0a0906; color: #d4c5a8; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 40px; }}
        h1 {{ font-size: 28px; color: #c9a96e; margin-bottom: 8px; }}
        .label {{ color: #6b6050; font-size: 11px; letter-spacing: 0.1em; text-transform: uppercase; margin-bottom: 40px; }}
        .muted {{ color: #8a7d6b; }}
        .button {{ display: inline-block; background: #c9a96e; color: #0a0906; padding: 14px 32px; text-decoration: none; font-weight: 600; letter-spacing: 0.08em; text-transform: uppercase; font-size: 12px; margin-bottom: 32px; }}
        .footer {{ font-size: 10px; color: #4a4035; border-top: 1px solid #2a2520; margin-top: 32px; padding-top: 16px; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>{provider}</h1>
        <p class="label">Statement of Work</p>
        <p>Hi {client},</p>
        <p class="muted">Your Statement of Work is ready for review and signature. Please click the button below to view the document and sign.</p>
        <a class="button" href="{url}">Review &amp; Sign Document</a>
        <p class="label">This link expires in {days} days. If you have any questions, reply to this email or contact us directly.</p>
        <div class="footer">{provider}</div>
    </div>
</body>
</html>"#,
            provider = html_escape(self.provider_name),
            client = html_escape(self.client_name),
            url = html_escape(self.signing_url),
            days = self.expires_in_days,
        )
    }
}

/// Who an executed-document email is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Client,
    Provider,
}

/// "Fully executed" email sent to both parties after the client signs.
pub struct ExecutedEmail<'a> {
    pub recipient: Recipient,
    pub provider_name: &'a str,
    pub client_name: &'a str,
    pub project_title: Option<&'a str>,
    pub currency: Option<&'a str>,
    pub total: Option<&'a str>,
    pub provider_signature: &'a str,
    pub provider_signed_at: DateTime<Utc>,
    pub client_signature: &'a str,
    pub client_signed_at: DateTime<Utc>,
}

impl ExecutedEmail<'_> {
    pub fn render(&self) -> EmailContent {
        EmailContent {
            subject: self.subject(),
            text: self.text_template(),
            html: self.html_template(),
        }
    }

    fn subject(&self) -> String {
        match (self.recipient, self.project_title) {
            (Recipient::Client, Some(title)) => format!("Signed: Statement of Work for {}", title),
            (Recipient::Client, None) => "Signed: Statement of Work".to_string(),
            (Recipient::Provider, Some(title)) => {
                format!("Client Signed: {} ({})", self.client_name, title)
            }
            (Recipient::Provider, None) => format!("Client Signed: {}", self.client_name),
        }
    }

    fn greeting_name(&self) -> String {
        match self.recipient {
            Recipient::Client => self.client_name.to_string(),
            Recipient::Provider => format!("{} Team", self.provider_name),
        }
    }

    fn total_value(&self) -> String {
        match (self.currency, self.total) {
            (Some(currency), Some(total)) => format!("{} {}", currency, total),
            (None, Some(total)) => total.to_string(),
            _ => "-".to_string(),
        }
    }

    fn text_template(&self) -> String {
        format!(
            r#"Hi {greeting},

The Statement of Work for {project} has been signed by both parties and is now fully executed.

Client:      {client}
Project:     {title}
Total value: {total}
Completed:   {completed}

Signed by {provider} as "{provider_sig}" on {provider_date}
Signed by the client as "{client_sig}" on {completed}

Please retain this email as your record of execution.

--
{provider}"#,
            greeting = self.greeting_name(),
            project = self.project_title.unwrap_or("your project"),
            client = self.client_name,
            title = self.project_title.unwrap_or("-"),
            total = self.total_value(),
            completed = format_date(self.client_signed_at),
            provider = self.provider_name,
            provider_sig = self.provider_signature,
            provider_date = format_date(self.provider_signed_at),
            client_sig = self.client_signature,
        )
    }

    fn html_template(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{ font-family: monospace; margin: 0; padding: 0; background: #0a0906; color: #d4c5a8; }}
        .container {{ max-width: 620px; margin: 0 auto; padding: 48px 40px; }}
        .header {{ margin-bottom: 40px; padding-bottom: 24px; border-bottom: 1px solid #1e1a14; }}
        .label {{ font-size: 10px; letter-spacing: 0.2em; text-transform: uppercase; color: #4a4035; }}
        h1 {{ font-size: 32px; color: #c9a96e; margin: 0; }}
        .executed {{ font-size: 11px; color: #4a9b6f; letter-spacing: 0.12em; text-transform: uppercase; }}
        .panel {{ background: #111008; border: 1px solid #2a2520; padding: 24px; margin-bottom: 32px; }}
        td {{ padding: 6px 0; font-size: 11px; }}
        .signature {{ font-size: 22px; font-family: Georgia, serif; font-style: italic; color: #c9a96e; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <p class="label">{provider} &middot; Digital Service Provider</p>
            <h1>Statement of Work</h1>
            <p class="executed">&#10003; Fully Executed</p>
        </div>
        <p>Hi {greeting},</p>
        <p>The Statement of Work for <strong>{project}</strong> has been signed by both parties and is now fully executed.</p>
        <div class="panel">
            <p class="label">Agreement Summary</p>
            <table>
                <tr><td>Client</td><td>{client}</td></tr>
                <tr><td>Project</td><td>{title}</td></tr>
                <tr><td>Total Value</td><td>{total}</td></tr>
                <tr><td>Completed</td><td>{completed}</td></tr>
            </table>
        </div>
        <div class="panel">
            <p class="label">{provider}</p>
            <p class="signature">{provider_sig}</p>
            <p class="label">Signed {provider_date}</p>
        </div>
        <div class="panel">
            <p class="label">Client</p>
            <p class="signature">{client_sig}</p>
            <p class="label">Signed {completed}</p>
        </div>
        <p class="label">Please retain this email as your record of execution.</p>
    </div>
</body>
</html>"#,
            provider = html_escape(self.provider_name),
            greeting = html_escape(&self.greeting_name()),
            project = html_escape(self.project_title.unwrap_or("your project")),
            client = html_escape(self.client_name),
            title = html_escape(self.project_title.unwrap_or("-")),
            total = html_escape(&self.total_value()),
            completed = format_date(self.client_signed_at),
            provider_sig = html_escape(self.provider_signature),
            provider_date = format_date(self.provider_signed_at),
            client_sig = html_escape(self.client_signature),
        )
    }
}

/// Long-form date such as `19 October 2026`.
fn format_date(at: DateTime<Utc>) -> String {
    at.format("%-d %B %Y").to_string()
}

pub fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
