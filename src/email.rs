//! Mail transport: the `MailTransport` seam plus the lettre-backed `Mailer`.

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use lettre::{
    message::{header, Mailbox, MultiPart, SinglePart},
    transport::{
        file::AsyncFileTransport,
        smtp::{
            authentication::Credentials,
            client::{Tls, TlsParameters},
        },
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tracing::{debug, error};

use crate::config::{ApiConfig, Transport};

/// Errors from rendering or delivering an email.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("render error: {0}")]
    Render(String),
    #[error("invalid address: {0}")]
    Address(String),
    #[error("message build error: {0}")]
    Build(String),
    #[error("smtp error: {message}")]
    Smtp {
        message: String,
        /// SMTP reply code, when the server answered.
        code: Option<String>,
        permanent: bool,
    },
    #[error("file transport error: {0}")]
    File(String),
}

/// One email ready to hand to a transport.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub from: Mailbox,
    pub to: Mailbox,
    pub subject: String,
    pub html: String,
}

/// Anything that can deliver an [`OutgoingMail`] and report its message id.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send_mail(&self, mail: OutgoingMail) -> Result<String, EmailError>;
}

/// Transport selected at runtime (SMTP for prod, FILE for local dev).
#[derive(Clone)]
pub enum Mailer {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl Mailer {
    /// Build the transport named by `config.transport`.
    pub fn from_config(config: &ApiConfig) -> Result<Self, anyhow::Error> {
        match config.transport {
            Transport::Smtp => build_smtp_mailer(
                &config.smtp_host,
                config.smtp_port,
                &config.smtp_username,
                &config.smtp_password,
            ),
            Transport::File => build_file_mailer(&config.outbox_dir),
        }
    }
}

#[async_trait]
impl MailTransport for Mailer {
    async fn send_mail(&self, mail: OutgoingMail) -> Result<String, EmailError> {
        let message_id = message_id_for(&mail.from);
        let email = build_message(mail, &message_id)?;
        match self {
            Mailer::Smtp(m) => {
                m.send(email).await.map_err(|e| {
                    let err = EmailError::Smtp {
                        message: e.to_string(),
                        code: e.status().map(|c| c.to_string()),
                        permanent: e.is_permanent(),
                    };
                    error!(
                        error = %e,
                        code = ?e.status().map(|c| c.to_string()),
                        permanent = e.is_permanent(),
                        transient = e.is_transient(),
                        timeout = e.is_timeout(),
                        "SMTP dispatch failed"
                    );
                    err
                })?;
            }
            Mailer::File(f) => {
                let file_id = f.send(email).await.map_err(|e| {
                    error!(error = %e, "file transport failed");
                    EmailError::File(e.to_string())
                })?;
                debug!(file_id = %file_id, "message written to outbox");
            }
        }
        Ok(message_id)
    }
}

/// Implicit TLS on 465, STARTTLS elsewhere. Certificates are not verified.
fn build_smtp_mailer(
    host: &str,
    port: u16,
    user: &str,
    pass: &str,
) -> Result<Mailer, anyhow::Error> {
    let creds = Credentials::new(user.to_string(), pass.to_string());
    let params = TlsParameters::builder(host.to_string())
        .dangerous_accept_invalid_certs(true)
        .build()?;
    let tls = if port == 465 {
        Tls::Wrapper(params)
    } else {
        Tls::Required(params)
    };
    Ok(Mailer::Smtp(
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .tls(tls)
            .credentials(creds)
            .timeout(Some(Duration::from_secs(15)))
            .build(),
    ))
}

/// Build a file transport (writes `.eml` files), used for local/dev.
fn build_file_mailer(dir: &str) -> Result<Mailer, anyhow::Error> {
    std::fs::create_dir_all(dir)?;
    Ok(Mailer::File(AsyncFileTransport::new(Path::new(dir).to_path_buf())))
}

/// Multipart (text + html) message carrying our own `Message-ID`.
fn build_message(mail: OutgoingMail, message_id: &str) -> Result<Message, EmailError> {
    Message::builder()
        .from(mail.from)
        .to(mail.to)
        .subject(mail.subject)
        .message_id(Some(message_id.to_string()))
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(header::ContentType::TEXT_PLAIN)
                        .body(strip_html::strip(&mail.html)),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(header::ContentType::TEXT_HTML)
                        .body(mail.html),
                ),
        )
        .map_err(|e| EmailError::Build(e.to_string()))
}

/// `<random@sender-domain>`
fn message_id_for(from: &Mailbox) -> String {
    format!("<{}@{}>", nanoid(), from.email.domain())
}

/// Generate a compact pseudo id (22 chars, URL-safe).
fn nanoid() -> String {
    use rand::{distr::Alphanumeric, rng, Rng};
    rng()
        .sample_iter(&Alphanumeric)
        .take(22)
        .map(char::from)
        .collect()
}

/// Best-effort HTML→plaintext for the text alternative.
mod strip_html {
    pub fn strip(html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut in_tag = false;
        let mut in_head = false;
        let lower = html.to_ascii_lowercase();
        let mut i = 0;
        for c in html.chars() {
            if !in_tag && c == '<' {
                let rest = &lower[i..];
                if rest.starts_with("<style") || rest.starts_with("<head") {
                    in_head = true;
                } else if rest.starts_with("</style") || rest.starts_with("</head") {
                    in_head = false;
                }
            }
            match c {
                '<' => in_tag = true,
                '>' => in_tag = false,
                _ if !in_tag && !in_head => out.push(c),
                _ => {}
            }
            i += c.len_utf8();
        }
        let text = out
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#039;", "'")
            .replace("&copy;", "©")
            .replace("&amp;", "&");
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

}
