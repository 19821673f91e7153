//! Configuration for the contact endpoint.

use anyhow::{anyhow, bail, Context};
use lettre::message::Mailbox;

/// Which transport delivers mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Smtp,
    File,
}

/// Deployment mode. Development exposes transport diagnostics in 500 responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    Development,
    Production,
}

/// Struct containing all configuration options.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub log_to_file: bool,
    pub log_to_stdout: bool,
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub listen_addr: String,
    pub listen_port: u16,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub mail_from_name: String,
    pub admin_email: String,
    pub transport: Transport,
    pub outbox_dir: String,
    pub deployment: Deployment,
}

/// # get_defaults()
/// Returns an `ApiConfig` populated with default values for all configuration options.
/// These defaults are overridden by environment variables in [`ApiConfig::from_env`].
/// # Environment Variables:
/// |Variable|Description|
/// |:------:|:---------:|
/// |`LOG_LEVEL`|Log level (TRACE, DEBUG, INFO, WARN, ERROR)|
/// |`LOG_TO_FILE`|Whether to log to file (true/false)|
/// |`LOG_TO_STDOUT`|Whether to log to stdout (true/false)|
/// |`LOG_DIR`|Directory to log to|
/// |`LOG_FILE`|File to log to (relative to `LOG_DIR`)|
/// |`LISTEN_ADDR`|Address to bind to (e.g. `127.0.0.1`)|
/// |`LISTEN_PORT`|Port to bind to (e.g. `8080`)|
/// |`SMTP_HOST`|SMTP server hostname|
/// |`SMTP_PORT`|SMTP server port (`465` = implicit TLS, anything else = STARTTLS)|
/// |`TITAN_EMAIL`|SMTP username, also the sender address|
/// |`TITAN_PASSWORD`|SMTP password|
/// |`MAIL_FROM_NAME`|Display name on outgoing mail|
/// |`ADMIN_EMAIL`|Where lead notifications go (defaults to `TITAN_EMAIL`)|
/// |`MAIL_TRANSPORT`|`smtp` or `file`|
/// |`OUTBOX_DIR`|Directory for `.eml` files when using `file` transport|
/// |`APP_ENV`|`development` or `production`|
///
/// --------------------------------------------------------------------
/// ## Log defaults:
/// |`log_file`      |`log_dir`|`log_to_file`|`log_to_stdout`|`log_level`|
/// |:--------------:|:-------:|:-----------:|:-------------:|:---------:|
/// |`leadrelay.log` |`logs`   |`false`      |`true`         |`INFO`     |
/// --------------------------------------------------------------------
/// ## SMTP defaults:
/// | `smtp_host`       | `smtp_port`| `transport`| `outbox_dir`|
/// |:-----------------:|:----------:|:----------:|:-----------:|
/// | `smtp.titan.email`|`465`       |`smtp`      |`outbox`     |
/// --------------------------------------------------------------------
pub fn get_defaults() -> ApiConfig {
    ApiConfig {
        log_to_file: false,
        log_to_stdout: true,
        log_level: "INFO".into(),
        log_dir: "logs".into(),
        log_file: "leadrelay.log".into(),
        listen_addr: "127.0.0.1".into(),
        listen_port: 8080,
        smtp_host: "smtp.titan.email".into(),
        smtp_port: 465,
        smtp_username: String::new(),
        smtp_password: String::new(),
        mail_from_name: "Lead Desk".into(),
        admin_email: String::new(),
        transport: Transport::Smtp,
        outbox_dir: "outbox".into(),
        deployment: Deployment::Production,
    }
}

impl ApiConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut c = get_defaults();

        if let Some(v) = var("LOG_LEVEL") {
            c.log_level = v.to_uppercase();
        }
        if let Some(v) = var("LOG_TO_FILE") {
            c.log_to_file = parse_bool("LOG_TO_FILE", &v)?;
        }
        if let Some(v) = var("LOG_TO_STDOUT") {
            c.log_to_stdout = parse_bool("LOG_TO_STDOUT", &v)?;
        }
        if let Some(v) = var("LOG_DIR") {
            c.log_dir = v;
        }
        if let Some(v) = var("LOG_FILE") {
            c.log_file = v;
        }
        if let Some(v) = var("LISTEN_ADDR") {
            c.listen_addr = v;
        }
        if let Some(v) = var("LISTEN_PORT") {
            c.listen_port = v.parse().with_context(|| format!("Invalid LISTEN_PORT: {v}"))?;
        }
        if let Some(v) = var("SMTP_HOST") {
            c.smtp_host = v;
        }
        if let Some(v) = var("SMTP_PORT") {
            c.smtp_port = v.parse().with_context(|| format!("Invalid SMTP_PORT: {v}"))?;
        }
        if let Some(v) = var("TITAN_EMAIL") {
            c.smtp_username = v;
        }
        if let Some(v) = var("TITAN_PASSWORD") {
            c.smtp_password = v;
        }
        if let Some(v) = var("MAIL_FROM_NAME") {
            c.mail_from_name = v;
        }
        c.admin_email = var("ADMIN_EMAIL").unwrap_or_else(|| c.smtp_username.clone());
        if let Some(v) = var("MAIL_TRANSPORT") {
            c.transport = match v.to_lowercase().as_str() {
                "smtp" => Transport::Smtp,
                "file" => Transport::File,
                other => bail!("Invalid MAIL_TRANSPORT: {other} (expected smtp or file)"),
            };
        }
        if let Some(v) = var("OUTBOX_DIR") {
            c.outbox_dir = v;
        }
        if let Some(v) = var("APP_ENV") {
            c.deployment = match v.to_lowercase().as_str() {
                "development" | "dev" => Deployment::Development,
                _ => Deployment::Production,
            };
        }

        c.check()?;
        Ok(c)
    }

    /// Sender mailbox: `MAIL_FROM_NAME <TITAN_EMAIL>`.
    pub fn sender(&self) -> Result<Mailbox, anyhow::Error> {
        format!("{} <{}>", self.mail_from_name, self.smtp_username)
            .parse()
            .map_err(|e| anyhow!("Invalid TITAN_EMAIL: {e}"))
    }

    /// Recipient of lead notifications.
    pub fn admin(&self) -> Result<Mailbox, anyhow::Error> {
        self.admin_email
            .parse()
            .map_err(|e| anyhow!("Invalid ADMIN_EMAIL: {e}"))
    }

    fn check(&self) -> Result<(), anyhow::Error> {
        if self.transport == Transport::Smtp
            && (self.smtp_username.is_empty() || self.smtp_password.is_empty())
        {
            bail!("TITAN_EMAIL and TITAN_PASSWORD are required for the smtp transport");
        }
        if self.smtp_username.is_empty() {
            bail!("TITAN_EMAIL is required (it is the sender address)");
        }
        self.sender()?;
        self.admin()?;
        Ok(())
    }
}

fn parse_bool(key: &str, v: &str) -> Result<bool, anyhow::Error> {
    match v.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => bail!("Invalid {key}: {v} (expected true/false)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<ApiConfig, anyhow::Error> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn smtp_needs_credentials() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("TITAN_EMAIL"));
        assert!(load(&[("TITAN_EMAIL", "desk@example.com")]).is_err());
    }

    #[test]
    fn admin_defaults_to_sender() {
        let c = load(&[("TITAN_EMAIL", "desk@example.com"), ("TITAN_PASSWORD", "pw")]).unwrap();
        assert_eq!(c.admin_email, "desk@example.com");
        assert_eq!(c.smtp_host, "smtp.titan.email");
        assert_eq!(c.smtp_port, 465);
        assert_eq!(c.deployment, Deployment::Production);
        let sender = c.sender().unwrap();
        assert_eq!(sender.name.as_deref(), Some("Lead Desk"));
        assert_eq!(sender.email.to_string(), "desk@example.com");
    }

    #[test]
    fn overrides_apply() {
        let c = load(&[
            ("TITAN_EMAIL", "desk@example.com"),
            ("ADMIN_EMAIL", "owner@example.com"),
            ("MAIL_TRANSPORT", "FILE"),
            ("LISTEN_PORT", "9000"),
            ("APP_ENV", "development"),
            ("LOG_TO_FILE", "yes"),
        ])
        .unwrap();
        assert_eq!(c.transport, Transport::File);
        assert_eq!(c.listen_port, 9000);
        assert_eq!(c.admin_email, "owner@example.com");
        assert_eq!(c.deployment, Deployment::Development);
        assert!(c.log_to_file);
    }

    #[test]
    fn bad_values_are_rejected() {
        let base = [("TITAN_EMAIL", "desk@example.com"), ("MAIL_TRANSPORT", "file")];
        let with = |k, v| {
            let mut p = base.to_vec();
            p.push((k, v));
            load(&p)
        };
        assert!(with("LISTEN_PORT", "http").is_err());
        assert!(with("MAIL_TRANSPORT", "carrier-pigeon").is_err());
        assert!(with("ADMIN_EMAIL", "not an address").is_err());
        assert!(with("LOG_TO_STDOUT", "maybe").is_err());
    }
}
