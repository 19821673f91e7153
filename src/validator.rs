//! Submission validation: contact presence, address shape, MX reachability, disposable domains.

use async_trait::async_trait;
use lettre::Address;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use trust_dns_resolver::{
    config::{ResolverConfig, ResolverOpts},
    error::ResolveError,
    TokioAsyncResolver,
};

/// Throwaway and test domains that never produce a real lead.
pub const DISPOSABLE_DOMAINS: &[&str] = &[
    "mailinator.com",
    "guerrillamail.com",
    "guerrillamail.net",
    "10minutemail.com",
    "tempmail.com",
    "temp-mail.org",
    "throwawaymail.com",
    "yopmail.com",
    "trashmail.com",
    "getnada.com",
    "sharklasers.com",
    "dispostable.com",
    "maildrop.cc",
    "fakeinbox.com",
    "example.com",
    "test.com",
];

// local@domain.tld, no whitespace, exactly one `@`.
static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email shape is a valid regex")
});

/// Raw contact form fields. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionInput {
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Structured alternative to embedding the description in `message`.
    #[serde(default)]
    pub project_description: Option<String>,
    #[serde(default)]
    pub project_type: Option<String>,
}

impl SubmissionInput {
    /// Trim every field and turn blank ones into `None`.
    pub fn normalized(self) -> Self {
        Self {
            contact_name: clean(self.contact_name),
            contact_email: clean(self.contact_email),
            contact_phone: clean(self.contact_phone),
            message: clean(self.message),
            project_description: clean(self.project_description),
            project_type: clean(self.project_type),
        }
    }
}

fn clean(field: Option<String>) -> Option<String> {
    field
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Why a submission was turned away. Display text goes straight to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Please provide at least a name or an email address")]
    MissingContact,
    #[error("Please provide a valid email address")]
    InvalidFormat,
    #[error("The email domain does not exist or cannot receive mail")]
    UnreachableDomain,
    #[error("Disposable email addresses are not accepted")]
    DisposableDomain,
}

/// Counts MX records for a domain.
#[async_trait]
pub trait MxResolver: Send + Sync {
    async fn mx_count(&self, domain: &str) -> Result<usize, ResolveError>;
}

/// System DNS resolver.
pub struct DnsResolver {
    inner: TokioAsyncResolver,
}

impl DnsResolver {
    /// Uses the system resolver config, or public defaults when it cannot be read.
    pub fn from_system() -> Self {
        let inner = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            info!(error = %e, "system resolver config unavailable, using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { inner }
    }
}

#[async_trait]
impl MxResolver for DnsResolver {
    async fn mx_count(&self, domain: &str) -> Result<usize, ResolveError> {
        let records = self.inner.mx_lookup(domain).await?;
        Ok(records.iter().count())
    }
}

/// Run the checks in order and stop at the first failure. Blank fields count as absent.
///
/// On success returns the parsed submitter address, or `None` for a name-only lead.
pub async fn validate(
    submission: &SubmissionInput,
    resolver: &dyn MxResolver,
) -> Result<Option<Address>, Rejection> {
    let Some(email) = present(&submission.contact_email) else {
        if present(&submission.contact_name).is_none() {
            return Err(Rejection::MissingContact);
        }
        return Ok(None);
    };

    if !EMAIL_SHAPE.is_match(email) {
        return Err(Rejection::InvalidFormat);
    }
    let address: Address = email.parse().map_err(|e| {
        info!(error = %e, "address passed shape check but is not deliverable syntax");
        Rejection::InvalidFormat
    })?;
    let domain = address.domain().to_ascii_lowercase();

    match resolver.mx_count(&domain).await {
        Ok(0) => {
            info!(%domain, "domain has no MX records");
            return Err(Rejection::UnreachableDomain);
        }
        Ok(n) => debug!(%domain, mx = n, "MX lookup ok"),
        Err(e) => {
            info!(%domain, error = %e, "MX lookup failed");
            return Err(Rejection::UnreachableDomain);
        }
    }

    if is_disposable(&domain) {
        return Err(Rejection::DisposableDomain);
    }
    Ok(Some(address))
}

/// Listed domains and any of their subdomains. `domain` must be lowercase.
fn is_disposable(domain: &str) -> bool {
    DISPOSABLE_DOMAINS.iter().any(|d| {
        domain == *d
            || domain
                .strip_suffix(d)
                .is_some_and(|head| head.ends_with('.'))
    })
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Answers every lookup with a fixed result and remembers what was asked.
    struct FixedMx {
        answer: Result<usize, &'static str>,
        asked: Mutex<Vec<String>>,
    }

    impl FixedMx {
        fn new(answer: Result<usize, &'static str>) -> Self {
            Self {
                answer,
                asked: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MxResolver for FixedMx {
        async fn mx_count(&self, domain: &str) -> Result<usize, ResolveError> {
            self.asked.lock().unwrap().push(domain.to_string());
            self.answer.map_err(ResolveError::from)
        }
    }

    fn with_email(email: &str) -> SubmissionInput {
        SubmissionInput {
            contact_email: Some(email.into()),
            ..Default::default()
        }
        .normalized()
    }

    #[tokio::test]
    async fn blank_name_and_email_is_missing_contact() {
        let mx = FixedMx::new(Ok(1));
        let sub = SubmissionInput {
            contact_name: Some("".into()),
            contact_email: Some("   ".into()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(validate(&sub, &mx).await, Err(Rejection::MissingContact));
        assert!(mx.asked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn raw_blank_fields_are_missing_contact() {
        let mx = FixedMx::new(Ok(1));
        let sub = SubmissionInput {
            contact_name: Some(String::new()),
            contact_email: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(validate(&sub, &mx).await, Err(Rejection::MissingContact));
    }

    #[tokio::test]
    async fn name_only_is_accepted_without_lookup() {
        let mx = FixedMx::new(Err("should not be called"));
        let sub = SubmissionInput {
            contact_name: Some("John Doe".into()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(validate(&sub, &mx).await, Ok(None));
        assert!(mx.asked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_shapes_are_invalid_format() {
        let mx = FixedMx::new(Ok(1));
        for email in [
            "not-an-email",
            "a@b",
            "a@@b.com",
            "a b@c.com",
            "@domain.com",
            "user@.",
            "user@domain.",
        ] {
            assert_eq!(
                validate(&with_email(email), &mx).await,
                Err(Rejection::InvalidFormat),
                "{email}"
            );
        }
        assert!(mx.asked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn lookup_failure_is_unreachable() {
        let mx = FixedMx::new(Err("NXDOMAIN"));
        let sub = with_email("x@nonexistent-domain-xyz123.invalid");
        assert_eq!(validate(&sub, &mx).await, Err(Rejection::UnreachableDomain));
        assert_eq!(
            mx.asked.lock().unwrap().as_slice(),
            ["nonexistent-domain-xyz123.invalid"]
        );
    }

    #[tokio::test]
    async fn zero_records_is_unreachable() {
        let mx = FixedMx::new(Ok(0));
        assert_eq!(
            validate(&with_email("x@nomail.org"), &mx).await,
            Err(Rejection::UnreachableDomain)
        );
    }

    #[tokio::test]
    async fn disposable_domain_is_rejected_case_insensitively() {
        let mx = FixedMx::new(Ok(2));
        assert_eq!(
            validate(&with_email("x@mailinator.com"), &mx).await,
            Err(Rejection::DisposableDomain)
        );
        assert_eq!(
            validate(&with_email("x@MailInator.COM"), &mx).await,
            Err(Rejection::DisposableDomain)
        );
    }

    #[tokio::test]
    async fn real_looking_address_is_accepted() {
        let mx = FixedMx::new(Ok(3));
        let address = validate(&with_email(" John@RealDomain.com "), &mx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(address.to_string(), "John@RealDomain.com");
        assert_eq!(mx.asked.lock().unwrap().as_slice(), ["realdomain.com"]);
    }

    #[tokio::test]
    async fn undeliverable_syntax_is_rejected_before_lookup() {
        let mx = FixedMx::new(Ok(1));
        assert_eq!(
            validate(&with_email("x@mailinator.com."), &mx).await,
            Err(Rejection::InvalidFormat)
        );
        assert!(mx.asked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn disposable_subdomains_are_rejected() {
        let mx = FixedMx::new(Ok(1));
        assert_eq!(
            validate(&with_email("x@sub.mailinator.com"), &mx).await,
            Err(Rejection::DisposableDomain)
        );
        assert_eq!(
            validate(&with_email("x@a.b.YopMail.com"), &mx).await,
            Err(Rejection::DisposableDomain)
        );
        assert!(validate(&with_email("x@notmailinator.com"), &mx).await.is_ok());
    }

    #[test]
    fn form_fields_deserialize_from_camel_case() {
        let sub: SubmissionInput = serde_json::from_str(
            r#"{"contactName":"Jane","contactEmail":"jane@x.io","contactPhone":"555","projectType":"SEO"}"#,
        )
        .unwrap();
        assert_eq!(sub.contact_name.as_deref(), Some("Jane"));
        assert_eq!(sub.contact_phone.as_deref(), Some("555"));
        assert_eq!(sub.project_type.as_deref(), Some("SEO"));
        assert!(sub.message.is_none());
    }
}
