//! HTML bodies for the two lead emails.
//!
//! Both renderers collect the fields that were actually supplied into a list
//! of [`DetailRow`]s and hand that list to a handlebars template, so a missing
//! field never shows up as an empty row. Every `{{value}}` goes through
//! [`escape_html`]; URLs and asset references come from the constants below.

use chrono::Local;
use handlebars::Handlebars;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::email::EmailError;
use crate::parser::{self, ParsedMessage};
use crate::sanitize::{escape_html, truncate, DESCRIPTION_MAX, MESSAGE_MAX, NAME_MAX};
use crate::validator::SubmissionInput;

pub const BRAND_NAME: &str = "Brightline Studio";
pub const SITE_URL: &str = "https://brightline.studio";
pub const CONTACT_EMAIL: &str = "hello@brightline.studio";
pub const SCHEDULING_URL: &str = "https://cal.com/brightline/discovery-call";
pub const LOGO_URL: &str = "https://brightline.studio/assets/email/logo.png";
pub const COPYRIGHT: &str = "© 2025 Brightline Studio. All rights reserved.";

/// Greeting used when the submitter left the name blank.
pub const NAME_PLACEHOLDER: &str = "there";

const STEPS: [(&str, &str); 5] = [
    ("Review", "We read through your project details and goals."),
    ("Discovery call", "We set up a short call to understand what you need."),
    ("Proposal", "You get a scope, timeline and quote tailored to your project."),
    ("Kickoff", "Once approved, we plan milestones and start building."),
    ("Delivery", "We launch, hand over and stay around for support."),
];

static REGISTRY: Lazy<Result<Handlebars<'static>, String>> =
    Lazy::new(|| build_registry().map_err(|e| e.to_string()));

fn build_registry() -> Result<Handlebars<'static>, handlebars::TemplateError> {
    let mut reg = Handlebars::new();
    reg.set_strict_mode(true);
    reg.register_escape_fn(escape_html);
    reg.register_partial("base", include_str!("templates/base.hbs"))?;
    reg.register_template_string("client_confirmation", include_str!("templates/client_confirmation.hbs"))?;
    reg.register_template_string("admin_notification", include_str!("templates/admin_notification.hbs"))?;
    Ok(reg)
}

/// Data for one rendering. Blank or `None` fields are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct RenderInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Free text; parsed for project fields when neither project field is set.
    pub message: Option<String>,
    pub project_description: Option<String>,
    pub project_type: Option<String>,
    /// Admin notification only. Defaults to the current local time.
    pub submitted_at: Option<String>,
}

impl From<&SubmissionInput> for RenderInput {
    fn from(s: &SubmissionInput) -> Self {
        Self {
            name: s.contact_name.clone(),
            email: s.contact_email.clone(),
            phone: s.contact_phone.clone(),
            message: s.message.clone(),
            project_description: s.project_description.clone(),
            project_type: s.project_type.clone(),
            submitted_at: None,
        }
    }
}

impl RenderInput {
    fn field(v: &Option<String>) -> Option<&str> {
        v.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    fn name(&self) -> Option<String> {
        Self::field(&self.name).map(|n| truncate(n, NAME_MAX))
    }

    /// Structured fields win; otherwise fall back to parsing the message.
    fn project(&self) -> ParsedMessage {
        let description = Self::field(&self.project_description);
        let kind = Self::field(&self.project_type);
        if description.is_some() || kind.is_some() {
            return ParsedMessage {
                project_description: description.unwrap_or_default().to_string(),
                project_type: kind.unwrap_or_default().to_string(),
            };
        }
        parser::parse(Self::field(&self.message))
    }
}

/// One label/value line in the "details" table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailRow {
    pub label: &'static str,
    pub value: String,
}

/// Ordered rows, skipping anything absent.
#[derive(Debug, Default)]
struct Details(Vec<DetailRow>);

impl Details {
    fn push(&mut self, label: &'static str, value: Option<String>) -> &mut Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.0.push(DetailRow { label, value });
        }
        self
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

/// Rows shown to the submitter.
pub fn client_details(input: &RenderInput) -> Vec<DetailRow> {
    let project = input.project();
    let mut d = Details::default();
    d.push("Name", input.name())
        .push("Email", RenderInput::field(&input.email).map(str::to_string))
        .push("Phone", RenderInput::field(&input.phone).map(str::to_string))
        .push(
            "Project Description",
            non_empty(truncate(&project.project_description, DESCRIPTION_MAX)),
        )
        .push("Project Type", non_empty(project.project_type));
    d.0
}

/// Rows shown to the operator. Same as the client rows plus the raw message
/// when it carried no project markers, and the submission time.
pub fn admin_details(input: &RenderInput, submitted_at: &str) -> Vec<DetailRow> {
    let project = input.project();
    let mut d = Details(client_details(input));
    if project.is_empty() {
        d.push(
            "Message",
            RenderInput::field(&input.message).map(|m| truncate(m, MESSAGE_MAX)),
        );
    }
    d.push("Submitted", Some(submitted_at.to_string()));
    d.0
}

#[derive(Serialize)]
struct Brand {
    name: &'static str,
    site_url: &'static str,
    contact_email: &'static str,
    scheduling_url: &'static str,
    logo_url: &'static str,
    copyright: &'static str,
}

const BRAND: Brand = Brand {
    name: BRAND_NAME,
    site_url: SITE_URL,
    contact_email: CONTACT_EMAIL,
    scheduling_url: SCHEDULING_URL,
    logo_url: LOGO_URL,
    copyright: COPYRIGHT,
};

#[derive(Serialize)]
struct Step {
    number: usize,
    title: &'static str,
    text: &'static str,
}

#[derive(Serialize)]
struct ClientContext {
    brand: Brand,
    title: &'static str,
    preheader: String,
    greeting_name: String,
    details: Vec<DetailRow>,
    steps: Vec<Step>,
}

#[derive(Serialize)]
struct AdminContext {
    brand: Brand,
    title: &'static str,
    preheader: String,
    lead_name: String,
    details: Vec<DetailRow>,
    call_href: Option<String>,
    reply_href: Option<String>,
}

/// Confirmation sent to the person who filled in the form.
pub fn render_client_confirmation(input: &RenderInput) -> Result<String, EmailError> {
    let greeting_name = input.name().unwrap_or_else(|| NAME_PLACEHOLDER.to_string());
    let ctx = ClientContext {
        brand: BRAND,
        title: "We received your request",
        preheader: format!(
            "Thanks {greeting_name}, we received your project details and will be in touch shortly."
        ),
        greeting_name,
        details: client_details(input),
        steps: STEPS
            .iter()
            .enumerate()
            .map(|(i, &(title, text))| Step {
                number: i + 1,
                title,
                text,
            })
            .collect(),
    };
    render("client_confirmation", &ctx)
}

/// Lead notification sent to the operator.
pub fn render_admin_notification(input: &RenderInput) -> Result<String, EmailError> {
    let submitted_at = RenderInput::field(&input.submitted_at)
        .map(str::to_string)
        .unwrap_or_else(now_formatted);
    let lead_name = lead_label(input);
    let ctx = AdminContext {
        brand: BRAND,
        title: "New lead",
        preheader: format!("New lead from {lead_name}"),
        lead_name,
        details: admin_details(input, &submitted_at),
        call_href: RenderInput::field(&input.phone)
            .map(|p| format!("tel:{}", p.split_whitespace().collect::<String>())),
        reply_href: RenderInput::field(&input.email).map(|e| format!("mailto:{e}")),
    };
    render("admin_notification", &ctx)
}

/// Subject line for the submitter's confirmation.
pub fn client_subject() -> String {
    format!("Thanks for reaching out to {BRAND_NAME}, we received your request")
}

/// Subject line for the operator's notification.
pub fn admin_subject(input: &RenderInput) -> String {
    format!("New lead: {}", lead_label(input))
}

/// Name, else email, else a generic label.
fn lead_label(input: &RenderInput) -> String {
    input
        .name()
        .or_else(|| RenderInput::field(&input.email).map(str::to_string))
        .unwrap_or_else(|| "website visitor".to_string())
}

/// e.g. `March 4, 2025 at 9:07 AM`
pub fn now_formatted() -> String {
    Local::now().format("%B %-d, %Y at %-I:%M %p").to_string()
}

fn render<T: Serialize>(name: &str, ctx: &T) -> Result<String, EmailError> {
    let reg = REGISTRY
        .as_ref()
        .map_err(|e| EmailError::Render(e.clone()))?;
    reg.render(name, ctx)
        .map_err(|e| EmailError::Render(e.to_string()))
}
