//! Route handlers: the contact endpoint, its CORS headers and error mapping.

use std::sync::Arc;

use axum::{
    extract::{FromRequest, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{on, MethodFilter},
    Form, Json, Router,
};
use lettre::message::Mailbox;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::config::{ApiConfig, Deployment};
use crate::email::{EmailError, MailTransport, OutgoingMail};
use crate::render::{
    admin_subject, client_subject, now_formatted, render_admin_notification,
    render_client_confirmation, RenderInput,
};
use crate::validator::{validate, MxResolver, Rejection, SubmissionInput};

/// Shared state for the contact endpoint. Built once at startup.
pub struct AppState {
    pub mailer: Arc<dyn MailTransport>,
    pub resolver: Arc<dyn MxResolver>,
    pub sender: Mailbox,
    pub admin: Mailbox,
    pub deployment: Deployment,
}

impl AppState {
    pub fn new(
        config: &ApiConfig,
        mailer: Arc<dyn MailTransport>,
        resolver: Arc<dyn MxResolver>,
    ) -> Result<Self, anyhow::Error> {
        Ok(Self {
            mailer,
            resolver,
            sender: config.sender()?,
            admin: config.admin()?,
            deployment: config.deployment,
        })
    }
}

/// Router serving the endpoint at `/` and `/api/contact`.
pub fn router(state: Arc<AppState>) -> Router {
    let contact = on(MethodFilter::POST, submit)
        .on(MethodFilter::OPTIONS, preflight)
        .fallback(method_not_allowed);

    Router::new()
        .route("/", contact.clone())
        .route("/api/contact", contact)
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Errors surfaced by the endpoint, each mapped to a status and JSON body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error("{0}")]
    BadRequest(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Failed to send email")]
    Dispatch {
        source: EmailError,
        /// Include transport diagnostics in the body (development only).
        expose_debug: bool,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Rejected(r) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": r.to_string() }))).into_response()
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(json!({ "error": "Method not allowed" })),
            )
                .into_response(),
            ApiError::Dispatch {
                source,
                expose_debug,
            } => {
                let mut body = json!({
                    "error": "Failed to send email",
                    "details": source.to_string(),
                });
                if expose_debug {
                    body["debug"] = debug_info(&source);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

fn debug_info(e: &EmailError) -> serde_json::Value {
    match e {
        EmailError::Smtp {
            code, permanent, ..
        } => json!({ "kind": "smtp", "code": code, "permanent": permanent }),
        EmailError::Render(_) => json!({ "kind": "render" }),
        EmailError::Address(_) => json!({ "kind": "address" }),
        EmailError::Build(_) => json!({ "kind": "build" }),
        EmailError::File(_) => json!({ "kind": "file" }),
    }
}

/// JSON or urlencoded form body, chosen by `Content-Type`.
pub struct SubmissionBody(pub SubmissionInput);

impl<S> FromRequest<S> for SubmissionBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
        let input = if is_form {
            let Form(input) = Form::<SubmissionInput>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            input
        } else {
            let Json(input) = Json::<SubmissionInput>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            input
        };
        Ok(SubmissionBody(input))
    }
}

/// Success body for a dispatched lead.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub message: &'static str,
    pub client_email_id: Option<String>,
    pub admin_email_id: String,
}

/// OPTIONS: CORS preflight, empty 200.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// POST: validate, render both emails, send the confirmation (when there is an
/// address to send it to) and then the admin notification.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    SubmissionBody(input): SubmissionBody,
) -> Result<Json<SubmitResponse>, ApiError> {
    let input = input.normalized();
    info!(
        name = ?input.contact_name,
        email = ?input.contact_email,
        has_phone = input.contact_phone.is_some(),
        "contact submission received"
    );

    let client_to = match validate(&input, state.resolver.as_ref()).await {
        Ok(address) => address.map(|a| Mailbox::new(None, a)),
        Err(reason) => {
            info!(%reason, "submission rejected");
            return Err(reason.into());
        }
    };

    let dispatch_err = |source: EmailError| ApiError::Dispatch {
        source,
        expose_debug: state.deployment == Deployment::Development,
    };

    let render_input = RenderInput {
        submitted_at: Some(now_formatted()),
        ..RenderInput::from(&input)
    };
    let client_mail = match client_to {
        Some(to) => Some(OutgoingMail {
            from: state.sender.clone(),
            to,
            subject: client_subject(),
            html: render_client_confirmation(&render_input).map_err(dispatch_err)?,
        }),
        None => None,
    };
    let admin_mail = OutgoingMail {
        from: state.sender.clone(),
        to: state.admin.clone(),
        subject: admin_subject(&render_input),
        html: render_admin_notification(&render_input).map_err(dispatch_err)?,
    };

    let client_email_id = match client_mail {
        Some(mail) => {
            let id = state.mailer.send_mail(mail).await.map_err(|e| {
                error!(error = %e, "confirmation email failed, admin notification not attempted");
                dispatch_err(e)
            })?;
            info!(message_id = %id, "confirmation email sent");
            Some(id)
        }
        None => None,
    };

    let admin_email_id = state.mailer.send_mail(admin_mail).await.map_err(|e| {
        match &client_email_id {
            Some(client_id) => warn!(
                error = %e,
                client_message_id = %client_id,
                "admin notification failed after the confirmation was already delivered"
            ),
            None => error!(error = %e, "admin notification failed"),
        }
        dispatch_err(e)
    })?;
    info!(message_id = %admin_email_id, "admin notification sent");

    Ok(Json(SubmitResponse {
        success: true,
        message: "Emails sent successfully",
        client_email_id,
        admin_email_id,
    }))
}
