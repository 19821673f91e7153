//! Contact-form backend: validates a lead, renders a confirmation for the
//! submitter and a notification for the operator, and sends both over SMTP.

pub mod config;
pub mod email;
pub mod logger;
pub mod parser;
pub mod render;
pub mod routes;
pub mod sanitize;
pub mod validator;
