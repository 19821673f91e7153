//! Pulls the project fields out of a free-text contact message.
//!
//! The website form folds its project fields into the message body as
//! `Project Description: ...` and `Project Type(s): ...` blocks separated by a
//! blank line. Clients that send `projectDescription`/`projectType` directly
//! skip this path.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static DESCRIPTION: Lazy<Regex> = Lazy::new(|| field_pattern("project description"));
static PROJECT_TYPE: Lazy<Regex> = Lazy::new(|| field_pattern(r"project type\(s\)"));

// Label is matched case-insensitively; the value runs to the first blank line or end of input.
fn field_pattern(label: &str) -> Regex {
    Regex::new(&format!(r"(?is){label}:[ \t]*(.*?)(?:\r?\n\r?\n|$)"))
        .expect("field pattern is a valid regex")
}

/// Project fields found in a message. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedMessage {
    pub project_description: String,
    pub project_type: String,
}

impl ParsedMessage {
    pub fn is_empty(&self) -> bool {
        self.project_description.is_empty() && self.project_type.is_empty()
    }
}

/// Extract both project fields from `message`. Never fails.
pub fn parse(message: Option<&str>) -> ParsedMessage {
    let Some(message) = message else {
        return ParsedMessage::default();
    };
    ParsedMessage {
        project_description: capture(&DESCRIPTION, message),
        project_type: capture(&PROJECT_TYPE, message),
    }
}

fn capture(re: &Regex, message: &str) -> String {
    re.captures(message)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_fields() {
        let parsed = parse(Some(
            "Project Description: Build a site\n\nProject Type(s): Website",
        ));
        assert_eq!(parsed.project_description, "Build a site");
        assert_eq!(parsed.project_type, "Website");
    }

    #[test]
    fn labels_are_case_insensitive() {
        let parsed = parse(Some("project description: app\n\nPROJECT TYPE(S): Mobile, Web"));
        assert_eq!(parsed.project_description, "app");
        assert_eq!(parsed.project_type, "Mobile, Web");
    }

    #[test]
    fn description_may_span_lines_until_blank_line() {
        let parsed = parse(Some(
            "Hello!\n\nProject Description: line one\nline two\n\nProject Type(s): Branding\n\nThanks",
        ));
        assert_eq!(parsed.project_description, "line one\nline two");
        assert_eq!(parsed.project_type, "Branding");
    }

    #[test]
    fn crlf_blank_line_terminates() {
        let parsed = parse(Some("Project Description: a\r\n\r\nProject Type(s): b"));
        assert_eq!(parsed.project_description, "a");
        assert_eq!(parsed.project_type, "b");
    }

    #[test]
    fn missing_marker_gives_empty_field() {
        let parsed = parse(Some("Project Type(s): SEO"));
        assert_eq!(parsed.project_description, "");
        assert_eq!(parsed.project_type, "SEO");

        let parsed = parse(Some("Just wanted to say hi"));
        assert!(parsed.is_empty());
    }

    #[test]
    fn empty_and_absent_input() {
        assert!(parse(None).is_empty());
        assert!(parse(Some("")).is_empty());
    }
}
