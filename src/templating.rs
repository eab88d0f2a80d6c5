//! # Template Merge Engine
//!
//! Renders notification subjects and bodies from stored email templates by
//! substituting `{{ key }}` placeholders. Rendering never fails: when a template
//! is missing or cannot be loaded, a built-in fallback message is merged instead.

use std::collections::HashMap;
use std::sync::OnceLock;

use metrics::counter;
use regex::{Captures, Regex};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Principal;
use crate::config::AppConfig;
use crate::repositories::EmailTemplateRepository;

/// Subject used when no template is stored under the requested key.
pub const FALLBACK_SUBJECT: &str = "Notification from your journal";

/// Body used when no template is stored under the requested key.
pub const FALLBACK_BODY: &str =
    "Hello {{user_name}},\n\nThere is an update waiting for you.\n\n{{action_url}}\n";

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn placeholder() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").expect("placeholder pattern is valid")
    })
}

/// Merge values keyed by placeholder name.
pub type MergeFields = HashMap<String, String>;

/// A rendered notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RenderedMessage {
    #[schema(example = "Your submission is under review")]
    pub subject: String,
    pub body: String,
}

/// Replaces every known `{{key}}` in `text`. Unknown placeholders are kept as written.
///
/// Values are inserted verbatim; nothing is escaped.
pub fn merge_placeholders(text: &str, fields: &MergeFields) -> String {
    placeholder()
        .replace_all(text, |caps: &Captures| match fields.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Builds the merge map: `user_name` and `action_url` defaults, overridden by `data`.
pub fn merge_fields(principal: &Principal, data: MergeFields, action_url: Option<&str>) -> MergeFields {
    let mut fields = MergeFields::with_capacity(data.len() + 2);
    fields.insert("user_name".to_string(), principal.display_name.clone());
    if let Some(url) = action_url {
        fields.insert("action_url".to_string(), url.to_string());
    }
    fields.extend(data);
    fields
}

/// Merges `fields` into a subject/body pair.
pub fn render_message(subject: &str, body: &str, fields: &MergeFields) -> RenderedMessage {
    RenderedMessage {
        subject: merge_placeholders(subject, fields),
        body: merge_placeholders(body, fields),
    }
}

/// Renders stored templates for notifications.
pub struct TemplateRenderer<'a> {
    db: &'a DatabaseConnection,
    config: &'a AppConfig,
}

impl<'a> TemplateRenderer<'a> {
    pub fn new(db: &'a DatabaseConnection, config: &'a AppConfig) -> Self {
        Self { db, config }
    }

    /// Renders the template stored under `key` for `principal`.
    ///
    /// `action_url` defaults to the configured default action URL.
    pub async fn render(
        &self,
        key: &str,
        principal: &Principal,
        data: MergeFields,
        action_url: Option<&str>,
    ) -> RenderedMessage {
        let action_url = action_url.unwrap_or(self.config.fallback_action_url());
        let fields = merge_fields(principal, data, Some(action_url));

        match EmailTemplateRepository::new(self.db).get(key).await {
            Ok(Some(template)) => render_message(&template.subject, &template.body, &fields),
            Ok(None) => {
                tracing::warn!(template = key, "Email template not found; using fallback");
                self.fallback(&fields)
            }
            Err(error) => {
                tracing::warn!(
                    template = key,
                    error = %error,
                    "Email template lookup failed; using fallback"
                );
                self.fallback(&fields)
            }
        }
    }

    fn fallback(&self, fields: &MergeFields) -> RenderedMessage {
        counter!("notification_template_fallback_total").increment(1);
        render_message(FALLBACK_SUBJECT, FALLBACK_BODY, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> MergeFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn ada() -> Principal {
        Principal {
            display_name: "Ada".to_string(),
            ..Principal::anonymous()
        }
    }

    #[test]
    fn replaces_known_placeholders_with_optional_whitespace() {
        let merged = merge_placeholders(
            "Dear {{user_name}}, see {{ action_url }}.",
            &fields(&[("user_name", "Ada"), ("action_url", "https://x.test/a")]),
        );
        assert_eq!(merged, "Dear Ada, see https://x.test/a.");
    }

    #[test]
    fn unknown_placeholders_pass_through() {
        let merged = merge_placeholders("Hi {{unknown_token}} {{ x }}", &fields(&[("x", "1")]));
        assert_eq!(merged, "Hi {{unknown_token}} 1");
    }

    #[test]
    fn keys_may_contain_dots_and_dashes() {
        let merged = merge_placeholders(
            "{{journal.name}} / {{issue-no}}",
            &fields(&[("journal.name", "Acme"), ("issue-no", "7")]),
        );
        assert_eq!(merged, "Acme / 7");
    }

    #[test]
    fn values_are_not_escaped() {
        let merged = merge_placeholders("{{v}}", &fields(&[("v", "<b>&</b>")]));
        assert_eq!(merged, "<b>&</b>");
    }

    #[test]
    fn substituted_values_are_not_merged_again() {
        let merged = merge_placeholders(
            "{{a}}",
            &fields(&[("a", "{{b}}"), ("b", "nope")]),
        );
        assert_eq!(merged, "{{b}}");
    }

    #[test]
    fn caller_data_overrides_defaults() {
        let merged = merge_fields(
            &ada(),
            fields(&[("user_name", "Dr. Lovelace"), ("status", "accepted")]),
            Some("https://x.test/default"),
        );

        assert_eq!(merged["user_name"], "Dr. Lovelace");
        assert_eq!(merged["action_url"], "https://x.test/default");
        assert_eq!(merged["status"], "accepted");
    }

    #[test]
    fn fallback_message_is_never_empty() {
        let rendered = render_message(
            FALLBACK_SUBJECT,
            FALLBACK_BODY,
            &merge_fields(&ada(), MergeFields::new(), Some("https://x.test")),
        );

        assert!(!rendered.subject.is_empty());
        assert!(rendered.body.contains("Hello Ada"));
        assert!(rendered.body.contains("https://x.test"));
    }
}
