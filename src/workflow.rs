//! # Submission Workflow
//!
//! Editorial state changes for manuscripts, plus the author notifications they
//! trigger. Notifications are best effort: a template or delivery problem is
//! logged and counted, never rolled back into the workflow step.

use metrics::counter;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::Principal;
use crate::config::AppConfig;
use crate::error::WorkflowError;
use crate::mail::{Mailer, OutgoingMail};
use crate::models::submission::{self, SubmissionStatus};
use crate::repositories::{SubmissionRepository, UserRepository};
use crate::templating::{MergeFields, TemplateRenderer};
use crate::tenancy::TenantContext;

/// Template sent to the author after a status change.
pub const STATUS_CHANGED_TEMPLATE: &str = "submission-status-changed";
/// Template sent to the author after a new submission.
pub const RECEIVED_TEMPLATE: &str = "submission-received";

pub struct SubmissionWorkflow<'a> {
    db: &'a DatabaseConnection,
    config: &'a AppConfig,
    mailer: &'a dyn Mailer,
    context: &'a TenantContext,
}

impl<'a> SubmissionWorkflow<'a> {
    pub fn new(
        db: &'a DatabaseConnection,
        config: &'a AppConfig,
        mailer: &'a dyn Mailer,
        context: &'a TenantContext,
    ) -> Self {
        Self {
            db,
            config,
            mailer,
            context,
        }
    }

    fn submissions(&self) -> SubmissionRepository<'a> {
        SubmissionRepository::new(self.db, self.context)
    }

    /// Files a new manuscript for `author` and confirms receipt by mail.
    pub async fn submit(
        &self,
        author: &Principal,
        author_id: Uuid,
        title: &str,
        abstract_text: &str,
    ) -> Result<submission::Model, WorkflowError> {
        let created = self.submissions().create(author_id, title, abstract_text).await?;
        tracing::info!(submission_id = %created.id, %author_id, "Submission received");

        let data = self.base_fields(&created);
        self.notify(author, RECEIVED_TEMPLATE, data, &created).await;
        Ok(created)
    }

    /// Moves a submission to `next` and notifies its author.
    pub async fn transition(
        &self,
        id: Uuid,
        next: SubmissionStatus,
    ) -> Result<submission::Model, WorkflowError> {
        let repo = self.submissions();
        let current = repo
            .find(id)
            .await?
            .ok_or(WorkflowError::SubmissionNotFound(id))?;

        let from = current.status;
        if !from.can_transition_to(next) {
            return Err(WorkflowError::InvalidTransition { from, to: next });
        }

        let Some(updated) = repo.set_status(&current, next).await? else {
            // Moved by someone else since the read above.
            let latest = repo
                .find(id)
                .await?
                .ok_or(WorkflowError::SubmissionNotFound(id))?;
            tracing::info!(
                submission_id = %id,
                expected = from.label(),
                found = latest.status.label(),
                "Submission status changed concurrently"
            );
            return Err(WorkflowError::InvalidTransition {
                from: latest.status,
                to: next,
            });
        };
        tracing::info!(
            submission_id = %updated.id,
            from = from.label(),
            to = next.label(),
            "Submission status changed"
        );

        match self.author_of(&updated).await {
            Some(author) => {
                let mut data = self.base_fields(&updated);
                data.insert("status".to_string(), next.label().to_string());
                self.notify(&author, STATUS_CHANGED_TEMPLATE, data, &updated)
                    .await;
            }
            None => {
                tracing::warn!(submission_id = %updated.id, "Submission author not found; skipping notification");
            }
        }

        Ok(updated)
    }

    /// Link to the submission in the journal front end.
    pub fn action_url(&self, submission: &submission::Model) -> String {
        let base = self.config.public_base_url.trim_end_matches('/');
        match self.context.route_namespace() {
            Some(slug) => format!("{}/{}/submissions/{}", base, slug, submission.id),
            None => format!("{}/submissions/{}", base, submission.id),
        }
    }

    fn base_fields(&self, submission: &submission::Model) -> MergeFields {
        let journal_name = self
            .context
            .active()
            .map(|tenant| tenant.name.clone())
            .unwrap_or_else(|| "the journal".to_string());

        MergeFields::from([
            ("submission_title".to_string(), submission.title.clone()),
            ("journal_name".to_string(), journal_name),
        ])
    }

    async fn author_of(&self, submission: &submission::Model) -> Option<Principal> {
        match UserRepository::new(self.db).find_user(submission.author_id).await {
            Ok(Some(user)) => Some(Principal {
                user_id: Some(user.id),
                display_name: user.display_name,
                email: Some(user.email),
                permissions: Default::default(),
            }),
            Ok(None) => None,
            Err(error) => {
                tracing::warn!(error = %error, "Failed to load submission author");
                None
            }
        }
    }

    async fn notify(
        &self,
        recipient: &Principal,
        template: &str,
        data: MergeFields,
        submission: &submission::Model,
    ) {
        let Some(to) = recipient.email.clone() else {
            tracing::debug!(template, "Recipient has no email address; skipping notification");
            return;
        };

        let action_url = self.action_url(submission);
        let message = TemplateRenderer::new(self.db, self.config)
            .render(template, recipient, data, Some(&action_url))
            .await;

        let mail = OutgoingMail {
            to,
            subject: message.subject,
            body: message.body,
        };

        match self.mailer.deliver(&mail).await {
            Ok(()) => {
                counter!("notifications_delivered_total").increment(1);
            }
            Err(error) => {
                counter!("notifications_failed_total").increment(1);
                tracing::error!(
                    template,
                    submission_id = %submission.id,
                    error = %error,
                    "Notification delivery failed"
                );
            }
        }
    }
}
