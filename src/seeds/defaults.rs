//! Default roles and email templates

use std::collections::HashSet;

use anyhow::{Context, Result};
use sea_orm::DatabaseConnection;

use crate::auth::permissions;
use crate::repositories::{EmailTemplateRepository, RoleRepository};
use crate::workflow::{RECEIVED_TEMPLATE, STATUS_CHANGED_TEMPLATE};

struct RoleSeed {
    name: &'static str,
    description: &'static str,
    permissions: &'static [&'static str],
}

struct TemplateSeed {
    slug: &'static str,
    subject: &'static str,
    body: &'static str,
}

const ROLES: &[RoleSeed] = &[
    RoleSeed {
        name: "journal-manager",
        description: "Runs a journal: navigation, announcements, reports and submissions",
        permissions: &[
            permissions::MANAGE_MENU,
            permissions::MANAGE_ANNOUNCEMENTS,
            permissions::VIEW_REPORTS,
            permissions::MANAGE_SUBMISSIONS,
        ],
    },
    RoleSeed {
        name: "editor",
        description: "Handles the editorial workflow",
        permissions: &[permissions::MANAGE_SUBMISSIONS, permissions::VIEW_REPORTS],
    },
    RoleSeed {
        name: "reviewer",
        description: "Reviews manuscripts",
        permissions: &[],
    },
];

const TEMPLATES: &[TemplateSeed] = &[
    TemplateSeed {
        slug: STATUS_CHANGED_TEMPLATE,
        subject: "[{{journal_name}}] \"{{submission_title}}\" is now {{status}}",
        body: "Dear {{user_name}},\n\nThe status of your submission \"{{submission_title}}\" to {{journal_name}} changed to: {{status}}.\n\nView it here: {{action_url}}\n",
    },
    TemplateSeed {
        slug: RECEIVED_TEMPLATE,
        subject: "[{{journal_name}}] We received \"{{submission_title}}\"",
        body: "Dear {{user_name}},\n\nThank you for submitting \"{{submission_title}}\" to {{journal_name}}. The editors will be in touch.\n\nTrack your submission: {{action_url}}\n",
    },
];

/// Seeds roles and templates.
pub async fn seed_defaults(db: &DatabaseConnection) -> Result<()> {
    seed_roles(db).await?;
    seed_templates(db).await?;
    tracing::info!("Default data seeding completed");
    Ok(())
}

/// Creates the default roles that do not exist yet.
pub async fn seed_roles(db: &DatabaseConnection) -> Result<()> {
    let repo = RoleRepository::new(db);
    let existing: HashSet<String> = repo
        .list_roles()
        .await
        .context("listing roles")?
        .into_iter()
        .map(|role| role.name)
        .collect();

    for seed in ROLES {
        if existing.contains(seed.name) {
            tracing::debug!(role = seed.name, "Role already exists, skipping");
            continue;
        }

        let permissions: Vec<String> = seed.permissions.iter().map(|p| p.to_string()).collect();
        repo.upsert_role(seed.name, Some(seed.description.to_string()), &permissions)
            .await
            .with_context(|| format!("creating role '{}'", seed.name))?;
        tracing::info!(role = seed.name, "Created default role");
    }

    Ok(())
}

/// Creates the default notification templates that do not exist yet.
pub async fn seed_templates(db: &DatabaseConnection) -> Result<()> {
    let repo = EmailTemplateRepository::new(db);

    for seed in TEMPLATES {
        let found = repo
            .get(seed.slug)
            .await
            .with_context(|| format!("looking up template '{}'", seed.slug))?;
        if found.is_some() {
            tracing::debug!(template = seed.slug, "Template already exists, skipping");
            continue;
        }

        repo.upsert(seed.slug, seed.subject.to_string(), seed.body.to_string())
            .await
            .with_context(|| format!("creating template '{}'", seed.slug))?;
        tracing::info!(template = seed.slug, "Created default template");
    }

    Ok(())
}
