//! # Visit Repository
//!
//! Records page views and aggregates them per path for the active journal.

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseConnection, QuerySelect, Set, sea_query::Expr};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::scoped::ScopedRepository;
use crate::error::RepositoryError;
use crate::models::visit::{self, Entity as Visit};
use crate::tenancy::TenantContext;

const MAX_PATH_LEN: usize = 2048;
const MAX_USER_AGENT_LEN: usize = 512;
const MAX_REFERRER_LEN: usize = 2048;

/// Aggregated visit counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct VisitStats {
    pub total: u64,
    /// Per-path counts, most visited first, ties by path
    pub paths: Vec<PathCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PathCount {
    pub path: String,
    pub visits: u64,
}

pub struct VisitRepository<'a> {
    db: &'a DatabaseConnection,
    scoped: ScopedRepository<'a, Visit>,
}

impl<'a> VisitRepository<'a> {
    pub fn new(db: &'a DatabaseConnection, context: &TenantContext) -> Self {
        Self {
            db,
            scoped: ScopedRepository::new(db, context),
        }
    }

    pub async fn record(
        &self,
        path: &str,
        referrer: Option<String>,
        user_agent: Option<String>,
    ) -> Result<visit::Model, RepositoryError> {
        let path = path.trim();
        if !path.starts_with('/') || path.len() > MAX_PATH_LEN {
            return Err(RepositoryError::validation_error(
                "path must be an absolute path of at most 2048 bytes",
            ));
        }

        let model = visit::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: ActiveValue::NotSet,
            path: Set(path.to_string()),
            referrer: Set(referrer
                .filter(|r| !r.trim().is_empty())
                .map(|r| truncate_chars(&r, MAX_REFERRER_LEN))),
            user_agent: Set(user_agent.map(|ua| truncate_chars(&ua, MAX_USER_AGENT_LEN))),
            visited_at: Set(Utc::now().into()),
        };

        self.scoped.insert(model).await
    }

    pub async fn stats(&self) -> Result<VisitStats, RepositoryError> {
        let rows: Vec<(String, i64)> = self
            .scoped
            .select()
            .select_only()
            .column(visit::Column::Path)
            .column_as(Expr::col(visit::Column::Id).count(), "visits")
            .group_by(visit::Column::Path)
            .into_tuple()
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(summarize(rows))
    }
}

fn summarize(rows: Vec<(String, i64)>) -> VisitStats {
    let mut paths: Vec<PathCount> = rows
        .into_iter()
        .map(|(path, visits)| PathCount {
            path,
            visits: visits.max(0) as u64,
        })
        .collect();
    paths.sort_by(|a, b| b.visits.cmp(&a.visits).then_with(|| a.path.cmp(&b.path)));

    VisitStats {
        total: paths.iter().map(|p| p.visits).sum(),
        paths,
    }
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_orders_by_count_then_path() {
        let stats = summarize(vec![
            ("/b".to_string(), 2),
            ("/c".to_string(), 5),
            ("/a".to_string(), 2),
        ]);

        assert_eq!(stats.total, 9);
        let order: Vec<_> = stats.paths.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(order, ["/c", "/a", "/b"]);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }
}
