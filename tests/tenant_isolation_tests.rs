//! Tests ensuring journal-owned data never leaks across tenants.

use anyhow::Result;
use journals::models::MenuItem;
use journals::repositories::{
    AnnouncementRepository, MenuItemChanges, MenuItemRepository, NewAnnouncement, NewMenuItem,
    ScopedRepository, VisitRepository,
};
use journals::tenancy::TenantContext;
use uuid::Uuid;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{create_journal, setup_test_db};

fn context_for(journal: &journals::models::tenant::Model) -> TenantContext {
    TenantContext::journal(journal.id, journal.slug.clone(), journal.name.clone())
}

fn menu_item(title: &str) -> NewMenuItem {
    NewMenuItem {
        title: title.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn inserts_are_stamped_with_the_active_journal() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = create_journal(&db, "acme").await?;
    let context = context_for(&acme);

    let item = MenuItemRepository::new(&db, &context)
        .create(menu_item("Home"))
        .await?;

    assert_eq!(item.tenant_id, Some(acme.id));
    Ok(())
}

#[tokio::test]
async fn reads_only_return_the_active_journals_rows() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = create_journal(&db, "acme").await?;
    let beta = create_journal(&db, "beta").await?;
    let (acme_ctx, beta_ctx) = (context_for(&acme), context_for(&beta));

    MenuItemRepository::new(&db, &acme_ctx)
        .create(menu_item("Acme home"))
        .await?;
    MenuItemRepository::new(&db, &beta_ctx)
        .create(menu_item("Beta home"))
        .await?;

    let acme_items = MenuItemRepository::new(&db, &acme_ctx).list().await?;
    assert_eq!(acme_items.len(), 1);
    assert_eq!(acme_items[0].title, "Acme home");

    let beta_items = MenuItemRepository::new(&db, &beta_ctx).list().await?;
    assert_eq!(beta_items.len(), 1);
    assert_eq!(beta_items[0].title, "Beta home");

    let everything = MenuItemRepository::new(&db, &TenantContext::Global)
        .list()
        .await?;
    assert_eq!(everything.len(), 2);
    Ok(())
}

#[tokio::test]
async fn other_journals_records_cannot_be_found_updated_or_deleted() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = create_journal(&db, "acme").await?;
    let beta = create_journal(&db, "beta").await?;
    let (acme_ctx, beta_ctx) = (context_for(&acme), context_for(&beta));

    let item = MenuItemRepository::new(&db, &acme_ctx)
        .create(menu_item("Acme only"))
        .await?;
    let intruder = MenuItemRepository::new(&db, &beta_ctx);

    assert!(intruder.find(item.id).await?.is_none());

    let update = intruder
        .update(
            item.id,
            MenuItemChanges {
                title: Some("Hijacked".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(update.is_err());

    assert!(intruder.delete(item.id).await.is_err());

    let still_there = MenuItemRepository::new(&db, &acme_ctx)
        .find(item.id)
        .await?
        .expect("item survives foreign writes");
    assert_eq!(still_there.title, "Acme only");
    Ok(())
}

#[tokio::test]
async fn parent_must_belong_to_the_same_journal() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = create_journal(&db, "acme").await?;
    let beta = create_journal(&db, "beta").await?;

    let acme_parent = MenuItemRepository::new(&db, &context_for(&acme))
        .create(menu_item("Acme section"))
        .await?;

    let result = MenuItemRepository::new(&db, &context_for(&beta))
        .create(NewMenuItem {
            parent_id: Some(acme_parent.id),
            ..menu_item("Beta child")
        })
        .await;

    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn global_mode_leaves_records_unowned() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = create_journal(&db, "acme").await?;

    let platform = AnnouncementRepository::new(&db, &TenantContext::Global)
        .create(NewAnnouncement {
            title: "Maintenance window".to_string(),
            body: String::new(),
            published: true,
        })
        .await?;
    assert_eq!(platform.tenant_id, None);

    AnnouncementRepository::new(&db, &context_for(&acme))
        .create(NewAnnouncement {
            title: "Call for papers".to_string(),
            body: String::new(),
            published: true,
        })
        .await?;

    let scoped = AnnouncementRepository::new(&db, &context_for(&acme))
        .list(false)
        .await?;
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].title, "Call for papers");

    let global = AnnouncementRepository::new(&db, &TenantContext::Global)
        .list(false)
        .await?;
    assert_eq!(global.len(), 2);
    Ok(())
}

#[tokio::test]
async fn visit_stats_are_per_journal() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = create_journal(&db, "acme").await?;
    let beta = create_journal(&db, "beta").await?;
    let (acme_ctx, beta_ctx) = (context_for(&acme), context_for(&beta));

    let acme_visits = VisitRepository::new(&db, &acme_ctx);
    acme_visits.record("/acme/issues/1", None, None).await?;
    acme_visits.record("/acme/issues/1", None, None).await?;
    acme_visits.record("/acme/about", None, None).await?;
    VisitRepository::new(&db, &beta_ctx)
        .record("/beta", None, None)
        .await?;

    let stats = VisitRepository::new(&db, &acme_ctx).stats().await?;
    assert_eq!(stats.total, 3);
    assert_eq!(stats.paths[0].path, "/acme/issues/1");
    assert_eq!(stats.paths[0].visits, 2);
    assert!(stats.paths.iter().all(|p| p.path.starts_with("/acme")));
    Ok(())
}

#[tokio::test]
async fn visit_metadata_is_capped_before_storage() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = create_journal(&db, "acme").await?;

    let visit = VisitRepository::new(&db, &context_for(&acme))
        .record(
            "/acme",
            Some(format!("https://search.example/?q={}", "é".repeat(5000))),
            Some("x".repeat(1000)),
        )
        .await?;

    assert_eq!(visit.referrer.map(|r| r.chars().count()), Some(2048));
    assert_eq!(visit.user_agent.map(|ua| ua.chars().count()), Some(512));
    assert_eq!(visit.tenant_id, Some(acme.id));
    Ok(())
}

#[tokio::test]
async fn unknown_journal_id_sees_nothing() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = create_journal(&db, "acme").await?;
    MenuItemRepository::new(&db, &context_for(&acme))
        .create(menu_item("Home"))
        .await?;

    let ghost = TenantContext::journal(Uuid::new_v4(), "ghost", "Ghost");
    assert!(MenuItemRepository::new(&db, &ghost).list().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn unscoped_override_reads_across_journals() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = create_journal(&db, "acme").await?;
    let beta = create_journal(&db, "beta").await?;

    let acme_item = MenuItemRepository::new(&db, &context_for(&acme))
        .create(menu_item("Acme home"))
        .await?;
    MenuItemRepository::new(&db, &context_for(&beta))
        .create(menu_item("Beta home"))
        .await?;

    let admin = ScopedRepository::<MenuItem>::unscoped(&db);
    assert_eq!(admin.tenant_id(), None);
    assert_eq!(admin.all().await?.len(), 2);

    let found = admin
        .find_by_id(acme_item.id)
        .await?
        .expect("unscoped lookup sees every journal");
    assert_eq!(found.tenant_id, Some(acme.id));
    Ok(())
}
