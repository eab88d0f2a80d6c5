//! HTTP-level tests for journal administration, tenant resolution and the menu API.

use anyhow::Result;
use axum::http::{Method, StatusCode};
use journals::auth::permissions;
use journals::menu::MAX_MENU_DEPTH;
use serde_json::{Value, json};

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{create_journal, create_user, grant_permissions, send, setup_test_db, test_app};

#[tokio::test]
async fn requests_without_bearer_token_are_rejected() -> Result<()> {
    let db = setup_test_db().await?;
    create_journal(&db, "acme").await?;
    let app = test_app(db);

    let response = tower::ServiceExt::oneshot(
        app,
        axum::http::Request::builder()
            .uri("/api/v1/j/acme/menu/tree")
            .body(axum::body::Body::empty())?,
    )
    .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn unknown_journal_fails_closed() -> Result<()> {
    let db = setup_test_db().await?;
    let app = test_app(db);

    let (status, body) = send(&app, Method::GET, "/api/v1/j/nope/menu/tree", None, None).await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TENANT_NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn inactive_journal_does_not_resolve() -> Result<()> {
    let db = setup_test_db().await?;
    create_journal(&db, "acme").await?;
    let app = test_app(db);

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/v1/journals/acme",
        None,
        Some(json!({ "active": false })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);

    let (status, body) = send(&app, Method::GET, "/api/v1/j/acme/menu", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TENANT_NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn journal_lifecycle() -> Result<()> {
    let db = setup_test_db().await?;
    let app = test_app(db);

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/v1/journals",
        None,
        Some(json!({ "slug": "acme-review", "name": "Acme Review" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "acme-review");
    assert_eq!(created["active"], true);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/journals",
        None,
        Some(json!({ "slug": "acme-review", "name": "Duplicate" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/journals",
        None,
        Some(json!({ "slug": "Not A Slug", "name": "Bad" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, fetched) = send(&app, Method::GET, "/api/v1/journals/acme-review", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], created["id"]);

    let (status, renamed) = send(
        &app,
        Method::PATCH,
        "/api/v1/journals/acme-review",
        None,
        Some(json!({ "name": "The Acme Review" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "The Acme Review");
    assert_eq!(renamed["slug"], "acme-review");

    let (status, listed) = send(&app, Method::GET, "/api/v1/journals", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (status, _) = send(&app, Method::GET, "/api/v1/journals/missing", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn menu_writes_need_a_user_with_manage_menu() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = create_journal(&db, "acme").await?;
    let reader = create_user(&db, "Reader").await?;
    let editor = create_user(&db, "Editor").await?;
    grant_permissions(&db, editor.id, "menu-editor", &[permissions::MANAGE_MENU], Some(acme.id)).await?;
    let app = test_app(db);
    let item = json!({ "title": "Home", "route": "home" });

    let (status, _) = send(&app, Method::POST, "/api/v1/j/acme/menu", None, Some(item.clone())).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/j/acme/menu",
        Some(reader.id),
        Some(item.clone()),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/v1/j/acme/menu",
        Some(editor.id),
        Some(item),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["tenant_id"], json!(acme.id));
    Ok(())
}

#[tokio::test]
async fn journal_grants_do_not_leak_into_other_journals() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = create_journal(&db, "acme").await?;
    create_journal(&db, "beta").await?;
    let editor = create_user(&db, "Editor").await?;
    grant_permissions(&db, editor.id, "menu-editor", &[permissions::MANAGE_MENU], Some(acme.id)).await?;
    let app = test_app(db);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/j/beta/menu",
        Some(editor.id),
        Some(json!({ "title": "Home" })),
    )
    .await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn global_grants_apply_in_every_journal() -> Result<()> {
    let db = setup_test_db().await?;
    create_journal(&db, "acme").await?;
    create_journal(&db, "beta").await?;
    let admin = create_user(&db, "Admin").await?;
    grant_permissions(&db, admin.id, "platform-admin", &[permissions::MANAGE_MENU], None).await?;
    let app = test_app(db);

    for journal in ["acme", "beta"] {
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/j/{}/menu", journal),
            Some(admin.id),
            Some(json!({ "title": "Home" })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }
    Ok(())
}

#[tokio::test]
async fn grant_role_endpoint_resolves_journal_slug() -> Result<()> {
    let db = setup_test_db().await?;
    create_journal(&db, "acme").await?;
    let app = test_app(db);

    let (status, user) = send(
        &app,
        Method::POST,
        "/api/v1/users",
        None,
        Some(json!({ "display_name": "Grace", "email": "grace@example.org" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = user["id"].as_str().unwrap_or_default().to_string();

    let (status, role) = send(
        &app,
        Method::POST,
        "/api/v1/roles",
        None,
        Some(json!({ "name": "analyst", "permissions": ["view-reports"] })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(role["permissions"], json!(["view-reports"]));

    let grant_uri = format!("/api/v1/users/{}/roles", user_id);
    let (status, grant) = send(
        &app,
        Method::POST,
        &grant_uri,
        None,
        Some(json!({ "role": "analyst", "journal": "acme" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(grant["journal"], "acme");

    let (status, _) = send(
        &app,
        Method::POST,
        &grant_uri,
        None,
        Some(json!({ "role": "analyst", "journal": "nowhere" })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        &grant_uri,
        None,
        Some(json!({ "role": "no-such-role" })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn menu_tree_is_filtered_by_permission_and_namespaced() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = create_journal(&db, "acme").await?;
    let manager = create_user(&db, "Manager").await?;
    grant_permissions(
        &db,
        manager.id,
        "journal-manager",
        &[permissions::MANAGE_MENU, permissions::VIEW_REPORTS],
        Some(acme.id),
    )
    .await?;
    let app = test_app(db);

    let (_, admin) = send(
        &app,
        Method::POST,
        "/api/v1/j/acme/menu",
        Some(manager.id),
        Some(json!({ "title": "Admin", "sort_order": 1 })),
    )
    .await?;
    send(
        &app,
        Method::POST,
        "/api/v1/j/acme/menu",
        Some(manager.id),
        Some(json!({
            "title": "Reports",
            "parent_id": admin["id"],
            "permission": "view-reports",
            "route": "reports"
        })),
    )
    .await?;
    send(
        &app,
        Method::POST,
        "/api/v1/j/acme/menu",
        Some(manager.id),
        Some(json!({ "title": "About", "route": "/about", "sort_order": 0 })),
    )
    .await?;

    let (status, guest_tree) = send(&app, Method::GET, "/api/v1/j/acme/menu/tree", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        guest_tree,
        json!([{
            "id": guest_tree[0]["id"],
            "title": "About",
            "icon": null,
            "url": "/acme/about",
            "children": []
        }])
    );

    let (status, manager_tree) = send(
        &app,
        Method::GET,
        "/api/v1/j/acme/menu/tree",
        Some(manager.id),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = manager_tree
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|node| node["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["About", "Admin"]);
    assert_eq!(manager_tree[1]["url"], Value::Null);
    assert_eq!(manager_tree[1]["children"][0]["url"], "/acme/reports");
    Ok(())
}

#[tokio::test]
async fn deleting_a_menu_item_reparents_its_children() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = create_journal(&db, "acme").await?;
    let manager = create_user(&db, "Manager").await?;
    grant_permissions(&db, manager.id, "menu-editor", &[permissions::MANAGE_MENU], Some(acme.id)).await?;
    let app = test_app(db);

    let (_, section) = send(
        &app,
        Method::POST,
        "/api/v1/j/acme/menu",
        Some(manager.id),
        Some(json!({ "title": "Section" })),
    )
    .await?;
    let (_, child) = send(
        &app,
        Method::POST,
        "/api/v1/j/acme/menu",
        Some(manager.id),
        Some(json!({ "title": "Child", "parent_id": section["id"], "route": "child" })),
    )
    .await?;

    let uri = format!("/api/v1/j/acme/menu/{}", section["id"].as_str().unwrap_or_default());
    let (status, _) = send(&app, Method::DELETE, &uri, Some(manager.id), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, items) = send(&app, Method::GET, "/api/v1/j/acme/menu", None, None).await?;
    assert_eq!(items.as_array().map(Vec::len), Some(1));
    assert_eq!(items[0]["id"], child["id"]);
    assert_eq!(items[0]["parent_id"], Value::Null);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(manager.id), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn moving_a_menu_item_under_its_descendant_is_rejected() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = create_journal(&db, "acme").await?;
    let manager = create_user(&db, "Manager").await?;
    grant_permissions(&db, manager.id, "menu-editor", &[permissions::MANAGE_MENU], Some(acme.id)).await?;
    let app = test_app(db);

    let (_, parent) = send(
        &app,
        Method::POST,
        "/api/v1/j/acme/menu",
        Some(manager.id),
        Some(json!({ "title": "Parent" })),
    )
    .await?;
    let (_, child) = send(
        &app,
        Method::POST,
        "/api/v1/j/acme/menu",
        Some(manager.id),
        Some(json!({ "title": "Child", "parent_id": parent["id"] })),
    )
    .await?;

    let uri = format!("/api/v1/j/acme/menu/{}", parent["id"].as_str().unwrap_or_default());
    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(manager.id),
        Some(json!({ "parent_id": child["id"] })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(manager.id),
        Some(json!({ "icon": "folder", "title": "Renamed" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["icon"], "folder");
    assert_eq!(updated["title"], "Renamed");
    Ok(())
}

#[tokio::test]
async fn menus_cannot_nest_past_the_depth_limit() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = create_journal(&db, "acme").await?;
    let manager = create_user(&db, "Manager").await?;
    grant_permissions(&db, manager.id, "menu-editor", &[permissions::MANAGE_MENU], Some(acme.id)).await?;
    let app = test_app(db);

    let mut parent = Value::Null;
    let mut chain = Vec::new();
    for level in 1..=MAX_MENU_DEPTH {
        let (status, item) = send(
            &app,
            Method::POST,
            "/api/v1/j/acme/menu",
            Some(manager.id),
            Some(json!({ "title": format!("Level {}", level), "route": "page", "parent_id": parent })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
        parent = item["id"].clone();
        chain.push(item);
    }

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/j/acme/menu",
        Some(manager.id),
        Some(json!({ "title": "Too deep", "parent_id": parent })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    // A two-level branch cannot hang below the second-deepest item either.
    let (_, branch) = send(
        &app,
        Method::POST,
        "/api/v1/j/acme/menu",
        Some(manager.id),
        Some(json!({ "title": "Branch" })),
    )
    .await?;
    send(
        &app,
        Method::POST,
        "/api/v1/j/acme/menu",
        Some(manager.id),
        Some(json!({ "title": "Leaf", "parent_id": branch["id"] })),
    )
    .await?;
    let uri = format!("/api/v1/j/acme/menu/{}", branch["id"].as_str().unwrap_or_default());
    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(manager.id),
        Some(json!({ "parent_id": chain[MAX_MENU_DEPTH - 2]["id"] })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(manager.id),
        Some(json!({ "parent_id": chain[MAX_MENU_DEPTH - 3]["id"] })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn announcements_are_scoped_except_on_the_global_route() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = create_journal(&db, "acme").await?;
    let beta = create_journal(&db, "beta").await?;
    let editor = create_user(&db, "Editor").await?;
    grant_permissions(&db, editor.id, "news", &[permissions::MANAGE_ANNOUNCEMENTS], None).await?;
    let app = test_app(db);

    for (journal, published) in [("acme", true), ("acme", false), ("beta", true)] {
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/j/{}/announcements", journal),
            Some(editor.id),
            Some(json!({ "title": format!("{} news", journal), "published": published })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, acme_all) = send(&app, Method::GET, "/api/v1/j/acme/announcements", None, None).await?;
    assert_eq!(acme_all.as_array().map(Vec::len), Some(2));
    assert!(acme_all.as_array().into_iter().flatten().all(|a| a["tenant_id"] == json!(acme.id)));

    let (_, acme_published) = send(
        &app,
        Method::GET,
        "/api/v1/j/acme/announcements?published_only=true",
        None,
        None,
    )
    .await?;
    assert_eq!(acme_published.as_array().map(Vec::len), Some(1));

    let (_, everything) = send(&app, Method::GET, "/api/v1/announcements", None, None).await?;
    assert_eq!(everything.as_array().map(Vec::len), Some(3));
    assert!(everything.as_array().into_iter().flatten().any(|a| a["tenant_id"] == json!(beta.id)));
    Ok(())
}

#[tokio::test]
async fn visits_are_recorded_and_reported() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = create_journal(&db, "acme").await?;
    let analyst = create_user(&db, "Analyst").await?;
    grant_permissions(&db, analyst.id, "analyst", &[permissions::VIEW_REPORTS], Some(acme.id)).await?;
    let app = test_app(db);

    for path in ["/acme", "/acme", "/acme/issues/2"] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/j/acme/visits",
            None,
            Some(json!({ "path": path })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["id"].is_string());
    }

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/j/acme/visits",
        None,
        Some(json!({ "path": "relative" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/v1/j/acme/visits/stats", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, stats) = send(
        &app,
        Method::GET,
        "/api/v1/j/acme/visits/stats",
        Some(analyst.id),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["paths"][0], json!({ "path": "/acme", "visits": 2 }));
    Ok(())
}

#[tokio::test]
async fn unknown_user_header_is_unauthorized() -> Result<()> {
    let db = setup_test_db().await?;
    create_journal(&db, "acme").await?;
    let app = test_app(db);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/j/acme/menu/tree",
        Some(uuid::Uuid::new_v4()),
        None,
    )
    .await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
