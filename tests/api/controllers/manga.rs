use axum::http::StatusCode;
use manga_reader::{
    db::audit::append_audit,
    model::{AuditAction, AuditEntry, Chapter, Cover, Manga, MangaPage, MangaStatus, Role},
    response::ApiResponse,
};
use serde_json::json;

use crate::{
    AppStateTest, empty_request,
    fixtures::{fake_new_manga, insert_fake_chapter, insert_fake_manga},
    json_request, read_body,
};

#[tokio::test]
async fn should_reject_invalid_list_parameters() {
    let test_state = AppStateTest::new(false).await;

    for uri in [
        "/api/manga?page=0",
        "/api/manga?limit=0",
        "/api/manga?limit=101",
        "/api/manga?status=cancelled",
        "/api/manga?page=abc",
    ] {
        let response = test_state
            .generate_response(empty_request("GET", uri, None))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[tokio::test]
async fn should_reject_non_positive_ids() {
    let test_state = AppStateTest::new(false).await;

    for uri in ["/api/manga/0", "/api/manga/-4", "/api/manga/abc", "/api/manga/abc/chapters"] {
        let response = test_state
            .generate_response(empty_request("GET", uri, None))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_filter_by_status_and_overlapping_genres() {
    let test_state = AppStateTest::new(true).await;
    let pool = test_state.pool();

    let matching_action = insert_fake_manga(pool, MangaStatus::Ongoing, &["Action", "Drama"]).await;
    let matching_comedy = insert_fake_manga(pool, MangaStatus::Ongoing, &["Comedy"]).await;
    insert_fake_manga(pool, MangaStatus::Completed, &["Action"]).await;
    insert_fake_manga(pool, MangaStatus::Ongoing, &["Horror"]).await;

    let response = test_state
        .generate_response(empty_request(
            "GET",
            "/api/manga?status=ongoing&genres=Action,Comedy",
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = read_body::<MangaPage>(response).await.data.unwrap();
    let ids: Vec<i64> = page.manga.iter().map(|m| m.id).collect();

    assert_eq!(ids, vec![matching_comedy.id, matching_action.id]);
    assert_eq!(page.pagination.total, 2);
    assert_eq!(page.pagination.pages, 1);
    assert_eq!(page.pagination.limit, 20);

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_paginate_and_match_search_literally() {
    let test_state = AppStateTest::new(true).await;
    let pool = test_state.pool();

    for _ in 0..5 {
        insert_fake_manga(pool, MangaStatus::Hiatus, &[]).await;
    }

    let response = test_state
        .generate_response(empty_request("GET", "/api/manga?page=3&limit=2", None))
        .await;
    let page = read_body::<MangaPage>(response).await.data.unwrap();
    assert_eq!(page.manga.len(), 1);
    assert_eq!(page.pagination.total, 5);
    assert_eq!(page.pagination.pages, 3);

    let response = test_state
        .generate_response(empty_request("GET", "/api/manga?search=%25", None))
        .await;
    let page = read_body::<MangaPage>(response).await.data.unwrap();
    assert_eq!(page.pagination.total, 0);
    assert_eq!(page.pagination.pages, 0);

    let response = test_state
        .generate_response(empty_request(
            "GET",
            "/api/manga?page=9223372036854775807&limit=100",
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = read_body::<MangaPage>(response).await.data.unwrap();
    assert!(page.manga.is_empty());
    assert_eq!(page.pagination.total, 5);

    let response = test_state
        .generate_response(empty_request("GET", "/api/manga?status=&search=", None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = read_body::<MangaPage>(response).await.data.unwrap();
    assert_eq!(page.pagination.total, 5);

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_return_not_found_for_missing_manga() {
    let test_state = AppStateTest::new(true).await;

    for uri in ["/api/manga/9999", "/api/manga/9999/chapters"] {
        let response = test_state
            .generate_response(empty_request("GET", uri, None))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        let body: ApiResponse<()> = read_body(response).await;
        assert_eq!(body.error.as_deref(), Some("Manga not found"));
    }

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_list_chapters_in_ascending_order() {
    let test_state = AppStateTest::new(true).await;
    let pool = test_state.pool();
    let manga = insert_fake_manga(pool, MangaStatus::Ongoing, &["Action"]).await;

    insert_fake_chapter(pool, manga.id, 10.0).await;
    insert_fake_chapter(pool, manga.id, 1.5).await;
    insert_fake_chapter(pool, manga.id, 2.0).await;

    let response = test_state
        .generate_response(empty_request("GET", &format!("/api/manga/{}/chapters", manga.id), None))
        .await;
    let chapters = read_body::<Vec<Chapter>>(response).await.data.unwrap();
    let numbers: Vec<f64> = chapters.iter().map(|c| c.chapter_number).collect();

    assert_eq!(numbers, vec![1.5, 2.0, 10.0]);

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_audit_every_manga_mutation() {
    let test_state = AppStateTest::new(true).await;
    let (_, token) = test_state.generate_jwt_with_user(Role::Admin).await;

    let new_manga = fake_new_manga(MangaStatus::Ongoing, &["Action"]);
    let response = test_state
        .generate_response(json_request(
            "POST",
            "/api/manga",
            Some(&token),
            serde_json::to_value(&new_manga).unwrap(),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let manga = read_body::<Manga>(response).await.data.unwrap();
    assert_eq!(manga.title, new_manga.title);

    let response = test_state
        .generate_response(json_request(
            "PUT",
            &format!("/api/manga/{}", manga.id),
            Some(&token),
            json!({"title": "Renamed", "artist": null, "id": 42}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = read_body::<Manga>(response).await.data.unwrap();
    assert_eq!(updated.id, manga.id);
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.author, manga.author);

    let response = test_state
        .generate_response(json_request(
            "POST",
            &format!("/api/manga/{}/cover", manga.id),
            Some(&token),
            json!({"cover_image": "/covers/renamed.jpg"}),
        ))
        .await;
    let cover = read_body::<Cover>(response).await.data.unwrap();
    assert_eq!(cover.cover_image.as_deref(), Some("/covers/renamed.jpg"));

    let response = test_state
        .generate_response(empty_request("DELETE", &format!("/api/manga/{}", manga.id), Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = test_state
        .generate_response(empty_request("GET", "/api/manga/history", Some(&token)))
        .await;
    let entries = read_body::<Vec<AuditEntry>>(response).await.data.unwrap();
    let actions: Vec<AuditAction> = entries.iter().map(|e| e.record.action).collect();

    assert_eq!(
        actions,
        vec![
            AuditAction::Delete,
            AuditAction::Update,
            AuditAction::Update,
            AuditAction::Create
        ]
    );
    assert!(entries.iter().all(|e| e.record.manga_id == Some(manga.id)));
    assert!(entries.iter().all(|e| e.manga_title.is_none()));
    assert_eq!(
        entries[2].record.details,
        Some(json!({"title": "Renamed", "artist": null}))
    );

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_record_system_changes_without_an_actor() {
    let test_state = AppStateTest::new(true).await;
    let (_, token) = test_state.generate_jwt_with_user(Role::Admin).await;
    let pool = test_state.pool();
    let manga = insert_fake_manga(pool, MangaStatus::Ongoing, &[]).await;

    let mut tx = pool.begin().await.unwrap();
    let record = append_audit(
        &mut tx,
        None,
        manga.id,
        AuditAction::Update,
        Some(json!({"views": 0})),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    assert!(record.user_id.is_none());

    let response = test_state
        .generate_response(empty_request("GET", "/api/manga/history", Some(&token)))
        .await;
    let entries = read_body::<Vec<AuditEntry>>(response).await.data.unwrap();

    assert_eq!(entries.len(), 1);
    assert!(entries[0].record.user_id.is_none());
    assert!(entries[0].username.is_none());
    assert_eq!(entries[0].manga_title.as_deref(), Some(manga.title.as_str()));

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_reject_empty_update_without_writing() {
    let test_state = AppStateTest::new(true).await;
    let (_, token) = test_state.generate_jwt_with_user(Role::Admin).await;
    let manga = insert_fake_manga(test_state.pool(), MangaStatus::Ongoing, &[]).await;

    let response = test_state
        .generate_response(json_request(
            "PUT",
            &format!("/api/manga/{}", manga.id),
            Some(&token),
            json!({"unknown": "value"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = test_state
        .generate_response(empty_request("GET", "/api/manga/history", Some(&token)))
        .await;
    let entries = read_body::<Vec<AuditEntry>>(response).await.data.unwrap();
    assert!(entries.is_empty());

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_validate_manga_payload() {
    let test_state = AppStateTest::new(true).await;
    let (_, token) = test_state.generate_jwt_with_user(Role::Admin).await;

    let response = test_state
        .generate_response(json_request(
            "POST",
            "/api/manga",
            Some(&token),
            json!({
                "title": "",
                "description": "d",
                "author": "a",
                "status": "ongoing",
                "year": 1800
            }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ApiResponse<()> = read_body(response).await;
    let fields: Vec<String> = body.details.unwrap().into_iter().map(|d| d.field).collect();
    assert_eq!(fields, vec!["title", "year"]);

    test_state.cleanup().await;
}
