use manga_reader::{
    client::{ApiClient, ClientError},
    model::{MangaStatus, Role},
    payload::{MangaListParams, ReadingProgressRequest},
};
use reqwest::StatusCode;

use crate::{
    AppStateTest,
    fixtures::{fake_new_manga, fake_username_and_email},
    helper::spawn_app,
    set_role,
};

#[tokio::test]
async fn client_reads_health_and_stateless_routes() {
    let app = spawn_app().await;
    let mut client = ApiClient::new(&app.address);

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "OK");

    client.logout().await.unwrap();
    assert!(client.token().is_none());
}

#[tokio::test]
async fn client_surfaces_error_envelopes() {
    let app = spawn_app().await;
    let client = ApiClient::new(&app.address).with_token("not-a-jwt");

    let error = client.profile().await.unwrap_err();

    assert_eq!(error.status(), Some(StatusCode::UNAUTHORIZED));
    match error {
        ClientError::Api { message, .. } => assert_eq!(message, "Invalid token."),
        other => panic!("unexpected error: {other:?}"),
    }

    let params = MangaListParams {
        limit: Some(500),
        ..Default::default()
    };
    let error = client.list_manga(&params).await.unwrap_err();
    match error {
        ClientError::Api { status, details, .. } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(details[0].field, "limit");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Drives a full session through the typed client against a real server.
#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn client_session_flow() {
    let test_state = AppStateTest::new(true).await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    let router = manga_reader::routes::init_router(test_state.app_state.clone());
    tokio::spawn(async move { axum::serve(listener, router).await });

    let mut client = ApiClient::new(&address);
    let (username, email) = fake_username_and_email();

    let user = client.register(&username, &email, "secret123").await.unwrap();
    set_role(test_state.pool(), user.id, Role::Admin).await;

    let session = client.login(&username, "secret123").await.unwrap();
    assert_eq!(session.role, Role::Admin);
    assert_eq!(client.token(), Some(session.token.as_str()));

    let manga = client
        .create_manga(&fake_new_manga(MangaStatus::Completed, &["Mystery"]))
        .await
        .unwrap();
    let chapter = client
        .create_chapter(&manga_reader::payload::NewChapter {
            manga_id: manga.id,
            chapter_number: 1.0,
            title: None,
            pages: vec![],
        })
        .await
        .unwrap();

    client.add_favorite(manga.id).await.unwrap();
    client
        .save_progress(&ReadingProgressRequest {
            manga_id: manga.id,
            chapter_id: chapter.id,
            page_number: 4,
        })
        .await
        .unwrap();

    let stats = client.stats().await.unwrap();
    assert_eq!(stats.favorites_count, 1);
    assert_eq!(stats.chapters_read, 1);

    let page = client
        .list_manga(&MangaListParams {
            genres: Some("Mystery".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.manga[0].id, manga.id);

    let log = client.audit_log(Some(10)).await.unwrap();
    assert_eq!(log.len(), 2);

    client.logout().await.unwrap();
    assert!(matches!(
        client.stats().await,
        Err(ClientError::NotAuthenticated)
    ));

    test_state.cleanup().await;
}
