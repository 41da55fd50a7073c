use std::sync::{Arc, Mutex};

use insightdesk_api_client::{ApiClient, Auth};
use insightdesk_core::composer::{Composer, ComposerError, SubmitOutcome};
use insightdesk_core::error::AppError;
use insightdesk_core::gateway::{ProgressFn, RecordRepository, TeamMemberRepository, UploadGateway};
use insightdesk_core::models::{Credentials, Insight, PendingFile, RecordId, TeamMember};
use mockito::{Matcher, Server};

fn client(server: &Server) -> ApiClient {
    ApiClient::new(server.url(), Auth::Bearer("tok".to_string())).unwrap()
}

#[tokio::test]
async fn upload_sends_multipart_with_bearer_and_reports_progress() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/upload")
        .match_header("authorization", "Bearer tok")
        .match_header("content-type", Matcher::Regex("multipart/form-data".to_string()))
        .match_body(Matcher::Regex("filename=\"cover.png\"".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"path": "uploads/cover.png", "isDuplicate": true}"#)
        .create_async()
        .await;

    let seen = Mutex::new(Vec::new());
    let record = |pct: u8| seen.lock().unwrap().push(pct);
    let progress: ProgressFn<'_> = &record;
    let file = PendingFile::new("cover.png", vec![7u8; 200 * 1024]);

    let receipt = client(&server)
        .upload_file(&file, Some(progress))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(receipt.reference, "uploads/cover.png");
    assert!(receipt.is_duplicate);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.first(), Some(&0));
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn oversized_upload_is_rejected_before_sending() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", "/upload").expect(0).create_async().await;

    let file = PendingFile::new("keynote.mp4", vec![0u8; 51 * 1024 * 1024]);
    let err = client(&server).upload_file(&file, None).await.unwrap_err();

    mock.assert_async().await;
    match err {
        AppError::PayloadTooLarge(msg) => assert!(msg.contains("50 MiB")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn server_413_maps_to_payload_too_large() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/upload")
        .with_status(413)
        .with_body(r#"{"error": "File too large"}"#)
        .create_async()
        .await;

    let file = PendingFile::new("clip.mp4", vec![0u8; 16]);
    let err = client(&server).upload_file(&file, None).await.unwrap_err();
    assert!(matches!(err, AppError::PayloadTooLarge(ref m) if m == "File too large"));
}

#[tokio::test]
async fn list_insights_passes_page_and_limit() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/insights")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".to_string(), "2".to_string()),
            Matcher::UrlEncoded("limit".to_string(), "10".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"data": [{"id": 11, "category": "Cloud", "article": {"title": "Notes"}}], "total": 11}"#,
        )
        .create_async()
        .await;

    let page = client(&server).list_insights(2, 10).await.unwrap();

    mock.assert_async().await;
    assert_eq!(page.total_count, 11);
    assert_eq!(page.items[0].id, Some(RecordId::from(11)));
    assert_eq!(page.items[0].display_title(), "Notes");
}

#[tokio::test]
async fn update_without_body_keeps_submitted_record() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/insights/42")
        .match_body(Matcher::PartialJsonString(
            r#"{"article": {"title": "Notes"}}"#.to_string(),
        ))
        .with_status(204)
        .create_async()
        .await;

    let insight: Insight =
        serde_json::from_str(r#"{"category": "AI", "article": {"title": "Notes"}}"#).unwrap();
    let saved = client(&server)
        .update_insight(&RecordId::from("42"), &insight)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(saved.id, Some(RecordId::from("42")));
    assert_eq!(saved.display_title(), "Notes");
}

#[tokio::test]
async fn unauthorized_response_maps_to_unauthorized() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/whitelist")
        .with_status(401)
        .create_async()
        .await;

    let err = client(&server).list_whitelist().await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn whitelist_remove_encodes_email() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/whitelist/ops%40example.com")
        .with_status(200)
        .create_async()
        .await;

    client(&server)
        .remove_from_whitelist("ops@example.com")
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn blank_whitelist_email_sends_nothing() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/whitelist")
        .expect(0)
        .create_async()
        .await;

    let added = client(&server).add_to_whitelist("   ").await.unwrap();
    assert!(!added);
    mock.assert_async().await;
}

#[tokio::test]
async fn login_returns_token_without_auth_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/auth/login")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Json(serde_json::json!({
            "email": "ops@example.com",
            "password": "hunter22"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token": "jwt-abc"}"#)
        .create_async()
        .await;

    let client = ApiClient::new(server.url(), Auth::Anonymous).unwrap();
    let response = client
        .login(&Credentials::new(" ops@example.com ", "hunter22"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.token.as_deref(), Some("jwt-abc"));
}

#[tokio::test]
async fn team_member_create_posts_image_path() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/team")
        .match_body(Matcher::PartialJsonString(
            r#"{"name": "Ada", "imagePath": "uploads/ada.png"}"#.to_string(),
        ))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "created", "id": 8}"#)
        .create_async()
        .await;

    let member = TeamMember {
        name: "Ada".to_string(),
        position: "CTO".to_string(),
        image_path: "uploads/ada.png".to_string(),
        ..Default::default()
    };
    let saved = client(&server).create_team_member(&member).await.unwrap();

    mock.assert_async().await;
    assert_eq!(saved.id, Some(8));
    assert_eq!(saved.name, "Ada");
}

#[tokio::test]
async fn composer_surfaces_server_validation_message() {
    let mut server = Server::new_async().await;
    let upload = server
        .mock("POST", "/upload")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"path": "uploads/cover.png"}"#)
        .create_async()
        .await;
    let create = server
        .mock("POST", "/insights")
        .match_body(Matcher::PartialJsonString(
            r#"{"article": {"thumbnail": "uploads/cover.png", "time": 10}}"#.to_string(),
        ))
        .with_status(422)
        .with_body(r#"{"error": "Description is required"}"#)
        .create_async()
        .await;

    let api = Arc::new(client(&server));
    let composer = Composer::new(api.clone(), api);
    composer
        .edit(|d| {
            d.article_title = "Notes".to_string();
            d.article_thumbnail_file = Some(PendingFile::new("cover.png", vec![1u8; 32]));
        })
        .unwrap();

    let result = composer.submit().await;

    upload.assert_async().await;
    create.assert_async().await;
    assert_eq!(
        result,
        Err(ComposerError::Persist("Description is required".to_string()))
    );
    assert_ne!(result, Ok(SubmitOutcome::Ignored));
}
