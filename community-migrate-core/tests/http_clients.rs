mod support;

use community_migrate_core::circle::{CircleClient, PostFilter};
use community_migrate_core::config::{CircleConfig, IntercomConfig};
use community_migrate_core::contract::{
    ArticleState, HelpCenter, NewArticle, NewCollection, SourceCommunity,
};
use community_migrate_core::http::ApiError;
use community_migrate_core::intercom::IntercomClient;
use community_migrate_core::migrate::migrate_collections;
use support::{route, TestServer};

fn circle_config(base_url: &str) -> CircleConfig {
    CircleConfig {
        base_url: base_url.to_string(),
        community_id: 7,
        per_page: 2,
        api_key: "circle-key".to_string(),
    }
}

fn intercom_config(base_url: &str) -> IntercomConfig {
    IntercomConfig {
        base_url: base_url.to_string(),
        api_version: Some("2.10".to_string()),
        api_key: "intercom-key".to_string(),
    }
}

#[tokio::test]
async fn circle_posts_are_collected_until_an_empty_page() {
    let server = TestServer::start(|_| {
        vec![
            route(
                "GET",
                "/posts?community_id=7&per_page=2&page=1",
                200,
                r#"[{"id":1,"name":"First","space_name":"A1"},{"id":2,"name":"Second","space_name":"A1"}]"#,
            ),
            route(
                "GET",
                "/posts?community_id=7&per_page=2&page=2",
                200,
                r#"[{"id":3,"name":"Third","space_name":"B1","user_name":"Ana","body":{"body":"<p>x</p>"}}]"#,
            ),
            route("GET", "/posts?community_id=7&per_page=2&page=3", 200, "[]"),
        ]
    })
    .await;

    let client = CircleClient::new(&circle_config(&server.base_url)).unwrap();
    let posts = client.list_posts().await.expect("posts should load");

    let ids: Vec<u64> = posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(posts[2].body_html(), Some("<p>x</p>"));
    assert_eq!(server.requests().len(), 3);
    assert!(server
        .requests()
        .iter()
        .all(|r| r.headers.get("authorization").map(String::as_str) == Some("Bearer circle-key")));
}

#[tokio::test]
async fn circle_post_filter_sends_group_and_space_ids() {
    let server = TestServer::start(|_| {
        vec![route(
            "GET",
            "/posts?community_id=7&per_page=2&space_group_id=4&space_id=9&page=1",
            200,
            "[]",
        )]
    })
    .await;

    let client = CircleClient::new(&circle_config(&server.base_url)).unwrap();
    let posts = client
        .list_posts_filtered(PostFilter {
            space_id: Some(9),
            space_group_id: Some(4),
        })
        .await
        .unwrap();

    assert!(posts.is_empty());
    assert_eq!(
        server.targets(),
        vec!["/posts?community_id=7&per_page=2&space_group_id=4&space_id=9&page=1".to_string()]
    );
}

#[tokio::test]
async fn circle_hierarchy_endpoints_decode_groups_and_spaces() {
    let server = TestServer::start(|_| {
        vec![
            route(
                "GET",
                "/space_groups?community_id=7",
                200,
                r#"[{"id":1,"name":"A","slug":"a"}]"#,
            ),
            route(
                "GET",
                "/spaces?community_id=7",
                200,
                r#"[{"id":10,"name":"A1","space_group_id":1,"space_group_name":"A"}]"#,
            ),
        ]
    })
    .await;

    let client = CircleClient::new(&circle_config(&server.base_url)).unwrap();
    let groups = client.list_space_groups().await.unwrap();
    let spaces = client.list_spaces().await.unwrap();

    assert_eq!(groups[0].name, "A");
    assert_eq!(spaces[0].space_group_id, Some(1));
    assert_eq!(spaces[0].space_group_name.as_deref(), Some("A"));
}

#[tokio::test]
async fn non_success_status_is_reported_with_body() {
    let server = TestServer::start(|_| {
        vec![route(
            "GET",
            "/space_groups?community_id=7",
            401,
            r#"{"message":"bad token"}"#,
        )]
    })
    .await;

    let client = CircleClient::new(&circle_config(&server.base_url)).unwrap();
    let err = client.list_space_groups().await.unwrap_err();

    match err {
        ApiError::Status { status, body, url } => {
            assert_eq!(status, 401);
            assert!(body.contains("bad token"));
            assert!(url.ends_with("/space_groups"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server = TestServer::start(|_| {
        vec![route("GET", "/spaces?community_id=7", 200, "<html>maintenance</html>")]
    })
    .await;

    let client = CircleClient::new(&circle_config(&server.base_url)).unwrap();
    let err = client.list_spaces().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }), "got {err:?}");
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    let client = CircleClient::new(&circle_config("http://127.0.0.1:1")).unwrap();
    let err = client.list_spaces().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport { .. }), "got {err:?}");
}

#[tokio::test]
async fn intercom_collections_follow_next_links_and_decode_names() {
    let server = TestServer::start(|base| {
        vec![
            route(
                "GET",
                "/help_center/collections",
                200,
                format!(
                    r#"{{"type":"list","data":[{{"id":"1","name":"R&amp;D","parent_id":null}}],"total_count":2,"pages":{{"type":"pages","page":1,"per_page":1,"total_pages":2,"next":"{base}/help_center/collections?page=2"}}}}"#
                ),
            ),
            route(
                "GET",
                "/help_center/collections?page=2",
                200,
                r#"{"type":"list","data":[{"id":2,"name":"Caf&eacute;","parent_id":"1"}],"total_count":2,"pages":{"type":"pages","page":2,"per_page":1,"total_pages":2}}"#,
            ),
        ]
    })
    .await;

    let client = IntercomClient::new(&intercom_config(&server.base_url)).unwrap();
    let collections = client.list_collections().await.unwrap();

    let names: Vec<&str> = collections.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["R&D", "Café"]);
    assert_eq!(collections[1].id, "2");
    assert_eq!(collections[1].parent_id.as_deref(), Some("1"));

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].headers.get("intercom-version").map(String::as_str),
        Some("2.10")
    );
    assert_eq!(
        requests[0].headers.get("authorization").map(String::as_str),
        Some("Bearer intercom-key")
    );
}

#[tokio::test]
async fn intercom_create_calls_send_json_payloads() {
    let server = TestServer::start(|_| {
        vec![
            route(
                "POST",
                "/help_center/collections",
                200,
                r#"{"id":"55","name":"A1","parent_id":"1"}"#,
            ),
            route(
                "POST",
                "/articles",
                200,
                r#"{"id":"900","title":"Hello","parent_id":"55","author_id":12,"state":"published"}"#,
            ),
        ]
    })
    .await;

    let client = IntercomClient::new(&intercom_config(&server.base_url)).unwrap();
    let collection = client
        .create_collection(NewCollection {
            name: "A1".into(),
            parent_id: Some("1".into()),
        })
        .await
        .unwrap();
    assert_eq!(collection.id, "55");

    let article = client
        .create_article(NewArticle {
            title: "Hello".into(),
            author_id: "12".into(),
            body: Some("<p>hi</p>".into()),
            parent_id: Some("55".into()),
            state: ArticleState::Published,
        })
        .await
        .unwrap();
    assert_eq!(article.id, "900");
    assert_eq!(article.author_id.as_deref(), Some("12"));

    let requests = server.requests();
    let collection_body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(collection_body, serde_json::json!({"name": "A1", "parent_id": "1"}));
    let article_body: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
    assert_eq!(
        article_body,
        serde_json::json!({
            "title": "Hello",
            "author_id": "12",
            "body": "<p>hi</p>",
            "parent_id": "55",
            "state": "published"
        })
    );
}

#[tokio::test]
async fn intercom_root_collection_payload_omits_parent() {
    let server = TestServer::start(|_| {
        vec![route(
            "POST",
            "/help_center/collections",
            200,
            r#"{"id":"1","name":"A","parent_id":null}"#,
        )]
    })
    .await;

    let client = IntercomClient::new(&intercom_config(&server.base_url)).unwrap();
    client
        .create_collection(NewCollection {
            name: "A".into(),
            parent_id: None,
        })
        .await
        .unwrap();

    let body: serde_json::Value = serde_json::from_str(&server.requests()[0].body).unwrap();
    assert_eq!(body, serde_json::json!({"name": "A"}));
}

#[tokio::test]
async fn intercom_admins_and_deletes() {
    let server = TestServer::start(|_| {
        vec![
            route(
                "GET",
                "/admins",
                200,
                r#"{"type":"admin.list","admins":[{"id":"1","name":"Support technique","email":"support@example.com"}]}"#,
            ),
            route("DELETE", "/help_center/collections/5", 200, r#"{"id":"5","deleted":true}"#),
            route("DELETE", "/articles/6", 404, r#"{"type":"error.list"}"#),
        ]
    })
    .await;

    let client = IntercomClient::new(&intercom_config(&server.base_url)).unwrap();
    let admins = client.list_admins().await.unwrap();
    assert_eq!(admins[0].name, "Support technique");

    client.delete_collection("5".into()).await.unwrap();
    let err = client.delete_article("6".into()).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn intercom_articles_follow_cursor_pagination() {
    let server = TestServer::start(|_| {
        vec![
            route(
                "GET",
                "/articles",
                200,
                r#"{"type":"list","data":[{"id":"1","title":"Premier"}],"pages":{"type":"pages","next":{"page":2,"starting_after":"cursor42"}}}"#,
            ),
            route(
                "GET",
                "/articles?starting_after=cursor42",
                200,
                r#"{"type":"list","data":[{"id":"2","title":"Second"}],"pages":{"type":"pages","next":null}}"#,
            ),
        ]
    })
    .await;

    let client = IntercomClient::new(&intercom_config(&server.base_url)).unwrap();
    let articles = client.list_articles().await.unwrap();

    let ids: Vec<&str> = articles.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert_eq!(
        server.targets(),
        vec!["/articles".to_string(), "/articles?starting_after=cursor42".to_string()]
    );
}

#[tokio::test]
async fn intercom_stops_on_unrecognised_next_link() {
    let server = TestServer::start(|_| {
        vec![route(
            "GET",
            "/articles",
            200,
            r#"{"type":"list","data":[{"id":"1","title":"Seul"}],"pages":{"next":{"page":2}}}"#,
        )]
    })
    .await;

    let client = IntercomClient::new(&intercom_config(&server.base_url)).unwrap();
    let articles = client.list_articles().await.unwrap();

    assert_eq!(articles.len(), 1);
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn intercom_invalid_api_version_is_rejected() {
    let mut config = intercom_config("http://127.0.0.1:1");
    config.api_version = Some("2.10\nX-Injected: 1".to_string());

    let err = IntercomClient::new(&config)
        .err()
        .expect("an API version with a newline must be rejected");
    assert!(
        matches!(err, ApiError::InvalidHeader { name: "intercom-version", .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn escaped_destination_names_are_reused_on_rerun() {
    let server = TestServer::start(|_| {
        vec![
            route(
                "GET",
                "/space_groups?community_id=7",
                200,
                r#"[{"id":1,"name":"Équipe support"}]"#,
            ),
            route(
                "GET",
                "/spaces?community_id=7",
                200,
                r#"[{"id":10,"name":"«Guide» R&D","space_group_id":1,"space_group_name":"Équipe support"}]"#,
            ),
            route(
                "GET",
                "/help_center/collections",
                200,
                r#"{"type":"list","data":[{"id":"100","name":"&Eacute;quipe support","parent_id":null},{"id":"101","name":"&laquo;Guide&raquo; R&amp D","parent_id":"100"}],"pages":{"type":"pages"}}"#,
            ),
        ]
    })
    .await;

    let circle = CircleClient::new(&circle_config(&server.base_url)).unwrap();
    let intercom = IntercomClient::new(&intercom_config(&server.base_url)).unwrap();
    let lookup = migrate_collections(&circle, &intercom).await.unwrap();

    assert_eq!(lookup.created(), 0);
    assert_eq!(lookup.reused(), 2);
    assert_eq!(lookup.destination_id("Équipe support"), Some("100"));
    assert_eq!(lookup.destination_id("«Guide» R&D"), Some("101"));
    assert!(server.requests().iter().all(|r| r.method == "GET"));
}
