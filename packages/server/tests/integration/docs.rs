use adserver::config::DocsConfig;

use crate::common::{TestApp, TestOptions, routes};

fn gated() -> TestOptions {
    TestOptions {
        docs: DocsConfig {
            username: Some("admin".into()),
            password: Some("s3cret".into()),
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::HEALTH).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "ok");
}

#[tokio::test]
async fn docs_are_open_without_credentials_configured() {
    let app = TestApp::spawn().await;

    let doc = app.get(routes::OPENAPI).await;
    assert_eq!(doc.status, 200);
    assert!(doc.body["paths"]["/api/v1/advertisements/{id}/impression"].is_object());
    assert!(doc.body["paths"]["/health"].is_object());

    assert_eq!(app.get(routes::SWAGGER).await.status, 200);
    assert_eq!(app.get(routes::SCALAR).await.status, 200);
}

#[tokio::test]
async fn gated_docs_challenge_anonymous_clients() {
    let app = TestApp::spawn_with(gated()).await;

    for path in [routes::OPENAPI, routes::SWAGGER, routes::SCALAR] {
        let res = app.get(path).await;
        assert_eq!(res.status, 401, "{path}");
        assert_eq!(res.body["code"], "UNAUTHORIZED");
        assert!(
            res.header("www-authenticate")
                .is_some_and(|v| v.starts_with("Basic")),
            "{path}"
        );
    }
}

#[tokio::test]
async fn gated_docs_accept_configured_credentials() {
    let app = TestApp::spawn_with(gated()).await;

    let res = app.get_with_basic(routes::OPENAPI, "admin", "s3cret").await;
    assert_eq!(res.status, 200);
    assert!(res.body["openapi"].is_string());
}

#[tokio::test]
async fn gated_docs_reject_wrong_password() {
    let app = TestApp::spawn_with(gated()).await;

    let res = app.get_with_basic(routes::OPENAPI, "admin", "guess").await;
    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn api_stays_open_when_docs_are_gated() {
    let app = TestApp::spawn_with(gated()).await;

    assert_eq!(app.get(routes::ADVERTISEMENTS).await.status, 200);
    assert_eq!(app.get(routes::HEALTH).await.status, 200);
}
