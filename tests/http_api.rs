//! End-to-end tests of the `/config` HTTP API.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

type Values = BTreeMap<String, String>;

fn values(entries: &[(&str, &str)]) -> Values {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn test_translation_lifecycle() {
    let server = common::start_server().await;
    let client = common::http_client();
    let doc_url = server.url("/config/TRANSLATION/homepage/de");

    let res = client
        .post(&doc_url)
        .json(&json!({"home.title": "Willkommen", "home.sub": "Test"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let stored: Values = client.get(&doc_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(stored, values(&[("home.title", "Willkommen"), ("home.sub", "Test")]));

    let res = client
        .put(format!("{doc_url}/home.title"))
        .json(&json!({"value": "Neu"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let stored: Values = client.get(&doc_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(stored, values(&[("home.title", "Neu"), ("home.sub", "Test")]));

    let merged: Values = client
        .post(&doc_url)
        .json(&json!({"home.footer": "Copyright"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        merged,
        values(&[("home.title", "Neu"), ("home.sub", "Test"), ("home.footer", "Copyright")])
    );

    let file = server.dir.path().join("translation/de/homepage.properties");
    let content = std::fs::read_to_string(file).unwrap();
    let lines: Vec<&str> = content.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(lines, vec!["home.footer=Copyright", "home.sub=Test", "home.title=Neu"]);
}

#[tokio::test]
async fn test_application_document_and_keys() {
    let server = common::start_server().await;
    let client = common::http_client();
    let doc_url = server.url("/config/APPLICATION/mail");

    let merged: Values = client
        .post(&doc_url)
        .json(&json!({"smtp.host": "localhost", "smtp.port": "25"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(merged.len(), 2);

    let res = client
        .put(format!("{doc_url}/smtp.port"))
        .json(&json!({"value": "587"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.delete(format!("{doc_url}/smtp.host")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // A caller with older defaults cannot undo the edit.
    let merged: Values = client
        .post(&doc_url)
        .json(&json!({"smtp.port": "25"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(merged, values(&[("smtp.port", "587")]));

    let toml = std::fs::read_to_string(server.dir.path().join("application/mail.toml")).unwrap();
    assert!(toml.contains("[smtp]"));
    assert!(toml.contains("port = \"587\""));
}

#[tokio::test]
async fn test_delete_document() {
    let server = common::start_server().await;
    let client = common::http_client();
    let doc_url = server.url("/config/FEATURE_FLAG/beta");

    client.post(&doc_url).json(&json!({"enabled": "false"})).send().await.unwrap();

    let res = client.delete(&doc_url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.delete(&doc_url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let stored: Values = client.get(&doc_url).send().await.unwrap().json().await.unwrap();
    assert!(stored.is_empty());

    client
        .post(server.url("/config/TRANSLATION/homepage/fr"))
        .json(&json!({"title": "Bienvenue"}))
        .send()
        .await
        .unwrap();
    let res = client
        .delete(server.url("/config/TRANSLATION/homepage/fr"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_list_categories() {
    let server = common::start_server().await;
    let client = common::http_client();

    for category in ["mail", "auth"] {
        client
            .post(server.url(&format!("/config/CUSTOM/{category}")))
            .json(&json!({"x": "1"}))
            .send()
            .await
            .unwrap();
    }
    client
        .post(server.url("/config/TRANSLATION/homepage/de"))
        .json(&json!({"x": "1"}))
        .send()
        .await
        .unwrap();

    let categories: Vec<String> = client
        .get(server.url("/config/CUSTOM/categories"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(categories, vec!["auth", "mail"]);

    let categories: Vec<String> = client
        .get(server.url("/config/TRANSLATION/categories/de"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(categories, vec!["homepage"]);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let server = common::start_server().await;
    let client = common::http_client();

    let cases = [
        server.url("/config/SETTINGS/mail"),
        server.url("/config/TRANSLATION/homepage"),
        server.url("/config/APPLICATION/mail/de"),
        server.url("/config/APPLICATION/categories/de"),
        server.url("/config/TRANSLATION/categories"),
    ];
    for url in cases {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{url}");
        let body: Value = res.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    let res = client
        .post(server.url("/config/APPLICATION/..%2Fescape"))
        .json(&json!({"a": "1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cache_clear_picks_up_external_edits() {
    let server = common::start_server().await;
    let client = common::http_client();
    let doc_url = server.url("/config/APPLICATION/svc");

    client.post(&doc_url).json(&json!({"a": "1"})).send().await.unwrap();
    std::fs::write(
        server.dir.path().join("application/svc.toml"),
        "a = \"edited\"\n",
    )
    .unwrap();

    let stored: Values = client.get(&doc_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(stored, values(&[("a", "1")]));

    let res = client.get(server.url("/config/cache/clear")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(server.store.cached_documents(), 0);

    let stored: Values = client.get(&doc_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(stored, values(&[("a", "edited")]));
}

#[tokio::test]
async fn test_status_and_request_id() {
    let server = common::start_server().await;
    let client = common::http_client();

    let res = client.get(server.url("/status")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "operational");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
