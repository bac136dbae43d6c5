use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quorum::error::QuorumError;
use quorum::models::DocumentContent;
use quorum::sources::{HttpSummaryIndex, HttpTranscriptStore, SummaryIndex, TranscriptStore};

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn test_all_summaries_parses_map() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/summaries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "all_summaries": {
                "m2": { "embedding": [0.0, 1.0], "title": "Retro" },
                "m1": { "embedding": [1.0, 0.0], "summary_text": "Budget talk." }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let index = HttpSummaryIndex::with_base_url(&format!("{}/", server.uri()), 5)
        .expect("valid url");
    let records = index.all_summaries().await.expect("summaries");

    let ids: Vec<&str> = records.iter().map(|r| r.script_id.as_str()).collect();
    assert_eq!(ids, vec!["m1", "m2"]);
    assert_eq!(records[0].embedding, vec![1.0, 0.0]);
    assert_eq!(records[0].summary_text.as_deref(), Some("Budget talk."));
    assert_eq!(records[1].title.as_deref(), Some("Retro"));
}

#[tokio::test]
async fn test_all_summaries_empty_corpus() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/summaries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let index = HttpSummaryIndex::with_base_url(&server.uri(), 5).expect("valid url");
    let records = index.all_summaries().await.expect("summaries");

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_all_summaries_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/summaries"))
        .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
        .mount(&server)
        .await;

    let index = HttpSummaryIndex::with_base_url(&server.uri(), 5).expect("valid url");
    let result = index.all_summaries().await;

    match result {
        Err(QuorumError::SummaryIndex(message)) => assert!(message.contains("503")),
        other => panic!("Expected SummaryIndex error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_selected_summaries_posts_ids_and_filters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/summaries/selected"))
        .and(body_json(json!({ "selected_script_ids": ["m1", "m9"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "selected_summary": {
                "m1": { "embedding": [1.0, 0.0] },
                "m3": { "embedding": [0.5, 0.5] }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let index = HttpSummaryIndex::with_base_url(&server.uri(), 5).expect("valid url");
    let records = index
        .summaries_for(&ids(&["m1", "m9"]))
        .await
        .expect("summaries");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].script_id, "m1");
}

#[tokio::test]
async fn test_selected_summaries_not_found_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/summaries/selected"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let index = HttpSummaryIndex::with_base_url(&server.uri(), 5).expect("valid url");
    let records = index
        .summaries_for(&ids(&["nope"]))
        .await
        .expect("404 is not an error");

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_selected_summaries_skips_request_for_empty_selection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let index = HttpSummaryIndex::with_base_url(&server.uri(), 5).expect("valid url");
    let records = index.summaries_for(&[]).await.expect("no request");

    assert!(records.is_empty());
}

#[test]
fn test_invalid_base_url_rejected() {
    assert!(matches!(
        HttpSummaryIndex::with_base_url("not a url", 5),
        Err(QuorumError::UrlParse(_))
    ));
    assert!(matches!(
        HttpTranscriptStore::with_base_url("", 5),
        Err(QuorumError::UrlParse(_))
    ));
}

#[tokio::test]
async fn test_fetch_transcripts_in_request_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/scripts"))
        .and(query_param("ids", "b,a,missing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "script_id": "a", "title": "Planning", "script_text": "We ship Friday." },
            {
                "script_id": "b",
                "timestamp": "2024-05-01",
                "segments": [
                    { "speaker": "Speaker 1", "text": "Budget is tight." },
                    { "speaker": "Speaker 2", "text": "Agreed." }
                ]
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = HttpTranscriptStore::with_base_url(&server.uri(), 5).expect("valid url");
    let documents = store
        .fetch(&ids(&["b", "a", "missing"]))
        .await
        .expect("documents");

    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].script_id, "b");
    assert_eq!(documents[0].title, "b");
    assert_eq!(documents[0].timestamp.as_deref(), Some("2024-05-01"));
    assert!(matches!(documents[0].content, DocumentContent::Segments(_)));
    assert_eq!(
        documents[0].full_text(),
        "Speaker 1: Budget is tight.\nSpeaker 2: Agreed."
    );
    assert_eq!(documents[1].script_id, "a");
    assert_eq!(documents[1].title, "Planning");
}

#[tokio::test]
async fn test_fetch_single_object_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/scripts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "solo",
            "scriptText": "Only one."
        })))
        .mount(&server)
        .await;

    let store = HttpTranscriptStore::with_base_url(&server.uri(), 5).expect("valid url");
    let documents = store.fetch(&ids(&["solo"])).await.expect("documents");

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].full_text(), "Only one.");
}

#[tokio::test]
async fn test_fetch_transcripts_service_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/scripts"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let store = HttpTranscriptStore::with_base_url(&server.uri(), 5).expect("valid url");
    let result = store.fetch(&ids(&["a"])).await;

    match result {
        Err(QuorumError::TranscriptService(message)) => assert!(message.contains("500")),
        other => panic!("Expected TranscriptService error, got: {other:?}"),
    }
}
