//! End-to-end runs of the library pipeline against a mock content store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use custody_ingest::{
    ingest, split_str, HttpUploader, IngestError, IngestOptions, UploadError,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const SAMPLE: &str = include_str!("fixtures/northwind-sample.ttl");

/// Answers the n-th upload (0-based) with address `key-n`, or a 500 at
/// `fail_at`.
struct SequentialKeys {
    next: AtomicUsize,
    fail_at: Option<usize>,
}

impl SequentialKeys {
    fn new() -> Self {
        Self {
            next: AtomicUsize::new(0),
            fail_at: None,
        }
    }

    fn failing_at(n: usize) -> Self {
        Self {
            fail_at: Some(n),
            ..Self::new()
        }
    }
}

impl Respond for SequentialKeys {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(n) {
            return ResponseTemplate::new(500).set_body_string("store unavailable");
        }
        ResponseTemplate::new(200)
            .set_body_json(json!({"inner_envelope": {"hashkey": format!("key-{n}")}}))
    }
}

async fn store(responder: SequentialKeys) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(query_param("name", "next.ttl"))
        .respond_with(responder)
        .mount(&server)
        .await;
    server
}

fn uploader(server: &MockServer) -> Arc<HttpUploader> {
    Arc::new(HttpUploader::new(&server.uri(), None, Duration::from_secs(5)).unwrap())
}

/// The subject a rendered unit describes: its only line starting with `nw:`.
fn described_subject(request: &Request) -> String {
    let body = String::from_utf8(request.body.clone()).unwrap();
    let subjects: Vec<&str> = body
        .lines()
        .filter(|line| line.starts_with("nw:"))
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(subjects.len(), 1, "unexpected body:\n{body}");
    subjects[0].to_string()
}

fn link_header(request: &Request) -> Option<String> {
    request
        .headers
        .get("link")
        .map(|value| value.to_str().unwrap().to_string())
}

#[tokio::test]
async fn sample_is_uploaded_in_dependency_order_with_links() {
    let server = store(SequentialKeys::new()).await;
    let options = IngestOptions::default();
    let mut linker = options.linker(uploader(&server));

    let report = ingest(&split_str(SAMPLE), &options, &mut linker)
        .await
        .unwrap();
    assert_eq!(report.len(), 8);

    let received = server.received_requests().await.unwrap();
    let order: Vec<String> = received.iter().map(described_subject).collect();
    assert_eq!(
        order,
        vec![
            "nw:Employee-2",
            "nw:Employee-5",
            "nw:Supplier-5",
            "nw:Category-4",
            "nw:Product-11",
            "nw:Product-42",
            "nw:Customer-VINET",
            "nw:Order-10248",
        ]
    );

    let caused_by = |keys: &[&str]| {
        keys.iter()
            .map(|k| format!("<{k}>; rel=\"caused-by\""))
            .collect::<Vec<_>>()
            .join(", ")
    };
    assert_eq!(link_header(&received[0]), None);
    assert_eq!(link_header(&received[1]), Some(caused_by(&["key-0"])));
    // Category-4 sorts before Supplier-5.
    assert_eq!(link_header(&received[4]), Some(caused_by(&["key-3", "key-2"])));
    // Supplier-20 is not in the file, so only the category is linked.
    assert_eq!(link_header(&received[5]), Some(caused_by(&["key-3"])));
    // Country-FR is not in the file either.
    assert_eq!(link_header(&received[6]), None);
    assert_eq!(
        link_header(&received[7]),
        Some(caused_by(&["key-6", "key-1", "key-4", "key-5"]))
    );

    for (i, unit) in report.uploaded.iter().enumerate() {
        assert_eq!(unit.address, format!("key-{i}"));
        assert_eq!(unit.bytes, received[i].body.len());
    }
}

#[tokio::test]
async fn upload_failure_stops_the_run() {
    let server = store(SequentialKeys::failing_at(2)).await;
    let options = IngestOptions::default();
    let mut linker = options.linker(uploader(&server));

    let err = ingest(&split_str(SAMPLE), &options, &mut linker)
        .await
        .unwrap_err();
    match err {
        IngestError::UploadFailure {
            subject,
            source: UploadError::Rejected { status, body },
        } => {
            assert_eq!(subject, "http://northwind.com/Supplier-5");
            assert_eq!(status, 500);
            assert_eq!(body, "store unavailable");
        }
        other => panic!("expected upload failure, got {other:?}"),
    }

    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    let linked: Vec<&str> = linker.link_map().iter().map(|(s, _)| s).collect();
    assert_eq!(
        linked,
        vec![
            "http://northwind.com/Employee-2",
            "http://northwind.com/Employee-5"
        ]
    );
}

#[tokio::test]
async fn rejected_external_reference_uploads_nothing() {
    let server = store(SequentialKeys::new()).await;
    let options = IngestOptions {
        external_refs: custody_ingest::ExternalRefPolicy::Reject,
        ..IngestOptions::default()
    };
    let mut linker = options.linker(uploader(&server));

    let err = ingest(&split_str(SAMPLE), &options, &mut linker)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::ExternalReference { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}
