use std::path::PathBuf;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::executor::{Method, Outcome};
use crate::output::{self, OutputFormat, ReportSink};
use crate::runner::{ListSource, Options, Runner, RunnerError};

// a local api that answers by method: POST 201, GET 200, PUT 405, DELETE 404
async fn crud_api() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let head = String::from_utf8_lossy(&buf[..n]).to_string();
                let status = match head.split_whitespace().next().unwrap_or_default() {
                    "POST" => "201 Created",
                    "GET" => "200 OK",
                    "PUT" => "405 Method Not Allowed",
                    _ => "404 Not Found",
                };
                let response =
                    format!("HTTP/1.1 {status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
                let _ = socket.write_all(response.as_bytes()).await;
            });
        }
    });
    format!("http://{addr}")
}

// a local port nothing listens on
async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn temp_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("crudder-{}-{}", std::process::id(), name))
}

#[tokio::test]
async fn end_to_end_scan_against_local_api() {
    let api = crud_api().await;
    let runner = Runner::new(Options {
        subdomains: ListSource::Inline(vec![api.clone()]),
        endpoints: ListSource::Inline(vec!["users".to_string(), "/health".to_string()]),
        methods: crate::utils::parse_method_letters("crud"),
        concurrency: 2,
        timeout_seconds: Some(10),
        ..Options::default()
    })
    .unwrap();
    let result = runner.run().await.unwrap();

    assert_eq!(result.requests, 8);
    assert_eq!(result.report.len(), 8);
    assert_eq!(result.report.failure_count(), 0);

    let endpoints: Vec<_> = result
        .report
        .endpoints
        .iter()
        .map(|e| e.endpoint.as_str())
        .collect();
    assert_eq!(endpoints, vec!["users", "/health"]);

    let users = result.report.endpoint("users").unwrap().subdomain(&api).unwrap();
    assert_eq!(users.url, format!("{api}/users"));
    let statuses: Vec<_> = users
        .results
        .iter()
        .map(|r| (r.method, r.outcome.status()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (Method::Post, Some(201)),
            (Method::Get, Some(200)),
            (Method::Put, Some(405)),
            (Method::Delete, Some(404)),
        ]
    );
}

#[tokio::test]
async fn unreachable_subdomain_only_fails_its_own_probes() {
    let api = crud_api().await;
    let dead = closed_port().await;
    let runner = Runner::new(Options {
        subdomains: ListSource::Inline(vec![dead.clone(), api.clone()]),
        endpoints: ListSource::Inline(vec!["/ping".to_string()]),
        methods: vec![Method::Get, Method::Delete],
        concurrency: 1,
        timeout_seconds: Some(10),
        ..Options::default()
    })
    .unwrap();
    let result = runner.run().await.unwrap();

    assert_eq!(result.requests, 4);
    let ping = result.report.endpoint("/ping").unwrap();
    let dead_group = ping.subdomain(&dead).unwrap();
    assert!(dead_group
        .results
        .iter()
        .all(|r| matches!(&r.outcome, Outcome::Failure { message } if message.contains("/ping"))));
    let live = ping.subdomain(&api).unwrap();
    assert_eq!(live.results[0].outcome, Outcome::Success { status: 200 });
    assert_eq!(live.results[1].outcome, Outcome::Success { status: 404 });

    let text = String::from_utf8(output::render_text(&result.report)).unwrap();
    assert!(text.contains("    GET failed to make GET request: "));
    assert!(!text.contains(&format!("request to {dead}")));
}

#[tokio::test]
async fn lists_load_from_files() {
    let subs = temp_file("subs.txt");
    let eps = temp_file("eps.txt");
    tokio::fs::write(&subs, "a.test\n\n  b.test  \n").await.unwrap();
    tokio::fs::write(&eps, "/one\n/two\n\n").await.unwrap();

    let runner = Runner::new(Options {
        subdomains: ListSource::FilePath(subs.to_string_lossy().to_string()),
        endpoints: ListSource::FilePath(eps.to_string_lossy().to_string()),
        methods: vec![Method::Get],
        ..Options::default()
    })
    .unwrap();
    let targets = runner.load_targets().await.unwrap();
    let _ = tokio::fs::remove_file(&subs).await;
    let _ = tokio::fs::remove_file(&eps).await;

    assert_eq!(targets.subdomains, vec!["a.test", "b.test"]);
    assert_eq!(targets.endpoints, vec!["/one", "/two"]);
}

#[tokio::test]
async fn blank_endpoint_file_is_rejected() {
    let eps = temp_file("blank-eps.txt");
    tokio::fs::write(&eps, "\n   \n").await.unwrap();
    let runner = Runner::new(Options {
        subdomains: ListSource::Inline(vec!["a.test".to_string()]),
        endpoints: ListSource::FilePath(eps.to_string_lossy().to_string()),
        methods: vec![Method::Get],
        ..Options::default()
    })
    .unwrap();
    let err = runner.load_targets().await.unwrap_err();
    let _ = tokio::fs::remove_file(&eps).await;
    assert!(matches!(err, RunnerError::NoEndpoints));
}

#[tokio::test]
async fn json_report_file_matches_scan() {
    let api = crud_api().await;
    let path = temp_file("report.json");
    let mut sink = ReportSink::create(&path, OutputFormat::Json).await.unwrap();

    let runner = Runner::new(Options {
        subdomains: ListSource::Inline(vec![api]),
        endpoints: ListSource::Inline(vec!["/items".to_string()]),
        methods: vec![Method::Put],
        timeout_seconds: Some(10),
        ..Options::default()
    })
    .unwrap();
    let result = runner.run().await.unwrap();
    sink.write(&result.report).await.unwrap();

    let written = tokio::fs::read(&path).await.unwrap();
    let _ = tokio::fs::remove_file(&path).await;
    let rows: serde_json::Value = serde_json::from_slice(&written).unwrap();
    assert_eq!(rows.as_array().map(|r| r.len()), Some(1));
    assert_eq!(rows[0]["method"], "PUT");
    assert_eq!(rows[0]["endpoint"], "/items");
    assert_eq!(rows[0]["status"], 405);
}
