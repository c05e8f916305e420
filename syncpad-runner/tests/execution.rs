//! Integration tests against a real loopback execution endpoint.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use syncpad_core::Language;
use syncpad_runner::{CodeRunner, ExecError, RunnerConfig};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Minimal HTTP/1.1 endpoint: reads one request, answers with `body`.
/// With `hang`, the request is read and then never answered.
async fn start_endpoint(body: &'static str, hang: bool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                loop {
                    let Ok(n) = stream.read(&mut chunk).await else {
                        return;
                    };
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if request_complete(&buf) {
                        break;
                    }
                }

                if hang {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    return;
                }

                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    format!("http://{addr}")
}

fn request_complete(buf: &[u8]) -> bool {
    let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let head = String::from_utf8_lossy(&buf[..head_end]);
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())?
        })
        .unwrap_or(0);
    buf.len() >= head_end + 4 + content_length
}

#[tokio::test]
async fn test_successful_run_reports_output_and_cost() {
    init_logging();
    let url = start_endpoint(r#"{"output":"3\n","time":41,"memory":3200}"#, false).await;
    let runner = CodeRunner::new(RunnerConfig::default().with_endpoint(Language::Python, url));

    let report = runner
        .execute(Language::Python, "print(1+2)", "")
        .await
        .unwrap();
    assert_eq!(report.stdout, "3\n");
    assert_eq!(report.time_ms, 41);
    assert_eq!(report.memory_kb, 3200);
}

#[tokio::test]
async fn test_backend_reported_failure() {
    init_logging();
    let url = start_endpoint(r#"{"error":"SyntaxError: invalid syntax"}"#, false).await;
    let runner = CodeRunner::new(RunnerConfig::default().with_endpoint(Language::Python, url));

    let err = runner
        .execute(Language::Python, "print(", "")
        .await
        .unwrap_err();
    match err {
        ExecError::Failed(message) => assert!(message.contains("SyntaxError")),
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_hung_backend_times_out() {
    init_logging();
    let url = start_endpoint("{}", true).await;
    let runner = CodeRunner::new(
        RunnerConfig::default()
            .with_endpoint(Language::Java, url)
            .with_timeout(Duration::from_millis(200)),
    );

    let err = runner
        .execute(Language::Java, "class Main {}", "")
        .await
        .unwrap_err();
    assert!(matches!(err, ExecError::Timeout(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    init_logging();
    let runner = CodeRunner::new(
        RunnerConfig::default().with_endpoint(Language::Python, "http://127.0.0.1:1/run"),
    );

    let err = runner
        .execute(Language::Python, "print(1)", "")
        .await
        .unwrap_err();
    assert!(matches!(err, ExecError::Transport(_)));
}
