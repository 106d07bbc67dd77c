//! Unit tests for the fetch module

use super::*;
use crate::config::InstallerConfig;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

/// Helper struct to capture progress snapshots during testing
#[derive(Debug, Default)]
struct ProgressCapture {
    events: Arc<Mutex<Vec<FetchProgress>>>,
}

impl ProgressCapture {
    fn get_callback(&self) -> FetchCallback {
        let events = self.events.clone();
        Arc::new(move |progress: FetchProgress| {
            events.lock().unwrap().push(progress);
        })
    }

    fn get_events(&self) -> Vec<FetchProgress> {
        self.events.lock().unwrap().clone()
    }
}

fn test_config() -> InstallerConfig {
    InstallerConfig::default().without_delays()
}

#[tokio::test]
async fn test_fetch_writes_body_and_reports_completion() {
    let mock_server = MockServer::start().await;
    let test_content = vec![7u8; 64 * 1024];

    Mock::given(method("GET"))
        .and(path("/Splash.7z"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(test_content.clone()))
        .mount(&mock_server)
        .await;

    let temp_dir = tempdir().unwrap();
    let dest = temp_dir.path().join("staging").join("Splash.7z");
    let url = format!("{}/Splash.7z", mock_server.uri());

    let fetcher = Fetcher::new(&test_config()).unwrap();
    let progress = ProgressCapture::default();
    let size = fetcher.fetch(&url, &dest, Some(progress.get_callback())).await.unwrap();

    assert_eq!(size, test_content.len() as u64);
    assert_eq!(tokio::fs::read(&dest).await.unwrap(), test_content);
    assert!(!temp_dir.path().join("staging").join("Splash.7z.part").exists());

    let events = progress.get_events();
    let last = events.last().expect("final progress event");
    assert_eq!(last.percentage, 100.0);
    assert_eq!(last.downloaded_bytes, test_content.len() as u64);
    assert_eq!(last.total_bytes, Some(test_content.len() as u64));
}

#[tokio::test]
async fn test_fetch_throttles_progress_to_interval() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/big.7z"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 512 * 1024]))
        .mount(&mock_server)
        .await;

    let temp_dir = tempdir().unwrap();
    let dest = temp_dir.path().join("big.7z");

    // The body arrives well within the interval, so only the final event fires
    let fetcher = Fetcher::new(&test_config()).unwrap();
    let progress = ProgressCapture::default();
    fetcher
        .fetch(&format!("{}/big.7z", mock_server.uri()), &dest, Some(progress.get_callback()))
        .await
        .unwrap();

    let events = progress.get_events();
    assert_eq!(events.len(), 1);
    assert!(events[0].is_finished());
}

/// Serves one response whose body arrives in `chunks` pieces, `pause` apart
async fn serve_slowly(chunks: usize, chunk_size: usize, pause: Duration) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; 4096];
        let _ = socket.read(&mut request).await.unwrap();

        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            chunks * chunk_size
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        for _ in 0..chunks {
            socket.write_all(&vec![3u8; chunk_size]).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(pause).await;
        }
    });
    format!("http://{addr}/Cinematicas.7z.001")
}

#[tokio::test]
async fn test_fetch_reports_at_most_once_per_interval_while_streaming() {
    let interval = Duration::from_millis(50);
    let url = serve_slowly(10, 8 * 1024, Duration::from_millis(30)).await;

    let mut config = test_config();
    config.progress_interval = interval;
    let temp_dir = tempdir().unwrap();
    let fetcher = Fetcher::new(&config).unwrap();
    let progress = ProgressCapture::default();

    let size = fetcher
        .fetch(&url, &temp_dir.path().join("Cinematicas.7z.001"), Some(progress.get_callback()))
        .await
        .unwrap();
    assert_eq!(size, 10 * 8 * 1024);

    let events = progress.get_events();
    let (last, streaming) = events.split_last().unwrap();
    assert!(last.is_finished());
    assert!(streaming.len() >= 2, "expected intermediate events, got {}", streaming.len());
    assert!(streaming.len() as u128 <= last.elapsed.as_millis() / interval.as_millis());

    assert!(streaming[0].elapsed >= interval);
    for pair in streaming.windows(2) {
        assert!(pair[1].elapsed - pair[0].elapsed >= interval, "{:?}", pair);
        assert!(pair[1].downloaded_bytes > pair[0].downloaded_bytes);
    }
}

#[tokio::test]
async fn test_fetch_sends_configured_user_agent() {
    let mock_server = MockServer::start().await;
    let config = test_config();

    Mock::given(method("GET"))
        .and(path("/ua.7z"))
        .and(header("user-agent", config.user_agent.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = tempdir().unwrap();
    let fetcher = Fetcher::new(&config).unwrap();
    fetcher
        .fetch(&format!("{}/ua.7z", mock_server.uri()), &temp_dir.path().join("ua.7z"), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_fetch_server_error_leaves_no_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.7z"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let temp_dir = tempdir().unwrap();
    let dest = temp_dir.path().join("missing.7z");
    let fetcher = Fetcher::new(&test_config()).unwrap();

    let result = fetcher
        .fetch(&format!("{}/missing.7z", mock_server.uri()), &dest, None)
        .await;

    match result.unwrap_err() {
        FetchError::HttpStatus { status, .. } => assert_eq!(status, 404),
        other => panic!("Expected HttpStatus error, got {other:?}"),
    }
    assert!(!dest.exists());
    assert!(!temp_dir.path().join("missing.7z.part").exists());
}

#[tokio::test]
async fn test_fetch_connection_failure_is_transport_error() {
    let temp_dir = tempdir().unwrap();
    let dest = temp_dir.path().join("file.7z");
    let fetcher = Fetcher::new(&test_config()).unwrap();

    let err = fetcher
        .fetch("http://127.0.0.1:9/file.7z", &dest, None)
        .await
        .unwrap_err();

    assert_eq!(err.category(), "http");
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_fetch_rejects_invalid_url() {
    let temp_dir = tempdir().unwrap();
    let fetcher = Fetcher::new(&test_config()).unwrap();

    let err = fetcher
        .fetch("not a url", &temp_dir.path().join("x"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::InvalidUrl { .. }));
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn test_server_errors_are_recoverable_client_errors_are_not() {
    let mock_server = MockServer::start().await;
    for (route, status) in [("/busy.7z", 503), ("/gone.7z", 404)] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;
    }

    let temp_dir = tempdir().unwrap();
    let fetcher = Fetcher::new(&test_config()).unwrap();
    let busy = fetcher
        .fetch(&format!("{}/busy.7z", mock_server.uri()), &temp_dir.path().join("busy.7z"), None)
        .await
        .unwrap_err();
    let gone = fetcher
        .fetch(&format!("{}/gone.7z", mock_server.uri()), &temp_dir.path().join("gone.7z"), None)
        .await
        .unwrap_err();

    assert!(busy.is_recoverable());
    assert!(!gone.is_recoverable());
}

#[tokio::test]
async fn test_failed_fetch_removes_stale_destination() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Splash.7z"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let temp_dir = tempdir().unwrap();
    let dest = temp_dir.path().join("Splash.7z");
    std::fs::write(&dest, b"stale").unwrap();
    std::fs::write(temp_dir.path().join("Splash.7z.part"), b"half").unwrap();

    let fetcher = Fetcher::new(&test_config()).unwrap();
    assert!(fetcher
        .fetch(&format!("{}/Splash.7z", mock_server.uri()), &dest, None)
        .await
        .is_err());

    assert!(!dest.exists());
    assert!(!temp_dir.path().join("Splash.7z.part").exists());
}

#[test]
fn test_file_name_from_url() {
    assert_eq!(
        file_name_from_url("https://example.com/releases/v1/Cinematicas.7z.001").unwrap(),
        "Cinematicas.7z.001"
    );
    assert_eq!(file_name_from_url("https://example.com/dir/").unwrap(), "dir");
    assert_eq!(file_name_from_url("https://example.com").unwrap(), "downloaded_file");
    assert!(file_name_from_url("::nope").is_err());
}

#[test]
fn test_progress_percentage_unknown_total() {
    let progress = FetchProgress::new(500, None, std::time::Duration::from_secs(1));
    assert_eq!(progress.percentage, 0.0);
    assert_eq!(progress.speed_bps, 500.0);

    let finished = FetchProgress::finished(500, None, std::time::Duration::from_secs(1));
    assert_eq!(finished.percentage, 100.0);
    assert_eq!(finished.total_bytes, Some(500));
}
