//! Acknowledging dated alerts.
//!
//! Each acknowledgment is a single POST; on success the alert's row is
//! removed from the page, on failure the row stays and the user is told why.

use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use crate::table::Document;

/// Errors that can occur while acknowledging an alert.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        message: String,
    },

    /// Network error during the request.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl AlertError {
    /// Message shown to the user: the server's own text when it sent one
    pub fn user_message(&self) -> String {
        match self {
            AlertError::Rejected { status, message } if message.trim().is_empty() => format!("HTTP {}", status),
            AlertError::Rejected { message, .. } => message.clone(),
            AlertError::Network(e) => e.to_string(),
        }
    }
}

/// Surfaces acknowledgment failures to the user
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Writes notifications to standard error
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("{}", message);
    }
}

/// An alert and the id of the row that displays it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRef {
    pub alert_id: String,
    pub row_id: String,
}

impl AlertRef {
    pub fn new(alert_id: impl Into<String>, row_id: impl Into<String>) -> Self {
        Self {
            alert_id: alert_id.into(),
            row_id: row_id.into(),
        }
    }

    /// Parse `ALERT_ID:ROW_ID`
    pub fn parse(s: &str) -> Option<Self> {
        let (alert_id, row_id) = s.split_once(':')?;
        if alert_id.is_empty() || row_id.is_empty() {
            return None;
        }
        Some(Self::new(alert_id, row_id))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AckSummary {
    pub acknowledged: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct AlertClient {
    base_url: String,
    http_client: Client,
    timeout: Option<Duration>,
}

impl AlertClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http_client: Client::new(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn acknowledge_url(&self, alert_id: &str) -> String {
        format!(
            "{}/alerts/acknowledge/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(alert_id)
        )
    }

    /// POST the acknowledgment with an empty JSON body
    pub async fn post_acknowledgement(&self, alert_id: &str) -> Result<(), AlertError> {
        let url = self.acknowledge_url(alert_id);

        let mut request = self
            .http_client
            .post(&url)
            .json(&serde_json::json!({}));

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    warn!(alert = %alert_id, status, error = %e, "could not read rejection body");
                    String::new()
                }
            };
            Err(AlertError::Rejected { status, message })
        }
    }

    /// Acknowledge one alert and drop its row from the page.
    ///
    /// On failure the document is left as it was and the notifier is told.
    pub async fn acknowledge(
        &self,
        doc: &mut Document,
        alert: &AlertRef,
        notifier: &dyn Notifier,
    ) -> Result<(), AlertError> {
        match self.post_acknowledgement(&alert.alert_id).await {
            Ok(()) => {
                let removed = doc.remove_row_by_dom_id(&alert.row_id);
                info!(alert = %alert.alert_id, row = %alert.row_id, removed, "alert acknowledged");
                Ok(())
            }
            Err(e) => {
                warn!(alert = %alert.alert_id, error = %e, "alert acknowledgment failed");
                notifier.notify(&format!("Error: {}", e.user_message()));
                Err(e)
            }
        }
    }

    /// Acknowledge alerts one after another; a failure does not stop the rest
    pub async fn acknowledge_all(
        &self,
        doc: &mut Document,
        alerts: &[AlertRef],
        notifier: &dyn Notifier,
    ) -> AckSummary {
        let mut summary = AckSummary::default();

        for alert in alerts {
            match self.acknowledge(doc, alert, notifier).await {
                Ok(()) => summary.acknowledged += 1,
                Err(_) => summary.failed += 1,
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Cell, Row, Table};

    use std::cell::RefCell;
    use std::sync::{Arc, Mutex};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[derive(Default)]
    struct RecordingNotifier {
        messages: RefCell<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str) {
            self.messages.borrow_mut().push(message.to_string());
        }
    }

    /// Serves the canned responses in order, one connection each, recording
    /// the request line and body of every request.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<Mutex<Vec<(String, String)>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let request = read_request(&mut socket).await;
                log.lock().unwrap().push(request);

                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });

        (format!("http://{}", addr), seen)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> (String, String) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().ok())?
            })
            .unwrap_or(0);

        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before body");
            buf.extend_from_slice(&chunk[..n]);
        }

        let request_line = head.lines().next().unwrap_or_default().to_string();
        let body = String::from_utf8_lossy(&buf[header_end..header_end + content_length]).to_string();
        (request_line, body)
    }

    fn alerts_page() -> Document {
        let row = |id: &str, ticker: &str| Row::new(vec![Cell::new(ticker)]).with_dom_id(id);
        Document::new(vec![Table::new(
            "alerts",
            vec![
                Row::new(vec![Cell::new("Ticker")]),
                row("row-1", "AAPL"),
                row("row-2", "MSFT"),
                row("row-3", "NVDA"),
            ],
        )])
    }

    fn row_ids(doc: &Document) -> Vec<String> {
        doc.tables[0].rows().iter().filter_map(|r| r.dom_id.clone()).collect()
    }

    #[test]
    fn test_alert_ref_parse() {
        assert_eq!(AlertRef::parse("42:row-42"), Some(AlertRef::new("42", "row-42")));
        assert_eq!(AlertRef::parse("42"), None);
        assert_eq!(AlertRef::parse(":row"), None);
    }

    #[test]
    fn test_acknowledge_url() {
        let client = AlertClient::new("http://screener.local/");
        assert_eq!(
            client.acknowledge_url("a b"),
            "http://screener.local/alerts/acknowledge/a%20b"
        );
    }

    #[tokio::test]
    async fn test_acknowledge_removes_only_that_row() {
        let (base, seen) = serve(vec![(200, "")]).await;
        let client = AlertClient::new(base);
        let notifier = RecordingNotifier::default();
        let mut doc = alerts_page();

        client
            .acknowledge(&mut doc, &AlertRef::new("17", "row-2"), &notifier)
            .await
            .unwrap();

        assert_eq!(row_ids(&doc), vec!["row-1", "row-3"]);
        assert_eq!(doc.tables[0].row_count(), 3);
        assert!(doc.row_by_dom_id("row-2").is_none());
        assert!(notifier.messages.borrow().is_empty());

        let requests = seen.lock().unwrap();
        assert_eq!(requests[0].0, "POST /alerts/acknowledge/17 HTTP/1.1");
        assert_eq!(requests[0].1, "{}");
    }

    #[tokio::test]
    async fn test_rejected_acknowledgment_keeps_rows() {
        let (base, _) = serve(vec![(400, "Alert already acknowledged")]).await;
        let client = AlertClient::new(base);
        let notifier = RecordingNotifier::default();
        let mut doc = alerts_page();

        let err = client
            .acknowledge(&mut doc, &AlertRef::new("17", "row-2"), &notifier)
            .await
            .unwrap_err();

        assert!(matches!(err, AlertError::Rejected { status: 400, .. }));
        assert_eq!(row_ids(&doc), vec!["row-1", "row-2", "row-3"]);
        assert_eq!(*notifier.messages.borrow(), vec!["Error: Alert already acknowledged".to_string()]);
    }

    #[test]
    fn test_user_message_falls_back_to_status() {
        let err = AlertError::Rejected { status: 503, message: "  ".to_string() };
        assert_eq!(err.user_message(), "HTTP 503");
    }

    #[tokio::test]
    async fn test_truncated_rejection_body_reports_status() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            // promises more body than it sends
            let reply = "HTTP/1.1 502 X\r\nContent-Length: 50\r\nConnection: close\r\n\r\nshort";
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        let client = AlertClient::new(format!("http://{}", addr));
        let notifier = RecordingNotifier::default();
        let mut doc = alerts_page();

        let err = client
            .acknowledge(&mut doc, &AlertRef::new("5", "row-1"), &notifier)
            .await
            .unwrap_err();

        assert!(matches!(err, AlertError::Rejected { status: 502, .. }));
        assert_eq!(row_ids(&doc).len(), 3);
        assert_eq!(*notifier.messages.borrow(), vec!["Error: HTTP 502".to_string()]);
    }

    #[tokio::test]
    async fn test_network_failure_is_reported() {
        // bind then drop so nothing listens on the port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = AlertClient::new(format!("http://{}", addr));
        let notifier = RecordingNotifier::default();
        let mut doc = alerts_page();

        let err = client
            .acknowledge(&mut doc, &AlertRef::new("1", "row-1"), &notifier)
            .await
            .unwrap_err();

        assert!(matches!(err, AlertError::Network(_)));
        assert_eq!(row_ids(&doc).len(), 3);
        assert_eq!(notifier.messages.borrow().len(), 1);
        assert!(notifier.messages.borrow()[0].starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_missing_row_is_not_an_error() {
        let (base, _) = serve(vec![(200, "")]).await;
        let client = AlertClient::new(base);
        let notifier = RecordingNotifier::default();
        let mut doc = alerts_page();

        client
            .acknowledge(&mut doc, &AlertRef::new("9", "row-9"), &notifier)
            .await
            .unwrap();
        assert_eq!(row_ids(&doc).len(), 3);
    }

    #[tokio::test]
    async fn test_batch_runs_in_order_and_continues_after_failure() {
        let (base, seen) = serve(vec![(200, ""), (500, "boom"), (200, "")]).await;
        let client = AlertClient::new(base);
        let notifier = RecordingNotifier::default();
        let mut doc = alerts_page();

        let alerts = vec![
            AlertRef::new("1", "row-1"),
            AlertRef::new("2", "row-2"),
            AlertRef::new("3", "row-3"),
        ];
        let summary = client.acknowledge_all(&mut doc, &alerts, &notifier).await;

        assert_eq!(summary, AckSummary { acknowledged: 2, failed: 1 });
        assert_eq!(row_ids(&doc), vec!["row-2"]);
        assert_eq!(*notifier.messages.borrow(), vec!["Error: boom".to_string()]);

        let paths: Vec<String> = seen.lock().unwrap().iter().map(|(line, _)| line.clone()).collect();
        assert_eq!(
            paths,
            vec![
                "POST /alerts/acknowledge/1 HTTP/1.1",
                "POST /alerts/acknowledge/2 HTTP/1.1",
                "POST /alerts/acknowledge/3 HTTP/1.1",
            ]
        );
    }
}
