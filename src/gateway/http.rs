use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::{Call, Gateway, GatewayError};
use crate::core::ai_log::AiLogEntry;
use crate::core::note::Note;
use crate::core::reminder::Reminder;

/// Gateway that posts each command as JSON to `{base_url}/{command}`.
pub struct HttpGateway {
    base_url: String,
    http: Client,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .build()
            .map_err(|source| GatewayError::Transport {
                command: "connect",
                source,
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn invoke<T: DeserializeOwned>(&self, call: Call) -> Result<T, GatewayError> {
        let command = call.command();
        let url = format!("{}/{}", self.base_url, command);
        log::debug!("POST {}", url);

        let resp = self
            .http
            .post(&url)
            .json(&call.args())
            .send()
            .await
            .map_err(|source| GatewayError::Transport { command, source })?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Command {
                command,
                status: status.as_u16(),
                message,
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|source| GatewayError::Transport { command, source })?;
        decode(command, &body)
    }
}

/// Decode a response payload. Commands with no payload may answer with an
/// empty body, which is read as JSON `null`.
fn decode<T: DeserializeOwned>(command: &'static str, body: &[u8]) -> Result<T, GatewayError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"null".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|source| GatewayError::Decode { command, source })
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn init(&self) -> Result<(), GatewayError> {
        self.invoke(Call::Init).await
    }

    async fn current_date(&self) -> Result<NaiveDate, GatewayError> {
        self.invoke(Call::CurrentDate).await
    }

    async fn note(&self, date: NaiveDate) -> Result<Note, GatewayError> {
        self.invoke(Call::Note(date)).await
    }

    async fn all_notes(&self) -> Result<Vec<Note>, GatewayError> {
        self.invoke(Call::AllNotes).await
    }

    async fn add_note(&self, text: &str, for_date: NaiveDate) -> Result<i64, GatewayError> {
        self.invoke(Call::AddNote {
            text: text.to_string(),
            for_date,
        })
        .await
    }

    async fn unresolved_reminders(&self) -> Result<Vec<Reminder>, GatewayError> {
        self.invoke(Call::UnresolvedReminders).await
    }

    async fn resolved_reminders(&self) -> Result<Vec<Reminder>, GatewayError> {
        self.invoke(Call::ResolvedReminders).await
    }

    async fn resolve_reminder(&self, id: i64) -> Result<(), GatewayError> {
        self.invoke(Call::ResolveReminder(id)).await
    }

    async fn unresolve_reminder(&self, id: i64) -> Result<(), GatewayError> {
        self.invoke(Call::UnresolveReminder(id)).await
    }

    async fn delete_reminder(&self, id: i64) -> Result<(), GatewayError> {
        self.invoke(Call::DeleteReminder(id)).await
    }

    async fn ai_logs(&self) -> Result<Vec<AiLogEntry>, GatewayError> {
        self.invoke(Call::AiLogs).await
    }

    async fn delete_ai_log(&self, id: i64) -> Result<(), GatewayError> {
        self.invoke(Call::DeleteAiLog(id)).await
    }

    async fn delete_all_ai_logs(&self) -> Result<(), GatewayError> {
        self.invoke(Call::DeleteAllAiLogs).await
    }

    async fn print_all_tables(&self) -> Result<(), GatewayError> {
        self.invoke(Call::PrintAllTables).await
    }

    async fn test_integration(&self) -> Result<String, GatewayError> {
        self.invoke(Call::TestIntegration).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer one request with `status` and `body`; the handle yields the
    /// raw request text.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
                    let length = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{}/", addr), server)
    }

    #[tokio::test]
    async fn posts_json_args_to_command_path() {
        let (url, server) = serve_once("200 OK", "42").await;
        let gw = HttpGateway::new(&url).unwrap();

        let id = gw
            .add_note("Buy milk", NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(id, 42);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /add_note HTTP/1.1"));
        assert!(request.contains(r#""forDate":"2025-06-01""#));
        assert!(request.contains(r#""text":"Buy milk""#));
    }

    #[tokio::test]
    async fn error_status_becomes_command_error_with_body() {
        let (url, server) = serve_once("500 Internal Server Error", "database is locked").await;
        let gw = HttpGateway::new(&url).unwrap();

        let err = gw.resolve_reminder(7).await.unwrap_err();
        match err {
            GatewayError::Command {
                command,
                status,
                message,
            } => {
                assert_eq!(command, "resolve_reminder");
                assert_eq!(status, 500);
                assert_eq!(message, "database is locked");
            }
            other => panic!("unexpected error: {}", other),
        }

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /resolve_reminder HTTP/1.1"));
        assert!(request.contains(r#"{"id":7}"#));
    }

    #[tokio::test]
    async fn empty_success_body_is_unit() {
        let (url, server) = serve_once("200 OK", "").await;
        let gw = HttpGateway::new(&url).unwrap();
        gw.delete_all_ai_logs().await.unwrap();
        assert!(server.await.unwrap().starts_with("POST /delete_all_ai_logs "));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gw = HttpGateway::new(&format!("http://{}", addr)).unwrap();
        let err = gw.init().await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport { command: "init", .. }));
    }

    #[test]
    fn empty_body_decodes_as_unit() {
        let unit: () = decode("resolve_reminder", b"").unwrap();
        assert_eq!(unit, ());
        let unit: () = decode("resolve_reminder", b" \n").unwrap();
        assert_eq!(unit, ());
    }

    #[test]
    fn date_payload_decodes() {
        let date: NaiveDate = decode("get_current_date", br#""2025-06-01""#).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }

    #[test]
    fn wrong_shape_is_a_decode_error() {
        let err = decode::<i64>("add_note", br#"{"id": 1}"#).unwrap_err();
        assert!(matches!(err, GatewayError::Decode { command: "add_note", .. }));
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let gw = HttpGateway::new("http://127.0.0.1:1430/").unwrap();
        assert_eq!(gw.base_url(), "http://127.0.0.1:1430");
    }
}
