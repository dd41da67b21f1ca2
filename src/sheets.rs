use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use url::Url;

pub const DEFAULT_SPREADSHEET_ID: &str = "1-s0tKT-rLFVfGU24OUaTIalQQDqpZq-oEInksxB4h2Y";
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("sheet file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode row: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("sheets api request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid sheets api url: {0}")]
    Url(#[from] url::ParseError),
    #[error("sheets api returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

/// Append-only row sink. Rows are never updated or deleted.
#[async_trait]
pub trait SheetStore: Send + Sync {
    async fn append_row(&self, row: Vec<String>) -> Result<(), SheetError>;
}

#[derive(Default)]
pub struct MemorySheet {
    rows: Mutex<Vec<Vec<String>>>,
}

impl MemorySheet {
    #[cfg(test)]
    pub async fn rows(&self) -> Vec<Vec<String>> {
        self.rows.lock().await.clone()
    }
}

#[async_trait]
impl SheetStore for MemorySheet {
    async fn append_row(&self, row: Vec<String>) -> Result<(), SheetError> {
        self.rows.lock().await.push(row);
        Ok(())
    }
}

/// Local sheet: one JSON array per line.
pub struct JsonlSheet {
    path: PathBuf,
    // serialises appends so lines never interleave
    write_lock: Mutex<()>,
}

impl JsonlSheet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl SheetStore for JsonlSheet {
    async fn append_row(&self, row: Vec<String>) -> Result<(), SheetError> {
        let mut line = serde_json::to_vec(&row)?;
        line.push(b'\n');
        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct GoogleSheetsConfig {
    pub api_base: String,
    pub spreadsheet_id: String,
    pub range: String,
    pub access_token: String,
    pub timeout: Duration,
}

/// Appends rows through the Sheets `values:append` REST call.
#[derive(Clone)]
pub struct GoogleSheetsStore {
    cfg: GoogleSheetsConfig,
    client: reqwest::Client,
}

impl GoogleSheetsStore {
    pub fn new(cfg: GoogleSheetsConfig) -> Result<Self, SheetError> {
        let client = reqwest::Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self { cfg, client })
    }

    fn append_url(&self) -> Result<Url, SheetError> {
        let mut url = Url::parse(&self.cfg.api_base)?;
        let range = format!("{}:append", self.cfg.range);
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.cfg.spreadsheet_id.as_str(),
                "values",
                range.as_str(),
            ]);
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        Ok(url)
    }
}

#[async_trait]
impl SheetStore for GoogleSheetsStore {
    async fn append_row(&self, row: Vec<String>) -> Result<(), SheetError> {
        let url = self.append_url()?;
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.cfg.access_token)
            .json(&json!({ "values": [row] }))
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            tracing::debug!(spreadsheet = %self.cfg.spreadsheet_id, "row appended");
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(SheetError::Upstream {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    struct Captured {
        spreadsheet: String,
        range: String,
        query: HashMap<String, String>,
        auth: Option<String>,
        body: Value,
    }

    type Log = Arc<std::sync::Mutex<Vec<Captured>>>;

    async fn capture(
        State(log): State<Log>,
        Path((spreadsheet, range)): Path<(String, String)>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, &'static str) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let denied = auth.as_deref() != Some("Bearer good-token");
        log.lock().unwrap().push(Captured {
            spreadsheet,
            range,
            query,
            auth,
            body,
        });
        if denied {
            (StatusCode::UNAUTHORIZED, "bad credentials")
        } else {
            (StatusCode::OK, "{}")
        }
    }

    async fn spawn_fake_sheets() -> (String, Log) {
        let log: Log = Arc::default();
        let app = Router::new()
            .route("/v4/spreadsheets/{id}/values/{range}", post(capture))
            .with_state(log.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), log)
    }

    fn store(api_base: String, token: &str) -> GoogleSheetsStore {
        GoogleSheetsStore::new(GoogleSheetsConfig {
            api_base,
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.to_string(),
            range: "A1".to_string(),
            access_token: token.to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn memory_sheet_keeps_append_order() {
        let sheet = MemorySheet::default();
        sheet.append_row(vec!["a".into()]).await.unwrap();
        sheet.append_row(vec!["b".into()]).await.unwrap();
        assert_eq!(sheet.rows().await, vec![vec!["a"], vec!["b"]]);
    }

    #[tokio::test]
    async fn jsonl_sheet_appends_one_line_per_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("leads.jsonl");
        let sheet = JsonlSheet::new(&path);
        sheet
            .append_row(vec!["t".into(), "q, \"quoted\"".into(), "".into()])
            .await
            .unwrap();
        sheet.append_row(vec!["t2".into()]).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let rows: Vec<Vec<String>> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], "q, \"quoted\"");
        assert_eq!(rows[1], vec!["t2"]);
    }

    #[tokio::test]
    async fn google_store_posts_values_append() {
        let (base, log) = spawn_fake_sheets().await;
        store(base, "good-token")
            .append_row(vec!["2024".into(), "Precio?".into()])
            .await
            .unwrap();

        let calls = log.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.spreadsheet, DEFAULT_SPREADSHEET_ID);
        assert_eq!(call.range, "A1:append");
        assert_eq!(call.query.get("valueInputOption").map(String::as_str), Some("RAW"));
        assert_eq!(call.auth.as_deref(), Some("Bearer good-token"));
        assert_eq!(call.body, serde_json::json!({"values": [["2024", "Precio?"]]}));
    }

    #[tokio::test]
    async fn google_store_surfaces_upstream_errors() {
        let (base, _log) = spawn_fake_sheets().await;
        let err = store(base, "expired")
            .append_row(vec!["x".into()])
            .await
            .unwrap_err();
        match err {
            SheetError::Upstream { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad credentials");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
