use crate::model::{IntakeResponse, LeadRow};
use crate::sheets::{SheetError, SheetStore};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, info, warn};

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("invalid JSON body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid lead payload: {0}")]
    Validation(String),
    #[error("failed to append row: {0}")]
    Storage(#[from] SheetError),
}

impl IntakeError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::Validation(_) => "validation",
            Self::Storage(_) => "storage",
        }
    }
}

/// Decodes an intake body into a row.
///
/// Absent and `null` fields become empty cells, numbers and booleans are
/// stringified, unknown keys are ignored. Arrays or objects in a known
/// column are rejected.
pub fn parse_lead_row(body: &[u8]) -> Result<LeadRow, IntakeError> {
    let value: Value = serde_json::from_slice(body)?;
    let Value::Object(fields) = value else {
        return Err(IntakeError::Validation(
            "expected a JSON object".to_string(),
        ));
    };
    let [timestamp, question, answer, name, email, organization] =
        LeadRow::COLUMNS.map(|column| cell(&fields, column));
    Ok(LeadRow {
        timestamp: timestamp?,
        question: question?,
        answer: answer?,
        name: name?,
        email: email?,
        organization: organization?,
    })
}

fn cell(fields: &Map<String, Value>, column: &str) -> Result<String, IntakeError> {
    match fields.get(column) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(v.to_string()),
        Some(_) => Err(IntakeError::Validation(format!(
            "field `{column}` must be a scalar"
        ))),
    }
}

/// Appends one row per accepted request.
#[derive(Clone)]
pub struct IntakeHandler {
    sheet: Arc<dyn SheetStore>,
}

impl IntakeHandler {
    pub fn new(sheet: Arc<dyn SheetStore>) -> Self {
        Self { sheet }
    }

    pub async fn ingest(&self, body: &[u8]) -> Result<LeadRow, IntakeError> {
        let row = parse_lead_row(body)?;
        self.sheet.append_row(row.cells()).await?;
        Ok(row)
    }

    /// Every failure collapses into the single `{status:"error"}` shape.
    pub async fn handle(&self, body: &[u8]) -> IntakeResponse {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("intake", %request_id);
        async {
            match self.ingest(body).await {
                Ok(row) => {
                    info!(has_contact = !row.email.is_empty(), "lead row appended");
                    IntakeResponse::success()
                }
                Err(err) => {
                    warn!(kind = err.kind(), %err, "intake rejected");
                    IntakeResponse::error(err.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IntakeStatus;
    use crate::sheets::MemorySheet;
    use async_trait::async_trait;

    struct BrokenSheet;

    #[async_trait]
    impl SheetStore for BrokenSheet {
        async fn append_row(&self, _row: Vec<String>) -> Result<(), SheetError> {
            Err(SheetError::Upstream {
                status: 403,
                body: "forbidden".into(),
            })
        }
    }

    const FULL: &str = r#"{"timestamp":"2024-01-01T00:00:00Z","question":"Precio?","answer":"100 USD","name":"Ana","email":"ana@x.com","organization":"Acme"}"#;

    #[tokio::test]
    async fn appends_full_row_in_column_order() {
        let sheet = Arc::new(MemorySheet::default());
        let handler = IntakeHandler::new(sheet.clone());
        let resp = handler.handle(FULL.as_bytes()).await;
        assert_eq!(resp, IntakeResponse::success());
        assert_eq!(
            sheet.rows().await,
            vec![vec![
                "2024-01-01T00:00:00Z",
                "Precio?",
                "100 USD",
                "Ana",
                "ana@x.com",
                "Acme"
            ]]
        );
    }

    #[tokio::test]
    async fn missing_fields_become_empty_cells() {
        let sheet = Arc::new(MemorySheet::default());
        let handler = IntakeHandler::new(sheet.clone());
        let body = br#"{"timestamp":"t","question":"q","answer":null,"extra":[1]}"#;
        assert_eq!(handler.handle(body).await.status, IntakeStatus::Success);
        assert_eq!(sheet.rows().await, vec![vec!["t", "q", "", "", "", ""]]);
    }

    #[tokio::test]
    async fn malformed_body_appends_nothing() {
        let sheet = Arc::new(MemorySheet::default());
        let handler = IntakeHandler::new(sheet.clone());
        let bodies: [&[u8]; 3] = [b"not json", b"", b"{\"question\":"];
        for body in bodies {
            let resp = handler.handle(body).await;
            assert_eq!(resp.status, IntakeStatus::Error);
            assert!(!resp.message.unwrap_or_default().is_empty());
        }
        assert!(sheet.rows().await.is_empty());
    }

    #[test]
    fn non_object_and_nested_values_fail_validation() {
        assert!(matches!(
            parse_lead_row(b"[1,2]"),
            Err(IntakeError::Validation(_))
        ));
        let err = parse_lead_row(br#"{"name":{"first":"Ana"}}"#).unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn scalars_are_stringified() {
        let row = parse_lead_row(br#"{"timestamp":1704067200,"answer":true}"#).unwrap();
        assert_eq!(row.timestamp, "1704067200");
        assert_eq!(row.answer, "true");
    }

    #[tokio::test]
    async fn storage_failure_reports_error() {
        let handler = IntakeHandler::new(Arc::new(BrokenSheet));
        let resp = handler.handle(FULL.as_bytes()).await;
        assert_eq!(resp.status, IntakeStatus::Error);
        assert!(resp.message.unwrap().contains("403"));
    }

    #[tokio::test]
    async fn duplicate_submissions_append_duplicate_rows() {
        let sheet = Arc::new(MemorySheet::default());
        let handler = IntakeHandler::new(sheet.clone());
        handler.handle(FULL.as_bytes()).await;
        handler.handle(FULL.as_bytes()).await;
        let rows = sheet.rows().await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], rows[1]);
    }
}
