use serde::{Deserialize, Deserializer, Serialize};

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub origin: Origin,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: Origin::User,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: Origin::Bot,
        }
    }
}

/// Lead data captured by the contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub name: String,
    pub email: String,
    pub organization: String,
}

impl ContactRecord {
    /// Trims the three fields; `None` unless all of them are non-empty.
    pub fn from_fields(name: &str, email: &str, organization: &str) -> Option<Self> {
        let (name, email, organization) = (name.trim(), email.trim(), organization.trim());
        if name.is_empty() || email.is_empty() || organization.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            email: email.to_string(),
            organization: organization.to_string(),
        })
    }
}

/// One spreadsheet row: a Q&A interaction plus optional lead data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRow {
    pub timestamp: String,
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub organization: String,
}

impl LeadRow {
    /// Column order of the sheet.
    pub const COLUMNS: [&'static str; 6] = [
        "timestamp",
        "question",
        "answer",
        "name",
        "email",
        "organization",
    ];

    pub fn interaction(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            question: question.into(),
            answer: answer.into(),
            ..Self::default()
        }
    }

    pub fn with_contact(mut self, contact: &ContactRecord) -> Self {
        self.name = contact.name.clone();
        self.email = contact.email.clone();
        self.organization = contact.organization.clone();
        self
    }

    pub fn cells(&self) -> Vec<String> {
        vec![
            self.timestamp.clone(),
            self.question.clone(),
            self.answer.clone(),
            self.name.clone(),
            self.email.clone(),
            self.organization.clone(),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// Body returned by `POST /ask`; either `answer` or `error` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub requires_contact: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactReply {
    #[serde(default, deserialize_with = "null_as_false")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Backend flags may be sent as `null`; treat that like an absent flag.
fn null_as_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntakeStatus {
    Success,
    Error,
}

/// Body returned by the intake handler for every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeResponse {
    pub status: IntakeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IntakeResponse {
    pub fn success() -> Self {
        Self {
            status: IntakeStatus::Success,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: IntakeStatus::Error,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn contact_requires_all_three_fields() {
        assert!(ContactRecord::from_fields("Ana", "  ", "Acme").is_none());
        assert!(ContactRecord::from_fields("", "ana@x.com", "Acme").is_none());
        let contact = ContactRecord::from_fields(" Ana ", "ana@x.com\n", "Acme").expect("contact");
        assert_eq!(contact.name, "Ana");
        assert_eq!(contact.email, "ana@x.com");
    }

    #[test]
    fn row_cells_follow_column_order() {
        let contact = ContactRecord::from_fields("Ana", "ana@x.com", "Acme").unwrap();
        let row = LeadRow {
            timestamp: "2024-01-01T00:00:00Z".into(),
            question: "Precio?".into(),
            answer: "100 USD".into(),
            ..LeadRow::default()
        }
        .with_contact(&contact);
        assert_eq!(
            row.cells(),
            vec![
                "2024-01-01T00:00:00Z",
                "Precio?",
                "100 USD",
                "Ana",
                "ana@x.com",
                "Acme"
            ]
        );
    }

    #[test]
    fn interaction_row_omits_unset_lead_fields() {
        let row = LeadRow::interaction("hola", "respuesta");
        assert!(chrono::DateTime::parse_from_rfc3339(&row.timestamp).is_ok());
        let value = serde_json::to_value(&row).unwrap();
        assert!(value.get("name").is_none());
        assert_eq!(value["question"], json!("hola"));
    }

    #[test]
    fn null_flags_decode_as_false() {
        let reply: AskReply =
            serde_json::from_str(r#"{"answer":"hola","requires_contact":null}"#).unwrap();
        assert_eq!(reply.answer.as_deref(), Some("hola"));
        assert!(!reply.requires_contact);

        let reply: AskReply = serde_json::from_str(r#"{"answer":"hola"}"#).unwrap();
        assert!(!reply.requires_contact);

        let reply: ContactReply =
            serde_json::from_str(r#"{"success":null,"error":"sin datos"}"#).unwrap();
        assert!(!reply.success);
        assert_eq!(reply.error.as_deref(), Some("sin datos"));
    }

    #[test]
    fn intake_response_shapes() {
        assert_eq!(
            serde_json::to_value(IntakeResponse::success()).unwrap(),
            json!({"status": "success"})
        );
        assert_eq!(
            serde_json::to_value(IntakeResponse::error("boom")).unwrap(),
            json!({"status": "error", "message": "boom"})
        );
    }
}
