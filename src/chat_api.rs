use crate::model::{AskReply, AskRequest, ContactRecord, ContactReply};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Result of a `POST /ask` round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    Answer {
        answer: String,
        requires_contact: bool,
    },
    /// The backend answered with an `error` field.
    Rejected(String),
}

impl TryFrom<AskReply> for AskOutcome {
    type Error = ApiError;

    fn try_from(reply: AskReply) -> Result<Self, Self::Error> {
        // an empty `error` does not mark the reply as failed
        if let Some(error) = reply.error.filter(|e| !e.is_empty()) {
            return Ok(Self::Rejected(error));
        }
        match reply.answer {
            Some(answer) => Ok(Self::Answer {
                answer,
                requires_contact: reply.requires_contact,
            }),
            None => Err(ApiError::MalformedResponse(
                "reply has neither answer nor error".to_string(),
            )),
        }
    }
}

/// Backend the chat widget talks to.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn ask(&self, question: &str) -> Result<AskOutcome, ApiError>;
    async fn submit_contact(&self, contact: &ContactRecord) -> Result<ContactReply, ApiError>;
}

/// `ChatApi` over HTTP against `/ask` and `/contact`.
#[derive(Clone)]
pub struct HttpChatApi {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpChatApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: Url::parse(base_url)?,
            client,
        })
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        let url = self.base_url.join(path)?;
        let resp = self.client.post(url).json(body).send().await?;
        // Error replies still carry a JSON body, so decode regardless of status.
        let status = resp.status();
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::MalformedResponse(format!("status {status}: {err}")))
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn ask(&self, question: &str) -> Result<AskOutcome, ApiError> {
        let body = AskRequest {
            question: question.to_string(),
        };
        let reply: AskReply = self.post_json("/ask", &body).await?;
        reply.try_into()
    }

    async fn submit_contact(&self, contact: &ContactRecord) -> Result<ContactReply, ApiError> {
        self.post_json("/contact", contact).await
    }
}
