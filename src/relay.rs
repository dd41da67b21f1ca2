use crate::model::{IntakeResponse, IntakeStatus, LeadRow};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts lead rows to an intake endpoint.
#[derive(Clone)]
pub struct IntakeClient {
    url: url::Url,
    client: reqwest::Client,
}

impl IntakeClient {
    pub fn new(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.parse()?,
            client,
        })
    }

    /// True only when the endpoint answered 200 with `status: "success"`.
    pub async fn submit(&self, row: &LeadRow) -> bool {
        match self.try_submit(row).await {
            Ok(IntakeResponse {
                status: IntakeStatus::Success,
                ..
            }) => {
                info!(url = %self.url, "lead row relayed");
                true
            }
            Ok(resp) => {
                warn!(message = ?resp.message, "intake endpoint reported an error");
                false
            }
            Err(err) => {
                warn!(?err, "lead relay failed");
                false
            }
        }
    }

    async fn try_submit(&self, row: &LeadRow) -> anyhow::Result<IntakeResponse> {
        let resp = self.client.post(self.url.clone()).json(row).send().await?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            anyhow::bail!("intake endpoint returned {status}");
        }
        Ok(resp.json::<IntakeResponse>().await?)
    }
}
