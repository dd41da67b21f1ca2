use crate::sheets::{DEFAULT_SHEETS_API_BASE, DEFAULT_SPREADSHEET_ID};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetBackend {
    #[default]
    Memory,
    File,
    Google,
}

impl FromStr for SheetBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "google" => Ok(Self::Google),
            other => anyhow::bail!("unknown sheet backend `{other}` (expected memory, file or google)"),
        }
    }
}

/// Runtime configuration for the intake service and the chat clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub enable_cors: bool,
    pub sheet_backend: SheetBackend,
    pub sheet_file: PathBuf,
    pub spreadsheet_id: String,
    pub sheet_range: String,
    pub sheets_api_base: String,
    pub sheets_access_token: Option<String>,
    pub chat_base_url: String,
    pub intake_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            enable_cors: false,
            sheet_backend: SheetBackend::default(),
            sheet_file: PathBuf::from("data/leads.jsonl"),
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.to_string(),
            sheet_range: "A1".to_string(),
            sheets_api_base: DEFAULT_SHEETS_API_BASE.to_string(),
            sheets_access_token: None,
            chat_base_url: "http://127.0.0.1:5000".to_string(),
            intake_url: None,
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self =
            toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = match var("BIND_ADDR") {
            Some(raw) => raw
                .parse::<SocketAddr>()
                .context("failed to parse BIND_ADDR")?,
            None => defaults.bind_addr,
        };
        let enable_cors = var("ENABLE_CORS")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(defaults.enable_cors);
        let sheet_backend = match var("SHEET_BACKEND") {
            Some(raw) => raw
                .parse::<SheetBackend>()
                .context("failed to parse SHEET_BACKEND")?,
            None => defaults.sheet_backend,
        };
        let request_timeout_secs = match var("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("failed to parse REQUEST_TIMEOUT_SECS")?,
            None => defaults.request_timeout_secs,
        };

        let config = Self {
            bind_addr,
            enable_cors,
            sheet_backend,
            sheet_file: var("SHEET_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.sheet_file),
            spreadsheet_id: var("SPREADSHEET_ID").unwrap_or(defaults.spreadsheet_id),
            sheet_range: var("SHEET_RANGE").unwrap_or(defaults.sheet_range),
            sheets_api_base: var("SHEETS_API_BASE").unwrap_or(defaults.sheets_api_base),
            sheets_access_token: var("SHEETS_ACCESS_TOKEN").filter(|t| !t.is_empty()),
            chat_base_url: var("CHAT_BASE_URL").unwrap_or(defaults.chat_base_url),
            intake_url: var("INTAKE_URL"),
            request_timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.sheet_backend == SheetBackend::Google && self.sheets_access_token.is_none() {
            anyhow::bail!("SHEETS_ACCESS_TOKEN is required for the google sheet backend");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
