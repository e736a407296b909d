//! Loader configuration and validation
//!
//! Command-line flags, most with an environment fallback.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use reqwest::Url;

use crate::linker::{DEFAULT_CONTENT_TYPE, DEFAULT_PAYLOAD_NAME};
use crate::pipeline::IngestOptions;
use crate::sequencer::ExternalRefPolicy;
use crate::unit::{NamespacePolicy, DATA_NAMESPACE, DEFAULT_DOMAIN, SCHEMA_NAMESPACE};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8081/";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "custody-ingest",
    version,
    about = "Upload a Turtle file one subject at a time, linking each upload to the uploads it references"
)]
pub struct IngestConfig {
    /// Turtle file of blank-line separated subject blocks
    pub input: Option<PathBuf>,

    // === Store ===
    /// Content store root URL
    #[arg(long, env = "ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Bearer token for the content store
    #[arg(long, env = "ENDPOINT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-upload timeout in seconds
    #[arg(long, env = "UPLOAD_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,

    /// Payload name sent with every upload
    #[arg(long, default_value = DEFAULT_PAYLOAD_NAME)]
    pub payload_name: String,

    /// Content type sent with every upload
    #[arg(long, default_value = DEFAULT_CONTENT_TYPE)]
    pub content_type: String,

    // === Dependency discovery ===
    /// Namespace whose IRIs may name other units
    #[arg(long, env = "INGEST_DOMAIN", default_value = DEFAULT_DOMAIN)]
    pub domain: String,

    /// Sub-namespace of the domain never treated as a unit (repeatable;
    /// replaces the defaults)
    #[arg(long = "exclude", value_name = "NAMESPACE", default_values = [SCHEMA_NAMESPACE, DATA_NAMESPACE])]
    pub excluded: Vec<String>,

    /// Base IRI for relative IRIs in the input
    #[arg(long)]
    pub base: Option<String>,

    /// References to subjects missing from the input
    #[arg(long, default_value = "drop", value_enum)]
    pub external_refs: ExternalRefPolicy,

    // === Output ===
    /// Print the upload order and exit without uploading
    #[arg(long)]
    pub plan: bool,

    /// Do not echo rendered units to stdout
    #[arg(long, short)]
    pub quiet: bool,
}

impl IngestConfig {
    /// Validate the configuration at startup
    pub fn validate(&self) -> Result<(), String> {
        Url::parse(&self.endpoint)
            .map_err(|e| format!("--endpoint '{}' is not a valid URL: {e}", self.endpoint))?;

        if self.timeout_secs == 0 {
            return Err("--timeout-secs must be greater than zero".to_string());
        }

        if self.domain.is_empty() {
            return Err("--domain must not be empty".to_string());
        }

        if let Some(ns) = self.excluded.iter().find(|ns| !ns.starts_with(&self.domain)) {
            return Err(format!(
                "--exclude '{ns}' is outside the domain '{}'",
                self.domain
            ));
        }

        if let Some(base) = &self.base {
            Url::parse(base).map_err(|e| format!("--base '{base}' is not a valid IRI: {e}"))?;
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn options(&self) -> IngestOptions {
        IngestOptions {
            policy: NamespacePolicy::new(self.domain.clone(), self.excluded.iter().cloned()),
            base: self.base.clone(),
            external_refs: self.external_refs,
            payload_name: self.payload_name.clone(),
            content_type: self.content_type.clone(),
        }
    }
}
