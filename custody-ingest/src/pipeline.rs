//! Splitter -> grapher -> sequencer -> linker.

use std::io::{self, Write};
use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::linker::{IngestReport, Linker, DEFAULT_CONTENT_TYPE, DEFAULT_PAYLOAD_NAME};
use crate::sequencer::{plan, ExternalRefPolicy, PlannedUnit};
use crate::splitter::SplitDocument;
use crate::unit::{NamespacePolicy, UnitGrapher};
use crate::upload::Uploader;

/// Everything a run needs besides the input and the uploader.
#[derive(Clone, Debug)]
pub struct IngestOptions {
    pub policy: NamespacePolicy,
    pub base: Option<String>,
    pub external_refs: ExternalRefPolicy,
    pub payload_name: String,
    pub content_type: String,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            policy: NamespacePolicy::default(),
            base: None,
            external_refs: ExternalRefPolicy::Drop,
            payload_name: DEFAULT_PAYLOAD_NAME.to_string(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

impl IngestOptions {
    pub fn linker(&self, uploader: Arc<dyn Uploader>) -> Linker {
        Linker::new(uploader)
            .with_payload_name(&self.payload_name)
            .with_content_type(&self.content_type)
    }
}

/// Graph and order every block. Nothing is uploaded.
pub fn prepare(doc: &SplitDocument, options: &IngestOptions) -> Result<Vec<PlannedUnit>> {
    let units = UnitGrapher::new(options.policy.clone())
        .with_base(options.base.clone())
        .graph_all(doc)?;
    let planned = plan(units, options.external_refs)?;
    info!(
        units = planned.len(),
        prefixes = doc.preamble.len(),
        "planned upload order"
    );
    Ok(planned)
}

/// Prepare `doc` and upload it through `linker`. A failure while preparing
/// means nothing was uploaded.
pub async fn ingest(
    doc: &SplitDocument,
    options: &IngestOptions,
    linker: &mut Linker,
) -> Result<IngestReport> {
    let planned = prepare(doc, options)?;
    let report = linker.run(planned).await?;
    info!(uploaded = report.len(), "ingest complete");
    Ok(report)
}

/// Human-readable upload order, one unit per line with its dependencies.
pub fn write_plan(planned: &[PlannedUnit], out: &mut impl Write) -> io::Result<()> {
    for (i, p) in planned.iter().enumerate() {
        writeln!(out, "{:>4}. {} (line {})", i + 1, p.unit.subject, p.unit.start_line)?;
        if !p.dependencies.is_empty() {
            let deps: Vec<&str> = p.dependencies.iter().map(String::as_str).collect();
            writeln!(out, "      after {}", deps.join(", "))?;
        }
    }
    Ok(())
}
