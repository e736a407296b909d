//! Linker
//!
//! Drives the upload loop over planned units, one at a time. Each unit's
//! dependencies are resolved to the content addresses recorded for them
//! earlier in the run and attached as `caused-by` links.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::error::{IngestError, Result};
use crate::link::{Link, LinkMap};
use crate::sequencer::PlannedUnit;
use crate::upload::{content_address, UploadRequest, Uploader};

pub const DEFAULT_PAYLOAD_NAME: &str = "next.ttl";
pub const DEFAULT_CONTENT_TYPE: &str = "text/turtle";

const SEPARATOR: &str = "----------------------------------------";

/// One successful upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UploadedUnit {
    pub subject: String,
    pub address: String,
    pub links: Vec<Link>,
    pub bytes: usize,
}

/// Uploads of one run, in upload order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub uploaded: Vec<UploadedUnit>,
}

impl IngestReport {
    pub fn len(&self) -> usize {
        self.uploaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploaded.is_empty()
    }
}

pub struct Linker {
    uploader: Arc<dyn Uploader>,
    payload_name: String,
    content_type: String,
    echo: Option<Box<dyn Write + Send>>,
    link_map: LinkMap,
    /// Start line of each linked subject's block.
    linked_lines: HashMap<String, usize>,
}

impl std::fmt::Debug for Linker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Linker")
            .field("uploader", &self.uploader)
            .field("payload_name", &self.payload_name)
            .field("content_type", &self.content_type)
            .field("echo", &self.echo.is_some())
            .field("linked", &self.link_map.len())
            .finish()
    }
}

impl Linker {
    pub fn new(uploader: Arc<dyn Uploader>) -> Self {
        Self {
            uploader,
            payload_name: DEFAULT_PAYLOAD_NAME.to_string(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            echo: None,
            link_map: LinkMap::new(),
            linked_lines: HashMap::new(),
        }
    }

    pub fn with_payload_name(mut self, name: impl Into<String>) -> Self {
        self.payload_name = name.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Write each rendered unit, its byte length and a separator to `echo`.
    pub fn with_echo(mut self, echo: Box<dyn Write + Send>) -> Self {
        self.echo = Some(echo);
        self
    }

    /// Addresses recorded so far. After a failed run this holds exactly the
    /// units uploaded before the failure.
    pub fn link_map(&self) -> &LinkMap {
        &self.link_map
    }

    /// Upload `planned` in order. Stops at the first failure.
    pub async fn run(&mut self, planned: Vec<PlannedUnit>) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        for PlannedUnit { unit, dependencies } in planned {
            if let Some(&first_line) = self.linked_lines.get(&unit.subject) {
                return Err(IngestError::DuplicateSubject {
                    subject: unit.subject,
                    first_line,
                    second_line: unit.start_line,
                });
            }
            let links = dependencies
                .iter()
                .map(|dep| {
                    self.link_map
                        .get(dep)
                        .map(Link::caused_by)
                        .ok_or_else(|| IngestError::UnresolvedReference {
                            subject: unit.subject.clone(),
                            reference: dep.clone(),
                        })
                })
                .collect::<Result<Vec<_>>>()?;

            let rendered = custody_graph_turtle::to_turtle(&unit.body);
            let bytes = rendered.len();
            self.echo(|out| {
                writeln!(out, "{rendered}")?;
                writeln!(out, "(length = {bytes} bytes)")
            })?;

            let confirmation = self
                .uploader
                .upload(UploadRequest {
                    name: &self.payload_name,
                    content_type: &self.content_type,
                    body: rendered.into_bytes(),
                    links: &links,
                })
                .await
                .and_then(|doc| content_address(&doc))
                .map_err(|source| IngestError::UploadFailure {
                    subject: unit.subject.clone(),
                    source,
                })?;

            let fresh = self.link_map.record(&unit.subject, &confirmation);
            debug_assert!(fresh, "{} linked twice", unit.subject);
            self.linked_lines.insert(unit.subject.clone(), unit.start_line);
            info!(
                subject = %unit.subject,
                address = %confirmation,
                links = links.len(),
                bytes,
                "uploaded unit"
            );
            self.echo(|out| writeln!(out, "{SEPARATOR}"))?;

            report.uploaded.push(UploadedUnit {
                subject: unit.subject,
                address: confirmation,
                links,
                bytes,
            });
        }
        Ok(report)
    }

    fn echo(
        &mut self,
        write: impl FnOnce(&mut (dyn Write + Send)) -> std::io::Result<()>,
    ) -> Result<()> {
        if let Some(out) = self.echo.as_mut() {
            write(out.as_mut())?;
            out.flush()?;
        }
        Ok(())
    }
}
