//! Artifact serialization and output sinks
//!
//! Serialization is a pure structural mapping of the compiled program
//! to the runtime's wire format; any business logic belongs to the
//! compiler. Sinks decide where the bytes go.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use errors::Result;

use crate::flow::program::CompiledFlowProgram;

/// Serialize a compiled program to the external wire format
///
/// Pretty-printed with two-space indentation, matching what the
/// runtime's own export produces.
pub fn serialize(program: &CompiledFlowProgram) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(program)?)
}

/// Destination for a serialized artifact
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn emit(&self, filename: &str, bytes: &[u8]) -> Result<()>;
}

/// Writes artifacts into a directory on the local filesystem
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ArtifactSink for FileSink {
    async fn emit(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(filename);
        tokio::fs::write(&path, bytes).await?;
        info!(path = %path.display(), size = bytes.len(), "flow artifact written");
        Ok(())
    }
}
