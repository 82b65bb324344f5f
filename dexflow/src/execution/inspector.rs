//! Listing the entry points of a produced artifact.

use super::dex::DexFile;
use crate::core::ArtifactListing;
use crate::errors::InspectError;
use crate::project::Project;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Lists the invocable classes of the artifact a build just produced.
///
/// Called fresh after every successful build; listings are never cached.
#[async_trait]
pub trait ArtifactInspector: Send + Sync {
    /// Lists the entry points of the project's artifact.
    async fn list_entry_points(&self, project: &Project) -> Result<ArtifactListing, InspectError>;
}

/// Reads the classes defined in `build/classes.dex`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DexClassInspector;

impl DexClassInspector {
    /// Lists the classes in raw dex bytes.
    ///
    /// # Errors
    ///
    /// Returns the parse error if the bytes are not a valid dex container.
    pub fn listing(bytes: &[u8]) -> Result<ArtifactListing, crate::errors::DexParseError> {
        let dex = DexFile::parse(bytes)?;
        Ok(ArtifactListing::new(hex::encode(Sha256::digest(bytes)), dex.entry_points()))
    }
}

#[async_trait]
impl ArtifactInspector for DexClassInspector {
    async fn list_entry_points(&self, project: &Project) -> Result<ArtifactListing, InspectError> {
        let path = project.dex_file();
        let bytes = tokio::fs::read(&path).await.map_err(|source| InspectError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let listing = Self::listing(&bytes).map_err(|source| InspectError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        debug!(
            digest = %listing.digest,
            classes = listing.entry_points.len(),
            "Listed dex classes"
        );
        Ok(listing)
    }
}
