use confsync_core::{classify_response, GenerationRequest, NodeId, SyncError};
use tracing::info;

use crate::transport::Transport;

/// Ask the service to generate a configuration for `node` and return the name
/// of the artifact to fetch.
///
/// A failure classification aborts the run; the fetcher never sees a missing
/// artifact name.
pub fn generate(
    transport: &Transport,
    base_url: &str,
    node: &NodeId,
    tag: Option<&str>,
) -> Result<String, SyncError> {
    let body = GenerationRequest { tag, node: node.as_str() };
    let url = format!("{base_url}configuration/generate");
    let response = transport.post_json(&url, &body)?;
    let artifact = classify_response(&response)?;
    info!(artifact, "generation succeeded");
    Ok(artifact)
}
