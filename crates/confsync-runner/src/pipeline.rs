use std::path::PathBuf;

use confsync_client::{generate, resolve, AddressSelector, ArtifactFetcher, Transport};
use confsync_core::{ApplyOutcome, NodeId, SyncError};
use tracing::info;

use crate::activate::activate;
use crate::engine::ConvergenceEngine;

/// One sync-and-apply run. Strictly sequential: resolve, generate, fetch,
/// activate, apply; every stage failure is terminal and a re-invocation
/// starts over from resolution. Collaborators are injected so each stage can
/// be faked in tests.
pub struct Agent<'a> {
    pub host: String,
    pub port: u16,
    pub node: NodeId,
    pub remote_tarballs: String,
    pub local_tarballs: PathBuf,
    pub active_pointer: PathBuf,
    pub transport: &'a Transport,
    pub selector: &'a dyn AddressSelector,
    pub engine: &'a dyn ConvergenceEngine,
}

impl Agent<'_> {
    /// Drive the pipeline. Without a tag the sync stages are skipped entirely
    /// and the convergence engine runs against whatever the pointer currently
    /// targets.
    pub fn run(&self, tag: Option<&str>) -> Result<ApplyOutcome, SyncError> {
        match tag {
            Some(tag) => self.sync(tag)?,
            None => info!("no tag given; re-applying the active configuration"),
        }
        self.engine.converge()
    }

    fn sync(&self, tag: &str) -> Result<(), SyncError> {
        let base_url = resolve(&self.host, self.port, self.selector)?;
        info!(%base_url, tag, "resolved generation endpoint");

        let artifact = generate(self.transport, &base_url, &self.node, Some(tag))?;

        let fetcher = ArtifactFetcher::new(
            self.transport,
            self.remote_tarballs.clone(),
            self.local_tarballs.clone(),
        );
        let dir = fetcher.fetch(&base_url, &artifact)?;

        activate(&self.active_pointer, &dir)
    }
}
