use std::fs;
use std::path::{Path, PathBuf};

use confsync_core::SyncError;
use flate2::read::GzDecoder;
use tar::Archive;
use tracing::info;

use crate::transport::Transport;

/// Downloads generated tarballs into the local cache and extracts them.
pub struct ArtifactFetcher<'a> {
    transport: &'a Transport,
    /// Server-side path segment under the base URL, e.g. `tarballs`.
    remote_root: String,
    local_root: PathBuf,
}

impl<'a> ArtifactFetcher<'a> {
    pub fn new(
        transport: &'a Transport,
        remote_root: impl Into<String>,
        local_root: impl Into<PathBuf>,
    ) -> Self {
        Self { transport, remote_root: remote_root.into(), local_root: local_root.into() }
    }

    /// Download `{base}{remote}/{name}.tar.gz` and extract it. Returns the
    /// extracted directory, which appears under its final name only after a
    /// fully successful unpack.
    pub fn fetch(&self, base_url: &str, name: &str) -> Result<PathBuf, SyncError> {
        let archive = self.download(base_url, name)?;
        self.extract(&archive, name)
    }

    fn download(&self, base_url: &str, name: &str) -> Result<PathBuf, SyncError> {
        let url = format!("{}{}/{}.tar.gz", base_url, self.remote_root, name);
        let local = self.local_root.join(format!("{name}.tar.gz"));
        fs::create_dir_all(&self.local_root)
            .map_err(|e| SyncError::Download { url: url.clone(), cause: e.to_string() })?;
        match self.transport.download(&url, &local) {
            Ok(bytes) => {
                info!(%url, bytes, "tarball downloaded");
                Ok(local)
            }
            Err(e) => Err(SyncError::Download { url, cause: e.to_string() }),
        }
    }

    /// Unpack `archive` and move the tree to `{local_root}/{name}` in one
    /// rename. The unpack happens in a temporary sibling directory, so a
    /// half-written tree can never carry the final name and never becomes an
    /// activation candidate.
    pub fn extract(&self, archive: &Path, name: &str) -> Result<PathBuf, SyncError> {
        let dest = self.local_root.join(name);
        let tmp = self.local_root.join(format!(".{name}.partial-{}", std::process::id()));
        let _ = fs::remove_dir_all(&tmp);

        let unpack = (|| -> std::io::Result<()> {
            fs::create_dir_all(&tmp)?;
            let file = fs::File::open(archive)?;
            // Archive::unpack refuses entries that would escape the target dir.
            Archive::new(GzDecoder::new(file)).unpack(&tmp)
        })();
        if let Err(e) = unpack {
            let _ = fs::remove_dir_all(&tmp);
            return Err(SyncError::Extraction {
                archive: archive.to_path_buf(),
                cause: e.to_string(),
            });
        }

        // Tarballs conventionally wrap their content in a `{name}/` top-level
        // directory; accept bare-content archives as well.
        let unpacked_root = if tmp.join(name).is_dir() { tmp.join(name) } else { tmp.clone() };

        let finish = (|| -> std::io::Result<()> {
            if dest.exists() {
                // stale tree from a crashed earlier run with the same name
                fs::remove_dir_all(&dest)?;
            }
            fs::rename(&unpacked_root, &dest)
        })();
        // Drops the empty wrapper when the top-level dir was renamed out;
        // harmless ENOENT when tmp itself moved.
        let _ = fs::remove_dir_all(&tmp);
        if let Err(e) = finish {
            return Err(SyncError::Extraction {
                archive: archive.to_path_buf(),
                cause: e.to_string(),
            });
        }

        info!(dir = %dest.display(), "artifact extracted");
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confsync_core::RetryPolicy;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::time::Duration;
    use tempfile::tempdir;

    fn transport() -> Transport {
        Transport::new(RetryPolicy::new(1, Duration::from_millis(1)), Duration::from_secs(1))
            .unwrap()
    }

    /// A gzipped tarball holding `{name}/minion.sls` with the given contents.
    fn make_tarball(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(format!("{name}.tar.gz"));
        let gz = GzEncoder::new(fs::File::create(&path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(gz);
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{name}/minion.sls"), contents)
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
        path
    }

    #[test]
    fn extract_produces_named_directory() {
        let dir = tempdir().unwrap();
        let tp = transport();
        let fetcher = ArtifactFetcher::new(&tp, "tarballs", dir.path());
        let archive = make_tarball(dir.path(), "cfg-1", b"state: present\n");

        let out = fetcher.extract(&archive, "cfg-1").unwrap();
        assert_eq!(out, dir.path().join("cfg-1"));
        let body = fs::read(out.join("minion.sls")).unwrap();
        assert_eq!(body, b"state: present\n");
    }

    #[test]
    fn corrupt_archive_leaves_no_destination() {
        let dir = tempdir().unwrap();
        let tp = transport();
        let fetcher = ArtifactFetcher::new(&tp, "tarballs", dir.path());
        let archive = dir.path().join("cfg-2.tar.gz");
        fs::write(&archive, b"this is not a gzip stream").unwrap();

        let err = fetcher.extract(&archive, "cfg-2").unwrap_err();
        assert!(matches!(err, SyncError::Extraction { .. }), "{err}");
        assert!(!dir.path().join("cfg-2").exists());
        // no partial temp dirs linger either
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("partial"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn refetch_replaces_stale_tree() {
        let dir = tempdir().unwrap();
        let tp = transport();
        let fetcher = ArtifactFetcher::new(&tp, "tarballs", dir.path());

        // stale content under the same artifact name
        let stale = dir.path().join("cfg-3");
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("old.sls"), b"old").unwrap();

        let archive = make_tarball(dir.path(), "cfg-3", b"new\n");
        let out = fetcher.extract(&archive, "cfg-3").unwrap();
        assert!(out.join("minion.sls").exists());
        assert!(!out.join("old.sls").exists());
    }
}
