use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::Path;

use confsync_core::SyncError;
use tracing::info;

/// Atomically repoint `pointer` at `target`.
///
/// A uniquely named symlink is created beside the pointer and renamed over it.
/// Rename within one directory is atomic, so a reader observes the old target
/// or the new one, never a missing pointer; a crash mid-swap leaves the old
/// pointer intact. The previous target directory is left on disk for
/// diagnosis; cleanup is not this tool's job.
pub fn activate(pointer: &Path, target: &Path) -> Result<(), SyncError> {
    let parent = pointer.parent().unwrap_or(Path::new("."));
    let name = pointer.file_name().and_then(|s| s.to_str()).unwrap_or("active");
    let tmp = parent.join(format!(".{name}.{}.tmp", std::process::id()));

    let swap = (|| -> io::Result<()> {
        match fs::remove_file(&tmp) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        symlink(target, &tmp)?;
        fs::rename(&tmp, pointer)
    })();

    if let Err(source) = swap {
        let _ = fs::remove_file(&tmp);
        return Err(SyncError::Activation { pointer: pointer.to_path_buf(), source });
    }

    info!(pointer = %pointer.display(), target = %target.display(), "active configuration switched");
    Ok(())
}
