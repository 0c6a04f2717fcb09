//! Small filesystem helpers shared by the operations.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::VocsortError;

/// The sibling directory `<root>_<suffix>`.
///
/// `data/tianma` with suffix `sample` becomes `data/tianma_sample`.
pub fn sibling_root(root: &Path, suffix: &str) -> Result<PathBuf, VocsortError> {
    let absolute;
    let base = if root.file_name().is_some() {
        root
    } else {
        absolute = fs::canonicalize(root).map_err(VocsortError::Io)?;
        absolute.as_path()
    };

    let name = base.file_name().ok_or_else(|| {
        VocsortError::precondition(format!(
            "cannot derive an output directory next to {}",
            root.display()
        ))
    })?;

    let mut sibling = name.to_os_string();
    sibling.push("_");
    sibling.push(suffix);
    Ok(base.with_file_name(sibling))
}

/// Fail with [`VocsortError::DestinationExists`] if `path` is present.
pub fn ensure_absent(path: &Path) -> Result<(), VocsortError> {
    if path.exists() {
        return Err(VocsortError::DestinationExists {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Copy `src` into `dest_dir`, keeping its file name. Overwrites.
pub fn copy_into(src: &Path, dest_dir: &Path) -> Result<PathBuf, VocsortError> {
    let dest = dest_path(src, dest_dir)?;
    fs::create_dir_all(dest_dir).map_err(VocsortError::Io)?;
    fs::copy(src, &dest).map_err(VocsortError::Io)?;
    debug!("[COPY] {} -> {}", src.display(), dest.display());
    Ok(dest)
}

/// Move `src` into `dest_dir`, keeping its file name.
pub fn move_into(src: &Path, dest_dir: &Path) -> Result<PathBuf, VocsortError> {
    let dest = dest_path(src, dest_dir)?;
    fs::create_dir_all(dest_dir).map_err(VocsortError::Io)?;
    move_file(src, &dest)?;
    Ok(dest)
}

/// Rename `src` to `dest`, falling back to copy + remove when a plain
/// rename fails (e.g. across filesystems).
pub fn move_file(src: &Path, dest: &Path) -> Result<(), VocsortError> {
    if let Err(rename_err) = fs::rename(src, dest) {
        debug!(
            "rename {} failed ({rename_err}), falling back to copy",
            src.display()
        );
        fs::copy(src, dest).map_err(|_| VocsortError::Io(rename_err))?;
        fs::remove_file(src).map_err(VocsortError::Io)?;
    }
    debug!("[MOVE] {} -> {}", src.display(), dest.display());
    Ok(())
}

fn dest_path(src: &Path, dest_dir: &Path) -> Result<PathBuf, VocsortError> {
    let name = src.file_name().ok_or_else(|| {
        VocsortError::precondition(format!("{} has no file name", src.display()))
    })?;
    Ok(dest_dir.join(name))
}
