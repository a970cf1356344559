//! Writing rendered text to disk.

use std::fs;
use std::path::Path;

use crate::error::{Result, TemplaterError};

/// Write `contents` to `path`, creating missing parent directories.
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    let output_error = |source| TemplaterError::Output { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(output_error)?;
    }
    fs::write(path, contents).map_err(output_error)?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_parent_directories() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("out/nested/app.yaml");
        write_output(&path, "a: 1\n").expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "a: 1\n");
    }

    #[test]
    fn unwritable_target_is_an_output_error() {
        let tmp = TempDir::new().expect("tmp");
        // A regular file cannot act as a parent directory.
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, "").expect("write");
        let path = blocker.join("app.yaml");

        let err = write_output(&path, "x").unwrap_err();
        assert!(matches!(err, TemplaterError::Output { path: ref p, .. } if *p == path));
    }
}
