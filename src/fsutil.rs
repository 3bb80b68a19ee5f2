/// Filesystem helpers for artifact writes.
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ScribeError};

/// Temp sibling used while an artifact is being written: `name.ext.tmp`.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("artifact"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write atomically: write to temp file, then rename.
///
/// Existence of `path` is what the skip checks look at, so it must never
/// appear half written.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let temp_path = temp_path_for(path);
    fs::write(&temp_path, contents).map_err(|e| ScribeError::io(&temp_path, e))?;

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(ScribeError::io(path, e));
    }
    Ok(())
}

/// Read a source file, mapping failures to `UnreadableSource`.
///
/// Bytes that are not UTF-8 (Latin-1 comments in old sources) are replaced
/// with U+FFFD instead of failing the read.
pub fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| ScribeError::unreadable(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_temp_path_keeps_full_name() {
        let p = temp_path_for(Path::new("/a/b/solver.scribe"));
        assert_eq!(p, PathBuf::from("/a/b/solver.scribe.tmp"));
    }

    #[test]
    fn test_write_atomic_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("scribe.yaml");
        write_atomic(&target, "root: /x\n").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "root: /x\n");
        assert!(!dir.path().join("scribe.yaml.tmp").exists());
    }

    #[test]
    fn test_write_atomic_overwrites() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.cpp");
        fs::write(&target, "old").unwrap();
        write_atomic(&target, "new").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }

    #[test]
    fn test_read_source_tolerates_latin1() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.f");
        // "c caf\xe9" with a Latin-1 e-acute
        fs::write(&path, b"c caf\xe9\n      x = 1\n").unwrap();

        let text = read_source(&path).unwrap();
        assert_eq!(text, "c caf\u{FFFD}\n      x = 1\n");
    }

    #[test]
    fn test_read_source_missing_is_unreadable() {
        let dir = tempdir().unwrap();
        let err = read_source(&dir.path().join("nope.f90")).unwrap_err();
        assert!(matches!(err, ScribeError::UnreadableSource { .. }));
    }
}
