use std::{
    fs::OpenOptions,
    io::{BufWriter, Write},
    path::Path,
};

use tempfile::NamedTempFile;

use crate::error::{FeaturizeError, Result};

/// Write a file all-or-nothing
///
/// Content goes to a temp file in the destination directory, which is renamed
/// over `path` only after `write` returned Ok and everything was flushed.
/// On error the temp file is removed and `path` is left as it was.
pub fn write_atomic<P, F>(path: P, write: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| FeaturizeError::io(dir, e))?;
    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        write(&mut w)?;
        w.flush().map_err(|e| FeaturizeError::io(path, e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| FeaturizeError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| FeaturizeError::io(path, e.error))?;
    Ok(())
}

/// Append text to a file, creating it when missing
pub fn append_to<P: AsRef<Path>>(path: P, text: &str) -> Result<()> {
    let path = path.as_ref();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| FeaturizeError::io(path, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| FeaturizeError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn write_atomic_replaces_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "old").unwrap();
        write_atomic(&path, |w| {
            w.write_all(b"new\n").map_err(|e| FeaturizeError::io("out.txt", e))
        })
        .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn write_atomic_keeps_old_file_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "old").unwrap();
        let res = write_atomic(&path, |w| {
            w.write_all(b"partial").map_err(|e| FeaturizeError::io("out.txt", e))?;
            Err(FeaturizeError::Config("boom".into()))
        });
        assert!(res.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn append_creates_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log");
        append_to(&path, "a\n").unwrap();
        append_to(&path, "b\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\n");
    }
}
