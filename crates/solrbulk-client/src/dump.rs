//! Keep rejected payloads around so they can be replayed by hand.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;

/// Write `payload` to a new file and return its path.
///
/// Files are named `solrbulk-<unix seconds>-<random>.json` and placed in
/// `dir`, or the system temp dir when `dir` is `None`. The file is kept on
/// disk after this returns.
pub fn dump_payload(dir: Option<&Path>, payload: &str) -> io::Result<PathBuf> {
    let prefix = format!("solrbulk-{}-", Utc::now().timestamp());
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix).suffix(".json");

    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    file.write_all(payload.as_bytes())?;
    file.flush()?;

    let (_, path) = file.keep()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_payload_in_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dump_payload(Some(dir.path()), "[{\"id\":\"1\"}]\n").unwrap();

        assert!(path.starts_with(dir.path()));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("solrbulk-"));
        assert!(name.ends_with(".json"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[{\"id\":\"1\"}]\n");
    }

    #[test]
    fn test_dump_payload_missing_dir() {
        let result = dump_payload(Some(Path::new("/nonexistent/solrbulk-dumps")), "[]\n");
        assert!(result.is_err());
    }
}
