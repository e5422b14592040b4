//! reading secrets and parts, writing part files

use anyhow::{Context, Result};
use passwordsplit::Part;
use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};

/// read everything from `reader`, dropping one trailing newline
pub fn read_secret(mut reader: impl Read) -> Result<String> {
    let mut secret = String::new();
    reader.read_to_string(&mut secret)?;

    if secret.ends_with('\n') {
        secret.pop();
        if secret.ends_with('\r') {
            secret.pop();
        }
    }
    Ok(secret)
}

/// one encoded part per non-empty line, labelled `line N`
pub fn read_lines(reader: impl BufRead) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if !line.trim().is_empty() {
            out.push((format!("line {}", i + 1), line));
        }
    }
    Ok(out)
}

/// one encoded part per file, labelled by path
pub fn read_files(files: &[PathBuf]) -> Result<Vec<(String, String)>> {
    files
        .iter()
        .map(|path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok((path.display().to_string(), content))
        })
        .collect()
}

/// write each part to `dir/<title>.txt`, refusing to overwrite
pub fn write_parts(dir: &Path, parts: &[Part]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let mut written = Vec::with_capacity(parts.len());
    for part in parts {
        let path = dir.join(part.file_name());
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        std::io::Write::write_all(&mut file, part.to_base64().as_bytes())?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use passwordsplit::{split, PartCollector};

    #[test]
    fn test_read_secret_strips_one_newline() {
        assert_eq!(read_secret("pw\n".as_bytes()).unwrap(), "pw");
        assert_eq!(read_secret("pw\r\n".as_bytes()).unwrap(), "pw");
        assert_eq!(read_secret("pw\n\n".as_bytes()).unwrap(), "pw\n");
        assert_eq!(read_secret(" pw ".as_bytes()).unwrap(), " pw ");
    }

    #[test]
    fn test_read_lines_skips_blank() {
        let lines = read_lines("a\n\n  \nb\n".as_bytes()).unwrap();
        assert_eq!(
            lines,
            vec![
                ("line 1".to_string(), "a".to_string()),
                ("line 4".to_string(), "b".to_string())
            ]
        );
    }

    #[test]
    fn test_write_and_read_parts() {
        let dir = tempfile::tempdir().unwrap();
        let parts = split("file roundtrip", 2, 3, Some("laptop")).unwrap().parts;

        let paths = write_parts(dir.path(), &parts).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("laptop_Part_1.txt"));

        let mut collector = PartCollector::new();
        for (_, encoded) in read_files(&paths[1..]).unwrap() {
            collector.add_encoded(&encoded).unwrap();
        }
        assert_eq!(collector.reconstruct().unwrap().secret, "file roundtrip");

        // second write into the same directory must not clobber
        assert!(write_parts(dir.path(), &parts).is_err());
    }
}
