//! Issue snapshots: one JSON document per line, zstd-compressed when the
//! file name ends in `.zst`.

use sautii_core::Issue;
use serde::{Deserialize, Serialize};
use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

const ZSTD_LEVEL: i32 = 3;

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotManifest {
    pub created_ts: i64,
    pub issues: usize,
    pub skipped: usize,
    pub path: String,
}

fn is_compressed(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("zst")
}

fn open_reader(path: &Path) -> std::io::Result<Box<dyn BufRead>> {
    let fh = File::open(path)?;
    if is_compressed(path) {
        let d = zstd::Decoder::new(fh)?;
        Ok(Box::new(BufReader::new(d)))
    } else {
        Ok(Box::new(BufReader::new(fh)))
    }
}

/// Reads every well-formed issue line. Blank lines are ignored; malformed
/// lines are counted in the returned manifest and skipped.
pub fn read_issues(path: impl AsRef<Path>) -> std::io::Result<(Vec<Issue>, SnapshotManifest)> {
    let path = path.as_ref();
    let reader = open_reader(path)?;
    let mut out = Vec::new();
    let mut skipped = 0usize;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Issue>(&line) {
            Ok(issue) => out.push(issue),
            Err(e) => {
                skipped += 1;
                tracing::warn!(path = %path.display(), error = %e, "skipping malformed snapshot line");
            }
        }
    }
    let manifest = SnapshotManifest {
        created_ts: chrono::Utc::now().timestamp(),
        issues: out.len(),
        skipped,
        path: path.display().to_string(),
    };
    Ok((out, manifest))
}

pub struct SnapshotWriter {
    out: Box<dyn Write>,
    written: usize,
    pub path: PathBuf,
}

impl SnapshotWriter {
    pub fn create(path: PathBuf) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let fh = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        let out: Box<dyn Write> = if is_compressed(&path) {
            Box::new(zstd::Encoder::new(fh, ZSTD_LEVEL)?.auto_finish())
        } else {
            Box::new(BufWriter::new(fh))
        };
        Ok(Self {
            out,
            written: 0,
            path,
        })
    }

    pub fn write_issue(&mut self, issue: &Issue) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.out, issue)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn finish(mut self) -> std::io::Result<SnapshotManifest> {
        self.out.flush()?;
        // dropping `out` finalizes the zstd frame
        Ok(SnapshotManifest {
            created_ts: chrono::Utc::now().timestamp(),
            issues: self.written,
            skipped: 0,
            path: self.path.display().to_string(),
        })
    }
}

pub fn write_issues<'a>(
    path: PathBuf,
    issues: impl IntoIterator<Item = &'a Issue>,
) -> std::io::Result<SnapshotManifest> {
    let mut w = SnapshotWriter::create(path)?;
    for issue in issues {
        w.write_issue(issue)?;
    }
    w.finish()
}
