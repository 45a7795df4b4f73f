//! In-process stand-ins for wget, gzip and crx2rnx
//!
//! The "remote" archive is a local directory tree: a URL's path below the
//! host maps to the same path below the archive root.

use gnss_data_downloader::fetcher::{
    ConvertTool, DecompressTool, ExternalTools, ToolError, ToolResult, TransferRequest, TransferTool,
};
use gnss_data_downloader::registry::matches_wildcard;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Remote tree plus a log of every tool call
#[derive(Clone)]
pub struct FakeArchive {
    root: Arc<tempfile::TempDir>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeArchive {
    pub fn new() -> Self {
        Self {
            root: Arc::new(tempfile::tempdir().unwrap()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Publish `content` at the path part of `url`
    pub fn publish(&self, url: &str, content: &str) {
        let path = self.remote_path(url);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Every tool call so far, as `tool:argument`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Transfer calls only
    pub fn fetched_urls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("wget:").map(str::to_string))
            .collect()
    }

    /// Tools backed by this archive
    pub fn tools(&self) -> ExternalTools {
        ExternalTools::new(
            Box::new(self.clone()),
            Box::new(FakeGunzip { archive: self.clone() }),
            Box::new(FakeCrx2rnx { archive: self.clone() }),
        )
    }

    /// Tools whose decompression never produces output
    pub fn tools_with_broken_gzip(&self) -> ExternalTools {
        ExternalTools::new(
            Box::new(self.clone()),
            Box::new(BrokenGunzip { archive: self.clone() }),
            Box::new(FakeCrx2rnx { archive: self.clone() }),
        )
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn remote_path(&self, url: &str) -> PathBuf {
        let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
        let path = without_scheme
            .split_once('/')
            .map(|(_, rest)| rest)
            .unwrap_or("");
        self.root.path().join(path)
    }
}

impl TransferTool for FakeArchive {
    fn fetch(&self, request: &TransferRequest<'_>) -> ToolResult<()> {
        self.record(format!("wget:{}", request.url));
        let remote = self.remote_path(request.url);
        let (Some(dir), Some(pattern)) = (remote.parent(), remote.file_name()) else {
            return Ok(());
        };
        let pattern = pattern.to_string_lossy();
        let Ok(entries) = fs::read_dir(dir) else {
            // wget exits non-zero on a missing directory
            return Err(ToolError::Exit {
                tool: "wget".to_string(),
                status: "exit status: 8".to_string(),
                stderr: "No such directory".to_string(),
            });
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if matches_wildcard(&pattern, &name) {
                fs::copy(entry.path(), request.work_dir.join(&name)).unwrap();
            }
        }
        Ok(())
    }
}

/// Strips the compression suffix; content is stored uncompressed
struct FakeGunzip {
    archive: FakeArchive,
}

impl DecompressTool for FakeGunzip {
    fn decompress(&self, path: &Path) -> ToolResult<()> {
        self.archive.record(format!("gzip:{}", name_of(path)));
        let name = name_of(path);
        let stripped = name
            .strip_suffix(".gz")
            .or_else(|| name.strip_suffix(".Z"))
            .ok_or_else(|| ToolError::Io(format!("{name}: unknown suffix")))?;
        fs::rename(path, path.with_file_name(stripped)).map_err(|e| ToolError::Io(e.to_string()))
    }
}

/// Exits non-zero and leaves the input in place
struct BrokenGunzip {
    archive: FakeArchive,
}

impl DecompressTool for BrokenGunzip {
    fn decompress(&self, path: &Path) -> ToolResult<()> {
        self.archive.record(format!("gzip:{}", name_of(path)));
        Err(ToolError::Exit {
            tool: "gzip".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "not in gzip format".to_string(),
        })
    }
}

/// Prefixes the content so converted files are recognisable
struct FakeCrx2rnx {
    archive: FakeArchive,
}

impl ConvertTool for FakeCrx2rnx {
    fn convert(&self, input: &Path, output: &Path) -> ToolResult<()> {
        self.archive.record(format!("crx2rnx:{}", name_of(input)));
        let content = fs::read_to_string(input).map_err(|e| ToolError::Io(e.to_string()))?;
        fs::write(output, format!("RINEX {content}")).map_err(|e| ToolError::Io(e.to_string()))
    }
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Files left in `dir`, sorted
pub fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
