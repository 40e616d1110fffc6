use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use super::interface::Tool;
use super::process::ProcessTool;
use super::registry::ToolRegistry;

const DEFAULT_DEFINITION_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of tools for registry population at startup.
#[async_trait]
pub trait ToolDiscovery: Send + Sync {
    async fn discover(&self) -> Vec<Arc<dyn Tool>>;
}

/// Scans a folder of executables, one tool per file, named after the file
/// stem. Entries that are not executable, hang on `get_definition`, or print
/// an invalid definition are skipped with a warning; a missing folder yields
/// an empty set.
pub struct FolderDiscovery {
    folder: PathBuf,
    definition_timeout: Duration,
}

impl FolderDiscovery {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            definition_timeout: DEFAULT_DEFINITION_TIMEOUT,
        }
    }

    pub fn with_definition_timeout(mut self, timeout: Duration) -> Self {
        self.definition_timeout = timeout;
        self
    }
}

#[async_trait]
impl ToolDiscovery for FolderDiscovery {
    async fn discover(&self) -> Vec<Arc<dyn Tool>> {
        if !self.folder.is_dir() {
            warn!(
                path = %self.folder.display(),
                "Tools folder missing, starting without external tools"
            );
            return Vec::new();
        }
        info!(path = %self.folder.display(), "Scanning tools folder");

        let mut reader = match tokio::fs::read_dir(&self.folder).await {
            Ok(reader) => reader,
            Err(err) => {
                warn!(path = %self.folder.display(), error = %err, "Cannot read tools folder");
                return Vec::new();
            }
        };

        let mut paths = Vec::new();
        loop {
            match reader.next_entry().await {
                Ok(Some(entry)) => paths.push(entry.path()),
                Ok(None) => break,
                Err(err) => {
                    warn!(path = %self.folder.display(), error = %err, "Stopped scanning tools folder early");
                    break;
                }
            }
        }
        paths.sort();

        let mut tools: Vec<Arc<dyn Tool>> = Vec::new();
        for path in paths {
            if !is_candidate(&path) {
                trace!(path = %path.display(), "Skipping non-tool entry");
                continue;
            }
            let Some(name) = tool_name(&path) else {
                continue;
            };
            match ProcessTool::load(name.clone(), path.clone(), self.definition_timeout).await {
                Ok(tool) => {
                    debug!(tool = %name, "Discovered external tool");
                    tools.push(Arc::new(tool));
                }
                Err(err) => {
                    warn!(
                        tool = %name,
                        path = %path.display(),
                        error = %err,
                        "Skipping tool with unusable definition"
                    );
                }
            }
        }

        info!(count = tools.len(), "Tool discovery finished");
        tools
    }
}

/// Registers everything a discovery source found. Name clashes keep the
/// first registration and log the rest.
pub async fn register_discovered(registry: &mut ToolRegistry, discovery: &dyn ToolDiscovery) -> usize {
    let mut added = 0;
    for tool in discovery.discover().await {
        let name = tool.name().to_string();
        match registry.register(tool) {
            Ok(()) => added += 1,
            Err(err) => {
                warn!(tool = %name, error = %err, "Skipping tool that clashes with an existing registration");
            }
        }
    }
    added
}

fn is_candidate(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    if is_hidden(path) {
        return false;
    }
    is_executable(path)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name| name.starts_with('.'))
}

fn tool_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(OsStr::to_str)
        .map(str::to_string)
        .filter(|name| !name.is_empty())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}
