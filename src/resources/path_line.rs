//! A single line guaranteed to be present in a shell startup file.
use anyhow::{Context as _, Result};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use super::helpers::fs::ensure_parent_dir;
use super::{Resource, ResourceChange, ResourceState};

/// Marker comment written above lines added by the provisioner.
const MARKER: &str = "# added by provision";

/// Ensures `line` appears verbatim in `file`, appending it once if absent.
#[derive(Debug)]
pub struct LineInFileResource {
    /// Startup file to edit (e.g. `~/.zshrc`).
    pub file: PathBuf,
    /// Exact line that must be present.
    pub line: String,
}

impl LineInFileResource {
    /// Create a new line-in-file resource.
    #[must_use]
    pub fn new(file: &Path, line: &str) -> Self {
        Self {
            file: file.to_path_buf(),
            line: line.to_string(),
        }
    }

    /// The `export PATH=...` line that prepends `dir` to `PATH`.
    ///
    /// Directories under `home` are written relative to `$HOME` so the line
    /// survives a home directory move.
    #[must_use]
    pub fn path_export(dir: &Path, home: &Path) -> String {
        let shown = dir.strip_prefix(home).map_or_else(
            |_| dir.display().to_string(),
            |rel| format!("$HOME/{}", rel.display()),
        );
        format!("export PATH=\"{shown}:$PATH\"")
    }
}

impl Resource for LineInFileResource {
    fn description(&self) -> String {
        format!("{} in {}", self.line, self.file.display())
    }

    fn current_state(&self) -> Result<ResourceState> {
        let content = match std::fs::read_to_string(&self.file) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ResourceState::Missing);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.file.display()));
            }
        };
        if content.lines().any(|l| l.trim() == self.line) {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Missing)
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        if self.current_state()? == ResourceState::Correct {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        ensure_parent_dir(&self.file)?;
        let needs_newline = std::fs::read(&self.file)
            .map(|bytes| bytes.last().is_some_and(|b| *b != b'\n'))
            .unwrap_or(false);
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file)
            .with_context(|| format!("opening {}", self.file.display()))?;
        let prefix = if needs_newline { "\n" } else { "" };
        write!(file, "{prefix}\n{MARKER}\n{}\n", self.line)
            .with_context(|| format!("appending to {}", self.file.display()))?;
        Ok(ResourceChange::Applied)
    }
}
