use ignore::WalkBuilder;
use log::{debug, trace};
use std::path::{Path, PathBuf};

use crate::config::FinderConfig;
use crate::error::{FinderError, Result};

/// One root directory to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRoot {
    pub path: PathBuf,
    pub recursive: bool,
}

/// The roots a finder will walk, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSet {
    roots: Vec<ScanRoot>,
}

impl PathSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a root. A path ending in `marker` is non-recursive unless
    /// `recursive` says otherwise; the marker itself is stripped.
    pub fn add(&mut self, raw: impl AsRef<Path>, recursive: Option<bool>, marker: &str) {
        let raw = raw.as_ref();
        let text = raw.to_string_lossy();

        let (path, marked) = match text.strip_suffix(marker).filter(|_| !marker.is_empty()) {
            Some("") => (PathBuf::from("."), true),
            Some(rest) => (PathBuf::from(rest), true),
            None => (raw.to_path_buf(), false),
        };

        self.roots.push(ScanRoot {
            path,
            recursive: recursive.unwrap_or(!marked),
        });
    }

    pub fn roots(&self) -> &[ScanRoot] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Lists candidate source files under `root`.
///
/// Hidden entries (and everything below a hidden directory) are skipped, as
/// are files without the configured extension. Symbolic links are followed;
/// a dangling link is skipped and a link cycle fails the walk. Within a directory, files
/// come before subdirectories and both are sorted by name, so each
/// directory's own entries are yielded before the walk descends.
pub fn enumerate(
    root: &Path,
    recursive: bool,
    config: &FinderConfig,
) -> Result<impl Iterator<Item = Result<PathBuf>> + use<>> {
    let meta = std::fs::metadata(root).map_err(|e| FinderError::file_system(root, e))?;
    if !meta.is_dir() {
        return Err(FinderError::file_system(
            root,
            std::io::Error::other("not a directory"),
        ));
    }
    std::fs::read_dir(root).map_err(|e| FinderError::file_system(root, e))?;

    debug!(
        "Enumerating {} ({})",
        root.display(),
        if recursive { "recursive" } else { "direct children" }
    );

    let hidden_prefix = config.hidden_prefix.clone();
    let extension = config.source_extension().to_string();
    let root_buf = root.to_path_buf();

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .ignore(false)
        .parents(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .follow_links(true)
        .sort_by_file_path(|a, b| a.is_dir().cmp(&b.is_dir()).then_with(|| a.cmp(b)))
        .filter_entry(move |entry| {
            entry.depth() == 0
                || hidden_prefix.is_empty()
                || !entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with(hidden_prefix.as_str())
        });
    if !recursive {
        builder.max_depth(Some(1));
    }

    let walker = builder.build().filter_map(move |entry| match entry {
        Ok(entry) => {
            let path = entry.into_path();
            if path.is_file() && path.extension().is_some_and(|e| e == extension.as_str()) {
                trace!("Candidate source file: {}", path.display());
                Some(Ok(path))
            } else {
                None
            }
        }
        Err(err)
            if err
                .io_error()
                .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound) =>
        {
            debug!("Skipping dangling link under {}: {}", root_buf.display(), err);
            None
        }
        Err(err) => Some(Err(FinderError::Walk {
            path: root_buf.clone(),
            source: err,
        })),
    });

    Ok(walker)
}

/// Canonical form of a path used for `ClassInfo::file` and fingerprints:
/// symlinks resolved where possible and separators normalized to `/`.
pub fn normalize_path(path: &Path) -> String {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let text = resolved.to_string_lossy();
    let text = text.strip_prefix(r"\\?\").unwrap_or(&text[..]);
    text.replace('\\', "/")
}
