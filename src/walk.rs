//! Tree scanner: walk an install folder and assemble a verdict.
//!
//! The walk produces a container of directories and files (paths
//! normalized to forward slashes, relative to the root), detects macOS
//! `.app` bundles, and drives the sniffer over every file the extension
//! blacklist lets through. Two HTML fallbacks catch browser games that
//! produced no other candidate.

use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::blacklist::{ext_of, is_blacklisted_ext};
use crate::error::{ClassifyError, Result};
use crate::sniff::sniff;
use crate::types::{path_depth, Candidate, Flavor, Verdict, VerdictStats};

/// One walked entry: its slash-separated relative path, size in bytes
/// (zero for directories), and POSIX mode bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Path relative to the walk root, forward-slash separated.
    pub path: String,
    /// Size in bytes; zero for directories.
    pub size: u64,
    /// POSIX mode bits at walk time.
    pub mode: u32,
}

/// The result of walking a folder: directories and files, in
/// deterministic walk order.
#[derive(Debug, Clone, Default)]
pub struct Container {
    /// All walked directories.
    pub dirs: Vec<Entry>,
    /// All walked files.
    pub files: Vec<Entry>,
}

impl Container {
    /// True when the container holds exactly one file and nothing else.
    pub fn is_single_file(&self) -> bool {
        self.files.len() == 1 && self.dirs.is_empty()
    }
}

/// An index-addressed factory of seekable byte sources over a walked
/// container. The sniffer borrows a fresh reader per file.
pub struct Pool<'a> {
    base: &'a Path,
    files: &'a [Entry],
}

impl<'a> Pool<'a> {
    /// Create a pool over a walked container's files.
    pub fn new(base: &'a Path, files: &'a [Entry]) -> Self {
        Self { base, files }
    }

    /// Open the file at `index` as a seekable byte source.
    pub fn read_seeker(&self, index: usize) -> Result<File> {
        let entry = &self.files[index];
        let full = self.base.join(&entry.path);
        File::open(full).map_err(|source| ClassifyError::Sniff {
            path: entry.path.clone(),
            source,
        })
    }

    /// Size of the file at `index`, as recorded by the walk.
    pub fn size(&self, index: usize) -> u64 {
        self.files[index].size
    }
}

/// The default path filter: skips VCS metadata, OS junk, and the
/// dotfolder the runtime reserves for itself.
pub fn default_filter(path: &str) -> bool {
    for component in path.split('/') {
        if matches!(component, ".git" | ".hg" | ".svn" | ".itch" | "__MACOSX") {
            return false;
        }
    }
    let base = path.rsplit('/').next().unwrap_or(path);
    !matches!(base, ".DS_Store" | "Thumbs.db" | "desktop.ini")
}

/// Walk `root`, applying `filter` to every relative path. Filtered
/// directories are pruned wholesale.
pub fn walk(root: &Path, filter: &dyn Fn(&str) -> bool) -> Result<Container> {
    let mut container = Container::default();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let rel = relative_slash_path(root, entry.path());
            rel.is_empty() || filter(&rel)
        });

    for entry in walker {
        let entry = entry.map_err(|source| ClassifyError::Walk {
            path: root.to_path_buf(),
            source,
        })?;

        let rel = relative_slash_path(root, entry.path());
        if rel.is_empty() {
            continue;
        }

        let metadata = entry.metadata().map_err(|source| ClassifyError::Walk {
            path: root.to_path_buf(),
            source,
        })?;

        if metadata.is_dir() {
            container.dirs.push(Entry {
                path: rel,
                size: 0,
                mode: mode_of(&metadata, true),
            });
        } else if metadata.is_file() {
            container.files.push(Entry {
                path: rel,
                size: metadata.len(),
                mode: mode_of(&metadata, false),
            });
        }
    }

    Ok(container)
}

fn relative_slash_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let s = rel.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

#[cfg(unix)]
fn mode_of(metadata: &std::fs::Metadata, _is_dir: bool) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn mode_of(_metadata: &std::fs::Metadata, is_dir: bool) -> u32 {
    if is_dir {
        0o755
    } else {
        0o644
    }
}

/// Controls the behavior of [`configure`].
#[derive(Default)]
pub struct ConfigureParams<'a> {
    /// Filter to use when walking the install folder; `None` falls back
    /// to [`default_filter`].
    pub filter: Option<&'a dyn Fn(&str) -> bool>,
    /// Optional counters to accumulate during the scan.
    pub stats: Option<&'a mut VerdictStats>,
}

/// Walk a directory and find potential launch candidates, grouped
/// together into a verdict.
pub fn configure(root: impl AsRef<Path>, params: ConfigureParams<'_>) -> Result<Verdict> {
    let root = root.as_ref();
    let filter: &dyn Fn(&str) -> bool = match params.filter {
        Some(f) => f,
        None => &default_filter,
    };
    let mut stats = params.stats;
    if let Some(s) = stats.as_deref_mut() {
        s.sniffs_by_ext.clear();
    }

    let container = walk(root, filter)?;
    let pool = Pool::new(root, &container.files);

    let mut total_size = 0u64;
    let mut candidates: Vec<Candidate> = Vec::new();

    for dir in &container.dirs {
        let lower_path = dir.path.to_lowercase();
        if !lower_path.ends_with(".app") {
            continue;
        }

        let plist_path = format!("{lower_path}/contents/info.plist");
        let plist_found = container
            .files
            .iter()
            .any(|f| f.path.to_lowercase() == plist_path);

        if !plist_found {
            warn!(path = %dir.path, "found app bundle without an Info.plist");
            continue;
        }

        let mut c = Candidate::new(Flavor::AppMacos).with_path(dir.path.clone());
        c.mode = dir.mode;
        c.depth = path_depth(&c.path);
        candidates.push(c);
    }

    for (index, file) in container.files.iter().enumerate() {
        total_size += file.size;

        if is_blacklisted_ext(&file.path) {
            continue;
        }

        if let Some(s) = stats.as_deref_mut() {
            s.num_sniffs += 1;
            *s.sniffs_by_ext.entry(ext_of(&file.path)).or_default() += 1;
        }

        let mut reader = pool.read_seeker(index)?;
        let sniffed = sniff(&mut reader, &file.path, pool.size(index)).map_err(|e| match e {
            ClassifyError::Io(source) => ClassifyError::Sniff {
                path: file.path.clone(),
                source,
            },
            other => other,
        })?;

        if let Some(mut c) = sniffed {
            debug!(path = %c.path, flavor = %c.flavor, "sniffed candidate");
            c.mode = file.mode;
            candidates.push(c);
        }
    }

    if candidates.is_empty() && container.is_single_file() {
        let file = &container.files[0];
        if file.path.to_lowercase().ends_with(".html") {
            // ok, that's an HTML5 game
            candidates.push(html_candidate(file));
        }
    }

    if candidates.is_empty() {
        // still no candidates? if we have top-level .html files, go for it
        for file in &container.files {
            if path_depth(&file.path) == 1 && file.path.to_lowercase().ends_with(".html") {
                candidates.push(html_candidate(file));
            }
        }
    }

    Ok(Verdict {
        base_path: root.to_path_buf(),
        total_size,
        candidates,
    })
}

fn html_candidate(file: &Entry) -> Candidate {
    let mut c = Candidate::new(Flavor::Html).with_path(file.path.clone());
    c.size = file.size;
    c.mode = file.mode;
    c.depth = path_depth(&file.path);
    c
}
