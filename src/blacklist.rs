//! Extension-based gate applied before any file content is read.
//!
//! This is a blacklist, not a whitelist: Linux and macOS executables can
//! be named anything (`game`, `Game.x86_64`), so no whitelist of
//! launchable extensions can be complete. A missing whitelist entry
//! would make a game unlaunchable; a missing blacklist entry only costs
//! one wasted sniff.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Extensions we are confident never name a launch candidate.
///
/// Lowercase, including the leading dot. Grouped by what the files are.
static FILE_EXT_BLACKLIST: &[&str] = &[
    // images
    ".bmp",
    ".tga",
    ".png",
    ".gif",
    ".jpg",
    ".jpeg",
    ".webp",
    ".svg",
    ".ico",
    ".psd",
    ".dds",
    ".ktx",
    ".pvr",
    // electron bundles
    ".asar",
    // audio
    ".ogg",
    ".wav",
    ".mp3",
    ".flac",
    ".m4a",
    ".aac",
    ".mid",
    ".midi",
    ".aif",
    ".aiff",
    ".mod",
    ".xm",
    ".it",
    ".s3m",
    ".bank",
    ".fsb",
    // video
    ".mp4",
    ".mpg",
    ".mpeg",
    ".avi",
    ".mov",
    ".webm",
    ".mkv",
    ".ogv",
    ".flv",
    ".wmv",
    ".bik",
    // source files
    ".js",
    ".ts",
    ".py",
    ".rb",
    ".go",
    ".c",
    ".h",
    ".c++",
    ".cxx",
    ".cpp",
    ".cc",
    ".hpp",
    ".hxx",
    ".cs",
    ".java",
    // python artifacts
    ".pyc",
    ".pyo",
    // java runtime data
    ".class",
    ".properties",
    // structured data
    ".json",
    ".xml",
    ".yml",
    ".yaml",
    ".toml",
    // UE4 assets
    ".pak",
    ".umap",
    ".uasset",
    ".ubulk",
    ".uexp",
    ".upk",
    // Source engine assets
    ".vpk",
    ".bsp",
    ".mdl",
    ".vtf",
    ".vmt",
    // debug symbols
    ".pdb",
    ".mdb",
    ".sym",
    // libraries
    ".dll",
    ".so",
    ".dylib",
    ".a",
    // fonts
    ".otf",
    ".ttf",
    ".woff",
    ".woff2",
    ".fnt",
    ".fon",
    ".packedfont",
    // shaders
    ".cso",
    ".glsl",
    ".hlsl",
    ".shader",
    ".fx",
    ".frag",
    ".vert",
    ".spv",
    // found in opus magnum
    ".out",
    // ffs @queenjazz
    ".roobos",
    // macOS crap
    ".ds_store",
    ".icns",
    ".nib",
    ".plist",
    // databases
    ".db",
    ".sql",
    ".sqlite",
    ".sqlite3",
    // flash
    ".swf",
    ".fla",
    // various
    ".txt",
    ".ini",
    ".conf",
    ".config",
    ".cfg",
    ".dat",
    ".map",
    ".log",
    ".md",
    ".csv",
    ".rtf",
    ".pdf",
];

static BLACKLIST_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| FILE_EXT_BLACKLIST.iter().copied().collect());

/// Versioned shared objects (`libfoo.so.2`, `libfoo.so.2.0.0`) carry
/// their version after the `.so`, so the set lookup alone cannot catch
/// them.
static SHARED_OBJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.so(\.\d+)*$").expect("shared object regex"));

/// Extract the extension the classifier keys on: the lowercased final
/// dot-suffix of the path's basename, including the dot. Empty when the
/// basename has no dot.
pub fn ext_of(path: &str) -> String {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match base.rfind('.') {
        Some(idx) => base[idx..].to_ascii_lowercase(),
        None => String::new(),
    }
}

/// True when `path` names a file we should never bother sniffing.
pub fn is_blacklisted_ext(path: &str) -> bool {
    let ext = ext_of(path);
    if BLACKLIST_SET.contains(ext.as_str()) {
        return true;
    }
    SHARED_OBJECT_RE.is_match(path)
}
