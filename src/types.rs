//! Core types for the launch classifier.
//!
//! This module defines the data model shared by the sniffer, the tree
//! scanner, and the verdict filter: the closed set of launch flavors,
//! the (small) architecture taxonomy, the per-file `Candidate` record,
//! and the `Verdict` that groups candidates for a scanned folder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The kind of launchable thing a candidate is.
///
/// This is a closed enumeration: downstream launchers match on it
/// exhaustively to decide how to invoke a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flavor {
    /// A Linux native executable (ELF).
    #[serde(rename = "linux")]
    NativeLinux,
    /// A Windows native executable (PE).
    #[serde(rename = "windows")]
    NativeWindows,
    /// A macOS native executable (Mach-O, thin or universal).
    #[serde(rename = "macos")]
    NativeMacos,
    /// A macOS `.app` bundle (a directory, not a file).
    #[serde(rename = "app-macos")]
    AppMacos,
    /// A POSIX script with a shebang line.
    #[serde(rename = "script")]
    Script,
    /// A Windows batch script (`.bat` or `.cmd`).
    #[serde(rename = "windows-script")]
    ScriptWindows,
    /// An HTML page, playable in a browser shell.
    #[serde(rename = "html")]
    Html,
    /// A Love2D game (a `.love` archive or a folder with `conf.lua`).
    #[serde(rename = "love")]
    Love,
    /// A Java archive, detected by its ZIP central directory.
    #[serde(rename = "jar")]
    Jar,
    /// A Windows installer package (OLE compound document).
    #[serde(rename = "msi")]
    Msi,
}

impl Flavor {
    /// Flavors that are runnable through a native loader and therefore
    /// need the executable bit on POSIX systems.
    pub fn needs_exec_bit(self) -> bool {
        matches!(
            self,
            Flavor::NativeLinux | Flavor::NativeMacos | Flavor::Script
        )
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Flavor::NativeLinux => "linux",
            Flavor::NativeWindows => "windows",
            Flavor::NativeMacos => "macos",
            Flavor::AppMacos => "app-macos",
            Flavor::Script => "script",
            Flavor::ScriptWindows => "windows-script",
            Flavor::Html => "html",
            Flavor::Love => "love",
            Flavor::Jar => "jar",
            Flavor::Msi => "msi",
        };
        write!(f, "{name}")
    }
}

/// Processor architecture of a native candidate, when it matters.
///
/// Only the two architectures a launcher actually branches on are
/// modeled; everything else is left unspecified (`Candidate::arch` is
/// `None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
    /// 32-bit x86.
    #[serde(rename = "386")]
    I386,
    /// 64-bit x86.
    #[serde(rename = "amd64")]
    Amd64,
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::I386 => write!(f, "386"),
            Arch::Amd64 => write!(f, "amd64"),
        }
    }
}

/// Metadata the PE probe attaches to native Windows candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowsInfo {
    /// True for GUI-subsystem executables, false for console ones.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub gui: bool,
    /// Recognized installer technology, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer_type: Option<InstallerType>,
}

/// Installer technologies the PE probe recognizes by embedded markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallerType {
    /// Nullsoft Scriptable Install System.
    Nsis,
    /// Inno Setup.
    InnoSetup,
    /// InstallShield.
    InstallShield,
}

impl fmt::Display for InstallerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallerType::Nsis => write!(f, "nsis"),
            InstallerType::InnoSetup => write!(f, "innosetup"),
            InstallerType::InstallShield => write!(f, "installshield"),
        }
    }
}

/// Metadata the shebang probe attaches to script candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptInfo {
    /// The interpreter path from the shebang line, e.g. `/bin/sh`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub interpreter: String,
}

/// A single potential launch target.
///
/// Candidates are produced by the sniffer (or by `.app` bundle
/// detection), reordered by [`Verdict::filter`], and have their `mode`
/// zeroed by the permission fixer. Fields are never edited otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Path relative to the verdict's base path, forward-slash separated.
    pub path: String,
    /// Number of path segments; a top-level file has depth 1.
    pub depth: usize,
    /// File size in bytes. Zero for `.app` bundles.
    pub size: u64,
    /// POSIX mode bits at scan time. Zeroed after a permission fix pass.
    pub mode: u32,
    /// What kind of launchable thing this is.
    pub flavor: Flavor,
    /// Architecture, when the format probe could determine one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<Arch>,
    /// Human-readable identification string for fat Mach-O candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell: Option<String>,
    /// PE metadata for native Windows candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows_info: Option<WindowsInfo>,
    /// Shebang metadata for script candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_info: Option<ScriptInfo>,
}

impl Candidate {
    /// Create a candidate of the given flavor with everything else
    /// unset. The sniffer's wrapper fills in path, size and depth.
    pub fn new(flavor: Flavor) -> Self {
        Self {
            path: String::new(),
            depth: 0,
            size: 0,
            mode: 0,
            flavor,
            arch: None,
            spell: None,
            windows_info: None,
            script_info: None,
        }
    }

    /// Set the candidate's relative path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the candidate's architecture.
    pub fn with_arch(mut self, arch: Arch) -> Self {
        self.arch = Some(arch);
        self
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {}", self.flavor, self.path)?;
        if let Some(arch) = self.arch {
            write!(f, " [{arch}]")?;
        }
        Ok(())
    }
}

/// The outcome of scanning a folder: its base path, the total size of
/// everything walked, and the launch candidates that were found.
///
/// After [`Verdict::filter`], the first candidate is the preferred
/// launch target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Absolute path of the scanned folder.
    pub base_path: PathBuf,
    /// Sum of all walked file sizes, blacklisted files included.
    pub total_size: u64,
    /// Launch candidates, in walk order until filtered.
    pub candidates: Vec<Candidate>,
}

/// Counters accumulated during a `configure` pass, for observability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictStats {
    /// Total number of files that were actually sniffed.
    pub num_sniffs: u64,
    /// Sniff count per extension, keyed by the classifier's extension
    /// extraction (lowercased, including the dot; empty for none).
    pub sniffs_by_ext: std::collections::HashMap<String, u64>,
}

/// Count the segments of a forward-slash relative path.
///
/// A top-level entry has depth 1. Empty segments do not count, so
/// trailing slashes are harmless.
pub fn path_depth(path: &str) -> usize {
    path.split('/').filter(|seg| !seg.is_empty()).count()
}
