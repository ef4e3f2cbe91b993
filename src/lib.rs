//! Launch Classifier - Find What To Run In A Game Folder
//!
//! This library inspects a directory tree that purports to contain an
//! installable, runnable piece of software (typically a game
//! distribution) and produces a verdict: an ordered list of launch
//! candidates, each tagged with a flavor, an architecture when
//! meaningful, and enough metadata for a launcher to pick one and
//! invoke it.
//!
//! # Features
//!
//! - **Magic sniffing**: recognizes PE, ELF, Mach-O (thin and fat),
//!   shebang scripts, MSI packages, and launchable ZIPs (jars, Love2D
//!   bundles) from leading bytes
//! - **Path conventions**: `index.html`, `conf.lua`, `.love`, `.bat`,
//!   `.cmd`, and macOS `.app` bundles
//! - **Extension blacklist**: skips assets, media, and data files
//!   without opening them, while still catching extensionless Linux and
//!   macOS executables
//! - **Filtering and ranking**: narrows a scanned folder down to the
//!   best launch target for one OS/arch combination
//! - **Permission fixup**: restores executable bits lost by archive
//!   round-trips
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use launch_classifier::{configure, ConfigureParams, FilterParams, Os};
//!
//! fn main() -> Result<(), launch_classifier::ClassifyError> {
//!     let verdict = configure("path/to/game", ConfigureParams::default())?;
//!     let filtered = verdict.filter(FilterParams {
//!         os: Some(Os::Linux),
//!         arch: None,
//!     });
//!     if let Some(best) = filtered.candidates.first() {
//!         println!("launch this: {}", best.path);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # What is and is not here
//!
//! The library never executes anything, never talks to the network, and
//! only ever modifies the scanned tree through the explicit
//! [`fix_permissions`] pass. A corrupted binary is never an error; it
//! simply yields no candidate.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod blacklist;
pub mod error;
pub mod filter;
pub mod permissions;
pub mod probes;
pub mod sniff;
pub mod types;
pub mod walk;

pub use blacklist::{ext_of, is_blacklisted_ext};
pub use error::{ClassifyError, Result};
pub use filter::{FilterParams, Os};
pub use permissions::{fix_permissions, FixPermissionsParams};
pub use sniff::sniff;
pub use types::{
    path_depth, Arch, Candidate, Flavor, InstallerType, ScriptInfo, Verdict, VerdictStats,
    WindowsInfo,
};
pub use walk::{configure, default_filter, walk, ConfigureParams, Container, Entry, Pool};

/// Get version information for this library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write(root: &Path, rel: &str, bytes: &[u8]) {
        let full = root.join(rel);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, bytes).unwrap();
    }

    /// Minimal PE image: GUI or console subsystem, given machine.
    fn pe(machine: u16, gui: bool, extra: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; 0x200];
        data[0] = b'M';
        data[1] = b'Z';
        data[0x3C..0x40].copy_from_slice(&0x40u32.to_le_bytes());
        data[0x40..0x44].copy_from_slice(b"PE\x00\x00");
        let coff = 0x44;
        data[coff..coff + 2].copy_from_slice(&machine.to_le_bytes());
        data[coff + 16..coff + 18].copy_from_slice(&0xF0u16.to_le_bytes());
        let opt = coff + 20;
        data[opt..opt + 2].copy_from_slice(&0x20Bu16.to_le_bytes());
        let subsystem: u16 = if gui { 2 } else { 3 };
        data[opt + 68..opt + 70].copy_from_slice(&subsystem.to_le_bytes());
        data.extend_from_slice(extra);
        data
    }

    /// Minimal ELF executable for the given e_machine.
    fn elf(e_machine: u16) -> Vec<u8> {
        let mut data = vec![0u8; 64];
        data[..4].copy_from_slice(&[0x7F, b'E', b'L', b'F']);
        data[4] = 2;
        data[5] = 1;
        data[16..18].copy_from_slice(&2u16.to_le_bytes());
        data[18..20].copy_from_slice(&e_machine.to_le_bytes());
        data
    }

    /// Thin Mach-O, 64-bit little-endian.
    fn macho() -> Vec<u8> {
        let mut data = vec![0u8; 32];
        data[..4].copy_from_slice(&[0xCF, 0xFA, 0xED, 0xFE]);
        data
    }

    fn msi() -> Vec<u8> {
        let mut data = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
        data.extend_from_slice(&[0u8; 24]);
        data
    }

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_scenario_windows_game_with_readme() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "Game.exe", &pe(0x8664, true, b""));
        write(tmp.path(), "readme.txt", b"have fun");

        let verdict = configure(tmp.path(), ConfigureParams::default()).unwrap();
        let filtered = verdict.filter(FilterParams {
            os: Some(Os::Windows),
            arch: Some(Arch::Amd64),
        });

        assert_eq!(filtered.candidates.len(), 1);
        let best = &filtered.candidates[0];
        assert_eq!(best.path, "Game.exe");
        assert_eq!(best.flavor, Flavor::NativeWindows);
        assert_eq!(best.arch, Some(Arch::Amd64));
    }

    #[test]
    fn test_scenario_linux_native_with_clutter() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "Game.x86_64", &elf(62));
        write(tmp.path(), "libsteam.so", b"not even an elf");
        write(tmp.path(), "vcredist_x64.exe", &pe(0x8664, true, b""));

        let verdict = configure(tmp.path(), ConfigureParams::default()).unwrap();
        let filtered = verdict.filter(FilterParams {
            os: Some(Os::Linux),
            arch: Some(Arch::Amd64),
        });

        assert_eq!(filtered.candidates.len(), 1);
        let best = &filtered.candidates[0];
        assert_eq!(best.path, "Game.x86_64");
        assert_eq!(best.flavor, Flavor::NativeLinux);
        assert_eq!(best.arch, Some(Arch::Amd64));
    }

    #[test]
    fn test_scenario_macos_app_bundle() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "MyGame.app/Contents/Info.plist", b"<plist/>");
        write(tmp.path(), "MyGame.app/Contents/MacOS/mygame", &macho());

        let verdict = configure(tmp.path(), ConfigureParams::default()).unwrap();
        let filtered = verdict.filter(FilterParams {
            os: Some(Os::Darwin),
            arch: None,
        });

        assert_eq!(filtered.candidates.len(), 1);
        let best = &filtered.candidates[0];
        assert_eq!(best.path, "MyGame.app");
        assert_eq!(best.flavor, Flavor::AppMacos);
    }

    #[test]
    fn test_scenario_love_bundle() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "game.love", b"does not matter");

        let verdict = configure(tmp.path(), ConfigureParams::default()).unwrap();
        let filtered = verdict.filter(FilterParams {
            os: Some(Os::Linux),
            arch: None,
        });

        assert_eq!(filtered.candidates.len(), 1);
        assert_eq!(filtered.candidates[0].flavor, Flavor::Love);
        assert_eq!(filtered.candidates[0].path, "game.love");
    }

    #[test]
    fn test_scenario_installer_clutter_on_windows() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "setup.exe",
            &pe(
                0x8664,
                true,
                b"<requestedExecutionLevel level=\"requireAdministrator\"/>",
            ),
        );
        write(tmp.path(), "installer.msi", &msi());
        write(tmp.path(), "game.exe", &pe(0x8664, true, b""));

        let verdict = configure(tmp.path(), ConfigureParams::default()).unwrap();
        assert_eq!(verdict.candidates.len(), 3);

        let filtered = verdict.filter(FilterParams {
            os: Some(Os::Windows),
            arch: None,
        });

        assert_eq!(filtered.candidates.len(), 1);
        assert_eq!(filtered.candidates[0].path, "game.exe");
    }

    #[test]
    fn test_scenario_html_game() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "index.html", b"<html></html>");
        write(tmp.path(), "assets/foo.png", b"png bytes");
        write(tmp.path(), "game.js", b"console.log('hi')");

        let verdict = configure(tmp.path(), ConfigureParams::default()).unwrap();

        for os in [Os::Linux, Os::Windows, Os::Darwin] {
            let filtered = verdict.filter(FilterParams {
                os: Some(os),
                arch: None,
            });
            assert_eq!(filtered.candidates.len(), 1, "os {os}");
            assert_eq!(filtered.candidates[0].flavor, Flavor::Html);
            assert_eq!(filtered.candidates[0].path, "index.html");
        }
    }

    #[test]
    fn test_verdict_round_trips_through_json() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "Game.x86_64", &elf(62));

        let verdict = configure(tmp.path(), ConfigureParams::default()).unwrap();
        let json = serde_json::to_string(&verdict).unwrap();
        let back: Verdict = serde_json::from_str(&json).unwrap();
        assert_eq!(verdict, back);
    }

    #[test]
    fn test_filtered_depth_invariant() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "game", &elf(62));
        write(tmp.path(), "bin/extra", &elf(62));
        write(tmp.path(), "bin/more", &elf(3));

        let verdict = configure(tmp.path(), ConfigureParams::default()).unwrap();
        let filtered = verdict.filter(FilterParams {
            os: Some(Os::Linux),
            arch: None,
        });

        // every surviving candidate sits at the compatible set's
        // minimum depth
        assert!(!filtered.candidates.is_empty());
        assert!(filtered.candidates.iter().all(|c| c.depth == 1));
    }
}
