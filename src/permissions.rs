//! Executable-bit fixup for classified candidates.
//!
//! Archives produced on Windows routinely lose POSIX permission bits,
//! leaving Linux and macOS binaries unlaunchable. This pass adds the
//! bit back for the flavors that need it. It is the only place the
//! library ever modifies the scanned tree.

use tracing::debug;

use crate::error::{ClassifyError, Result};
use crate::types::Verdict;

/// Controls the behavior of [`fix_permissions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FixPermissionsParams {
    /// Report what would change without touching the filesystem.
    pub dry_run: bool,
}

/// Make sure native Linux/macOS executables and scripts have the
/// executable bit set.
///
/// Returns the relative paths that were (or, in a dry run, would have
/// been) fixed. Every candidate's `mode` is zeroed afterwards; it is no
/// longer authoritative. Errors propagate immediately.
pub fn fix_permissions(v: &mut Verdict, params: FixPermissionsParams) -> Result<Vec<String>> {
    let base = v.base_path.clone();
    let mut fixed = Vec::new();

    for c in &mut v.candidates {
        if c.flavor.needs_exec_bit() && c.mode & 0o100 == 0 {
            debug!(path = %c.path, "adding missing executable bit");

            fixed.push(c.path.clone());
            if !params.dry_run {
                let full = base.join(&c.path);
                set_executable(&full).map_err(|source| ClassifyError::FixPermissions {
                    path: c.path.clone(),
                    source,
                })?;
            }
        }

        c.mode = 0;
    }

    Ok(fixed)
}

#[cfg(unix)]
fn set_executable(path: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &std::path::Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::types::{path_depth, Candidate, Flavor};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn candidate(flavor: Flavor, path: &str, mode: u32) -> Candidate {
        let mut c = Candidate::new(flavor).with_path(path);
        c.depth = path_depth(path);
        c.mode = mode;
        c
    }

    fn write_with_mode(root: &std::path::Path, rel: &str, mode: u32) {
        let full = root.join(rel);
        fs::write(&full, b"stub").unwrap();
        fs::set_permissions(&full, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn test_adds_missing_bit() {
        let tmp = tempfile::tempdir().unwrap();
        write_with_mode(tmp.path(), "game", 0o644);

        let mut verdict = Verdict {
            base_path: tmp.path().to_path_buf(),
            total_size: 4,
            candidates: vec![candidate(Flavor::NativeLinux, "game", 0o644)],
        };

        let fixed = fix_permissions(&mut verdict, FixPermissionsParams::default()).unwrap();
        assert_eq!(fixed, vec!["game"]);

        let mode = fs::metadata(tmp.path().join("game"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
        assert_eq!(verdict.candidates[0].mode, 0);
    }

    #[test]
    fn test_leaves_already_executable_alone() {
        let tmp = tempfile::tempdir().unwrap();
        write_with_mode(tmp.path(), "game", 0o755);

        let mut verdict = Verdict {
            base_path: tmp.path().to_path_buf(),
            total_size: 4,
            candidates: vec![candidate(Flavor::NativeLinux, "game", 0o755)],
        };

        let fixed = fix_permissions(&mut verdict, FixPermissionsParams::default()).unwrap();
        assert!(fixed.is_empty());
        // mode is still zeroed; it is no longer authoritative
        assert_eq!(verdict.candidates[0].mode, 0);
    }

    #[test]
    fn test_other_flavors_are_not_touched() {
        let tmp = tempfile::tempdir().unwrap();
        write_with_mode(tmp.path(), "run.bat", 0o644);

        let mut verdict = Verdict {
            base_path: tmp.path().to_path_buf(),
            total_size: 4,
            candidates: vec![candidate(Flavor::ScriptWindows, "run.bat", 0o644)],
        };

        let fixed = fix_permissions(&mut verdict, FixPermissionsParams::default()).unwrap();
        assert!(fixed.is_empty());
        let mode = fs::metadata(tmp.path().join("run.bat"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_dry_run_reports_without_changing() {
        let tmp = tempfile::tempdir().unwrap();
        write_with_mode(tmp.path(), "start.sh", 0o600);

        let mut verdict = Verdict {
            base_path: tmp.path().to_path_buf(),
            total_size: 4,
            candidates: vec![candidate(Flavor::Script, "start.sh", 0o600)],
        };

        let fixed = fix_permissions(
            &mut verdict,
            FixPermissionsParams { dry_run: true },
        )
        .unwrap();
        assert_eq!(fixed, vec!["start.sh"]);

        let mode = fs::metadata(tmp.path().join("start.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_missing_file_propagates_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut verdict = Verdict {
            base_path: tmp.path().to_path_buf(),
            total_size: 0,
            candidates: vec![candidate(Flavor::NativeLinux, "gone", 0o644)],
        };

        let err = fix_permissions(&mut verdict, FixPermissionsParams::default());
        assert!(err.is_err());
    }
}
