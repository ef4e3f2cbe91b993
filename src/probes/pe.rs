//! PE (Portable Executable) probe.
//!
//! Parses enough of the DOS and COFF headers to classify an `.exe`:
//! machine type for the architecture, optional-header subsystem for the
//! GUI flag. On top of that it scans the image for installer markers,
//! for the embedded side-by-side manifest, and for the
//! `requestedExecutionLevel` the installer-exclusion stage cares about.

use memchr::memmem;
use std::io::{Read, Seek, SeekFrom};
use tracing::debug;

use crate::probes::{read_u16, read_u32};
use crate::types::{Arch, Candidate, Flavor, InstallerType, WindowsInfo};

/// PE machine type constants, the subset a launcher branches on.
pub mod machine {
    /// IMAGE_FILE_MACHINE_I386
    pub const I386: u16 = 0x014C;
    /// IMAGE_FILE_MACHINE_AMD64
    pub const AMD64: u16 = 0x8664;
}

/// Optional-header subsystem values.
pub mod subsystem {
    /// IMAGE_SUBSYSTEM_WINDOWS_GUI
    pub const WINDOWS_GUI: u16 = 2;
    /// IMAGE_SUBSYSTEM_WINDOWS_CUI
    pub const WINDOWS_CUI: u16 = 3;
}

/// Cap on how much of the image the marker scans read.
const SCAN_CAP: u64 = 4 * 1024 * 1024;

/// Everything the probe learns about a PE file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeInfo {
    /// Architecture from the COFF machine field, when modeled.
    pub arch: Option<Arch>,
    /// True for GUI-subsystem executables.
    pub gui: bool,
    /// Installer technology recognized by embedded markers.
    pub installer_type: Option<InstallerType>,
    /// True when a side-by-side assembly manifest is present.
    pub has_assembly_info: bool,
    /// True when the manifest requests elevated execution.
    pub requires_elevation: bool,
}

impl PeInfo {
    /// Turn the probe result into a native Windows candidate.
    pub fn into_candidate(self) -> Candidate {
        let mut c = Candidate::new(Flavor::NativeWindows);
        c.arch = self.arch;
        c.windows_info = Some(WindowsInfo {
            gui: self.gui,
            installer_type: self.installer_type,
        });
        c
    }
}

/// Probe a seekable byte source as a PE file.
///
/// Returns `Ok(None)` when the bytes are not a PE image (missing MZ stub
/// or PE signature); that is a clean failure and the sniffer falls
/// through to its magic tests.
pub fn probe<R: Read + Seek>(r: &mut R) -> std::io::Result<Option<PeInfo>> {
    r.seek(SeekFrom::Start(0))?;

    let mut dos = [0u8; 0x40];
    if read_fully(r, &mut dos)? < dos.len() {
        return Ok(None);
    }
    if dos[0] != b'M' || dos[1] != b'Z' {
        return Ok(None);
    }

    let pe_offset = match read_u32(&dos, 0x3C, true) {
        Some(off) => u64::from(off),
        None => return Ok(None),
    };

    // PE signature (4) + COFF header (20) + enough of the optional
    // header to reach the subsystem field at offset 68.
    r.seek(SeekFrom::Start(pe_offset))?;
    let mut headers = [0u8; 4 + 20 + 96];
    let n = read_fully(r, &mut headers)?;
    if n < 4 + 20 {
        return Ok(None);
    }
    if &headers[..4] != b"PE\x00\x00" {
        return Ok(None);
    }

    let coff = 4;
    let machine = match read_u16(&headers[..n], coff, true) {
        Some(m) => m,
        None => return Ok(None),
    };
    let size_of_optional = read_u16(&headers[..n], coff + 16, true).unwrap_or(0);

    let arch = match machine {
        machine::I386 => Some(Arch::I386),
        machine::AMD64 => Some(Arch::Amd64),
        _ => None,
    };

    let opt = coff + 20;
    let mut gui = false;
    if size_of_optional >= 70 {
        if let Some(sub) = read_u16(&headers[..n], opt + 68, true) {
            gui = sub == subsystem::WINDOWS_GUI;
        }
    }

    let mut info = PeInfo {
        arch,
        gui,
        ..Default::default()
    };
    scan_markers(r, &mut info)?;

    Ok(Some(info))
}

/// Scan the image body for installer and manifest markers.
///
/// The side-by-side manifest lives in the resource section as plain XML,
/// so a bounded substring scan finds what we need without walking the
/// resource directory tree.
fn scan_markers<R: Read + Seek>(r: &mut R, info: &mut PeInfo) -> std::io::Result<()> {
    r.seek(SeekFrom::Start(0))?;
    let mut data = Vec::new();
    r.take(SCAN_CAP).read_to_end(&mut data)?;

    info.installer_type = detect_installer(&data);
    info.has_assembly_info = memmem::find(&data, b"<assemblyIdentity").is_some();
    info.requires_elevation = memmem::find(&data, b"requireAdministrator").is_some()
        || memmem::find(&data, b"highestAvailable").is_some();

    if let Some(kind) = info.installer_type {
        debug!(installer = %kind, "recognized installer markers");
    }

    Ok(())
}

fn detect_installer(data: &[u8]) -> Option<InstallerType> {
    if memmem::find(data, b"Nullsoft.NSIS.exehead").is_some()
        || memmem::find(data, b"NullsoftInst").is_some()
    {
        return Some(InstallerType::Nsis);
    }
    if memmem::find(data, b"Inno Setup Setup Data").is_some()
        || memmem::find(data, b"JR.Inno.Setup").is_some()
    {
        return Some(InstallerType::InnoSetup);
    }
    if memmem::find(data, b"InstallShield").is_some() {
        return Some(InstallerType::InstallShield);
    }
    None
}

/// Filename heuristic for installer-looking basenames, consumed by the
/// verdict filter's installer-exclusion stage. Matching on `instal`
/// catches `install`, `installer` and common localized spellings.
pub fn has_suspiciously_setup_like_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("setup") || lower.contains("instal")
}

/// Read into `buf` until it is full or the source is exhausted.
fn read_fully<R: Read>(r: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = r.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Build a minimal PE image with the given machine and subsystem.
    fn make_pe(machine_value: u16, subsystem_value: u16) -> Vec<u8> {
        let mut data = vec![0u8; 0x200];
        data[0] = b'M';
        data[1] = b'Z';
        // e_lfanew
        data[0x3C..0x40].copy_from_slice(&0x40u32.to_le_bytes());
        // PE signature
        data[0x40..0x44].copy_from_slice(b"PE\x00\x00");
        let coff = 0x44;
        data[coff..coff + 2].copy_from_slice(&machine_value.to_le_bytes());
        // SizeOfOptionalHeader
        data[coff + 16..coff + 18].copy_from_slice(&0xF0u16.to_le_bytes());
        let opt = coff + 20;
        // PE32+ magic
        data[opt..opt + 2].copy_from_slice(&0x20Bu16.to_le_bytes());
        data[opt + 68..opt + 70].copy_from_slice(&subsystem_value.to_le_bytes());
        data
    }

    #[test]
    fn test_gui_amd64() {
        let data = make_pe(machine::AMD64, subsystem::WINDOWS_GUI);
        let info = probe(&mut Cursor::new(data)).unwrap().unwrap();
        assert_eq!(info.arch, Some(Arch::Amd64));
        assert!(info.gui);
        assert_eq!(info.installer_type, None);
        assert!(!info.requires_elevation);
    }

    #[test]
    fn test_console_i386() {
        let data = make_pe(machine::I386, subsystem::WINDOWS_CUI);
        let info = probe(&mut Cursor::new(data)).unwrap().unwrap();
        assert_eq!(info.arch, Some(Arch::I386));
        assert!(!info.gui);
    }

    #[test]
    fn test_not_a_pe_is_clean_failure() {
        // an ELF renamed to .exe must fall through, not error
        let mut data = vec![0u8; 0x80];
        data[..4].copy_from_slice(&[0x7F, b'E', b'L', b'F']);
        assert!(probe(&mut Cursor::new(data)).unwrap().is_none());
    }

    #[test]
    fn test_mz_without_pe_signature() {
        let mut data = vec![0u8; 0x80];
        data[0] = b'M';
        data[1] = b'Z';
        data[0x3C..0x40].copy_from_slice(&0x40u32.to_le_bytes());
        assert!(probe(&mut Cursor::new(data)).unwrap().is_none());
    }

    #[test]
    fn test_too_short() {
        assert!(probe(&mut Cursor::new(b"MZ".to_vec())).unwrap().is_none());
    }

    #[test]
    fn test_nsis_markers() {
        let mut data = make_pe(machine::I386, subsystem::WINDOWS_GUI);
        data.extend_from_slice(b"...Nullsoft.NSIS.exehead...");
        let info = probe(&mut Cursor::new(data)).unwrap().unwrap();
        assert_eq!(info.installer_type, Some(InstallerType::Nsis));
    }

    #[test]
    fn test_inno_markers() {
        let mut data = make_pe(machine::I386, subsystem::WINDOWS_GUI);
        data.extend_from_slice(b"...Inno Setup Setup Data...");
        let info = probe(&mut Cursor::new(data)).unwrap().unwrap();
        assert_eq!(info.installer_type, Some(InstallerType::InnoSetup));
    }

    #[test]
    fn test_elevation_and_manifest() {
        let mut data = make_pe(machine::AMD64, subsystem::WINDOWS_GUI);
        data.extend_from_slice(
            b"<assemblyIdentity name=\"setup\"/>\
              <requestedExecutionLevel level=\"requireAdministrator\"/>",
        );
        let info = probe(&mut Cursor::new(data)).unwrap().unwrap();
        assert!(info.has_assembly_info);
        assert!(info.requires_elevation);
    }

    #[test]
    fn test_setup_like_names() {
        assert!(has_suspiciously_setup_like_name("setup.exe"));
        assert!(has_suspiciously_setup_like_name("Setup_Win64.exe"));
        assert!(has_suspiciously_setup_like_name("installer.exe"));
        assert!(has_suspiciously_setup_like_name("instalar.exe"));
        assert!(!has_suspiciously_setup_like_name("game.exe"));
        assert!(!has_suspiciously_setup_like_name("launcher.exe"));
    }

    #[test]
    fn test_into_candidate() {
        let data = make_pe(machine::AMD64, subsystem::WINDOWS_GUI);
        let info = probe(&mut Cursor::new(data)).unwrap().unwrap();
        let c = info.into_candidate();
        assert_eq!(c.flavor, Flavor::NativeWindows);
        assert_eq!(c.arch, Some(Arch::Amd64));
        assert!(c.windows_info.unwrap().gui);
    }
}
