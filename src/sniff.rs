//! Magic sniffer: decide a single file's launch flavor.
//!
//! The decision tree goes path conventions first (`index.html`,
//! `conf.lua`, `.love`, `.exe`, `.bat`/`.cmd`), then an 8-byte magic
//! table dispatching to the format probes. First match wins; a probe's
//! clean failure falls through to the next test.

use std::io::{Read, Seek, SeekFrom};

use crate::error::Result;
use crate::probes::{elf, love, macho, pe, script, zip};
use crate::types::{path_depth, Candidate, Flavor};

/// Magic byte signatures the sniffer recognizes.
pub mod magic {
    /// Thin Mach-O, 32-bit little-endian: 0xCEFAEDFE.
    pub const MACHO_32_LE: [u8; 4] = [0xCE, 0xFA, 0xED, 0xFE];

    /// Thin Mach-O, 64-bit little-endian: 0xCFFAEDFE.
    pub const MACHO_64_LE: [u8; 4] = [0xCF, 0xFA, 0xED, 0xFE];

    /// Fat Mach-O or compiled Java class: 0xCAFEBABE.
    pub const CAFEBABE: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

    /// ELF magic: 0x7F 'E' 'L' 'F'.
    pub const ELF: [u8; 4] = [0x7F, b'E', b'L', b'F'];

    /// Shebang: "#!".
    pub const SHEBANG: [u8; 2] = [0x23, 0x21];

    /// OLE compound document, the container MSI packages use.
    pub const OLE_COMPOUND: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

    /// ZIP local-file header: "PK\x03\x04".
    pub const ZIP_LOCAL: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
}

/// Sniff a single file and decide whether it is a launch candidate.
///
/// `reader` is borrowed for the duration of the call; `name` is the
/// file's path relative to the scan root (used for extension and
/// basename checks) and `size` its length in bytes.
///
/// On success the candidate has its size filled in, its path defaulted
/// to `name` when the probe did not set one, and its depth computed.
pub fn sniff<R: Read + Seek>(reader: &mut R, name: &str, size: u64) -> Result<Option<Candidate>> {
    let mut candidate = match do_sniff(reader, name)? {
        Some(c) => c,
        None => return Ok(None),
    };

    candidate.size = size;
    if candidate.path.is_empty() {
        candidate.path = name.to_string();
    }
    candidate.depth = path_depth(&candidate.path);

    Ok(Some(candidate))
}

fn do_sniff<R: Read + Seek>(r: &mut R, path: &str) -> Result<Option<Candidate>> {
    let lower_path = path.to_lowercase();
    let lower_base = lower_path.rsplit('/').next().unwrap_or(&lower_path);

    match lower_base {
        "index.html" => {
            return Ok(Some(Candidate::new(Flavor::Html).with_path(path)));
        }
        "conf.lua" => {
            return Ok(love::probe(parent_dir(path)));
        }
        _ => {}
    }

    if lower_path.ends_with(".love") {
        return Ok(Some(Candidate::new(Flavor::Love).with_path(path)));
    }

    // if it ends in .exe, it's probably an .exe
    if lower_path.ends_with(".exe") {
        if let Some(info) = pe::probe(r)? {
            return Ok(Some(info.into_candidate()));
        }
        // it wasn't an exe, carry on...
    }

    if lower_path.ends_with(".bat") || lower_path.ends_with(".cmd") {
        return Ok(Some(Candidate::new(Flavor::ScriptWindows)));
    }

    r.seek(SeekFrom::Start(0))?;
    let mut buf = [0u8; 8];
    match r.read_exact(&mut buf) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            // too short to be an exec
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    }

    // intel Mach-O executables start with 0xCEFAEDFE or 0xCFFAEDFE
    // (old PowerPC Mach-O executables started with 0xFEEDFACE)
    if buf[..4] == magic::MACHO_32_LE || buf[..4] == magic::MACHO_64_LE {
        return Ok(Some(Candidate::new(Flavor::NativeMacos)));
    }

    // 0xCAFEBABE is shared between Mach-O universal binaries and
    // compiled Java classes; the fat probe tells them apart
    if buf[..4] == magic::CAFEBABE {
        return Ok(macho::probe_fat(r)?);
    }

    if buf[..4] == magic::ELF {
        return Ok(elf::probe(r)?);
    }

    if buf[..2] == magic::SHEBANG {
        return Ok(script::probe(r)?);
    }

    if buf == magic::OLE_COMPOUND {
        return Ok(Some(Candidate::new(Flavor::Msi)));
    }

    if buf[..4] == magic::ZIP_LOCAL {
        return Ok(zip::probe(r)?);
    }

    Ok(None)
}

/// Directory part of a forward-slash relative path; empty at top level.
fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}
