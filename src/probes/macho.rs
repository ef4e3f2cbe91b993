//! Fat Mach-O probe.
//!
//! Thin Mach-O images are recognized straight from their magic by the
//! sniffer; this probe only handles the `CA FE BA BE` prefix, which fat
//! Mach-O universal binaries share with compiled Java class files. The
//! tie is broken by a small generic identifier whose description string
//! is kept on the candidate as its `spell`.

use std::io::{Read, Seek, SeekFrom};

use crate::probes::read_u32;
use crate::types::{Candidate, Flavor};

/// The substring that marks a `CA FE BA BE` file as Java bytecode.
pub const JAVA_CLASS_SPELL: &str = "compiled Java class data,";

/// Fat headers never carry more than a handful of architectures; Java
/// class files put their version word in the same spot, and no real
/// class format version is this small.
const MAX_FAT_ARCHES: u32 = 20;

/// Probe a `CA FE BA BE` file.
///
/// Returns a macOS native candidate with its identification spell, or
/// `None` when the identifier recognizes Java bytecode instead.
pub fn probe_fat<R: Read + Seek>(r: &mut R) -> std::io::Result<Option<Candidate>> {
    let spell = describe(r)?;

    if spell.contains(JAVA_CLASS_SPELL) {
        // nevermind
        return Ok(None);
    }

    let mut c = Candidate::new(Flavor::NativeMacos);
    c.spell = Some(spell);
    Ok(Some(c))
}

/// Identify a `CA FE BA BE` file with a human-readable description, in
/// the style of file(1).
///
/// The word after the magic is `nfat_arch` for a universal binary but
/// `minor_version << 16 | major_version` for a Java class file; real
/// class-format majors start at 43 (JDK 1.0) while real fat binaries
/// stay well under [`MAX_FAT_ARCHES`] architectures.
fn describe<R: Read + Seek>(r: &mut R) -> std::io::Result<String> {
    r.seek(SeekFrom::Start(0))?;
    let mut header = [0u8; 8];
    let mut total = 0;
    while total < header.len() {
        let n = r.read(&mut header[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    if total < header.len() || header[..4] != [0xCA, 0xFE, 0xBA, 0xBE] {
        return Ok("data".to_string());
    }

    let word = read_u32(&header, 4, false).unwrap_or(0);

    if (1..=MAX_FAT_ARCHES).contains(&word) {
        let plural = if word == 1 { "" } else { "s" };
        return Ok(format!(
            "Mach-O universal binary with {word} architecture{plural}"
        ));
    }

    let minor = word >> 16;
    let major = word & 0xFFFF;
    if (43..=100).contains(&major) {
        return Ok(format!("{JAVA_CLASS_SPELL} version {major}.{minor}"));
    }

    Ok("Mach-O universal binary".to_string())
}
