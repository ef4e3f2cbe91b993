//! ELF probe.
//!
//! Only the header matters here: enough to confirm this is an
//! executable or shared-object image and to pick out the machine for
//! the launcher's 32/64-bit preference. Anything else (core dumps,
//! relocatables) yields no candidate.

use std::io::{Read, Seek, SeekFrom};

use crate::probes::read_u16;
use crate::types::{Arch, Candidate, Flavor};

/// ELF e_machine values the launcher branches on.
pub mod machine {
    /// EM_386
    pub const EM_386: u16 = 3;
    /// EM_X86_64
    pub const EM_X86_64: u16 = 62;
}

/// ELF e_type values that can actually be launched.
pub mod elf_type {
    /// ET_EXEC
    pub const EXEC: u16 = 2;
    /// ET_DYN (PIE executables land here too)
    pub const DYN: u16 = 3;
}

/// Probe a seekable byte source as an ELF executable.
pub fn probe<R: Read + Seek>(r: &mut R) -> std::io::Result<Option<Candidate>> {
    r.seek(SeekFrom::Start(0))?;

    let mut header = [0u8; 20];
    let mut total = 0;
    while total < header.len() {
        let n = r.read(&mut header[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    if total < header.len() {
        return Ok(None);
    }

    if header[..4] != [0x7F, b'E', b'L', b'F'] {
        return Ok(None);
    }

    // EI_CLASS and EI_DATA must be meaningful for the rest of the
    // header to be readable.
    let class = header[4];
    let data_encoding = header[5];
    if !(1..=2).contains(&class) || !(1..=2).contains(&data_encoding) {
        return Ok(None);
    }
    let little_endian = data_encoding == 1;

    let e_type = match read_u16(&header, 16, little_endian) {
        Some(t) => t,
        None => return Ok(None),
    };
    if e_type != elf_type::EXEC && e_type != elf_type::DYN {
        return Ok(None);
    }

    let e_machine = match read_u16(&header, 18, little_endian) {
        Some(m) => m,
        None => return Ok(None),
    };

    let mut c = Candidate::new(Flavor::NativeLinux);
    c.arch = match e_machine {
        machine::EM_386 => Some(Arch::I386),
        machine::EM_X86_64 => Some(Arch::Amd64),
        _ => None,
    };

    Ok(Some(c))
}
