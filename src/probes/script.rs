//! Shebang probe for POSIX scripts.

use std::io::{Read, Seek, SeekFrom};

use crate::types::{Candidate, Flavor, ScriptInfo};

/// How much of the file the probe reads looking for the shebang line.
const SHEBANG_READ: usize = 256;

/// Probe a seekable byte source as a shebang script.
///
/// Records the interpreter path from the first line, e.g. `/bin/sh` or
/// `/usr/bin/env`.
pub fn probe<R: Read + Seek>(r: &mut R) -> std::io::Result<Option<Candidate>> {
    r.seek(SeekFrom::Start(0))?;

    let mut buf = vec![0u8; SHEBANG_READ];
    let mut total = 0;
    loop {
        let n = r.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
        if total == buf.len() {
            break;
        }
    }
    buf.truncate(total);

    if !buf.starts_with(b"#!") {
        return Ok(None);
    }

    let line_end = buf.iter().position(|&b| b == b'\n').unwrap_or(buf.len());
    let line = String::from_utf8_lossy(&buf[2..line_end]);
    let interpreter = line
        .trim()
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_string();

    let mut c = Candidate::new(Flavor::Script);
    c.script_info = Some(ScriptInfo { interpreter });
    Ok(Some(c))
}
