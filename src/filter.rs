//! Verdict filtering and ranking.
//!
//! [`Verdict::filter`] narrows a candidate set down for one OS/arch
//! target. It is a monotonic cascade: every stage either keeps the
//! working set or replaces it with a subset, and some stages end the
//! cascade early once a single candidate remains. The stages live in an
//! ordered table so each one can be reasoned about (and tested) on its
//! own.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::ControlFlow;
use std::path::Path;
use tracing::{debug, warn};

use crate::probes::pe;
use crate::types::{Arch, Candidate, Flavor, Verdict};

/// Operating system a verdict can be narrowed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Linux (ELF natives).
    Linux,
    /// Windows (PE natives, batch scripts, MSI).
    Windows,
    /// macOS (Mach-O natives and app bundles).
    Darwin,
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Os::Linux => write!(f, "linux"),
            Os::Windows => write!(f, "windows"),
            Os::Darwin => write!(f, "darwin"),
        }
    }
}

/// Target selection for [`Verdict::filter`]. Leaving a field unset
/// means "do not narrow on this axis".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterParams {
    /// Requested operating system.
    pub os: Option<Os>,
    /// Requested architecture.
    pub arch: Option<Arch>,
}

impl Verdict {
    /// Narrow and rank this verdict's candidates for the given target.
    ///
    /// Returns a copy; the original verdict is not touched. After a
    /// successful filter the first candidate is the preferred launch
    /// target.
    pub fn filter(&self, params: FilterParams) -> Verdict {
        debug!(
            count = self.candidates.len(),
            os = ?params.os,
            arch = ?params.arch,
            "filtering candidates"
        );

        let mut narrowing = Narrowing {
            base: &self.base_path,
            os: params.os,
            arch: params.arch,
            set: self.candidates.clone(),
        };

        for (name, stage) in STAGES {
            if stage(&mut narrowing).is_break() {
                debug!(stage = name, "cascade settled early");
                break;
            }
        }

        Verdict {
            base_path: self.base_path.clone(),
            total_size: self.total_size,
            candidates: narrowing.set,
        }
    }
}

/// Working state threaded through the cascade.
struct Narrowing<'a> {
    base: &'a Path,
    os: Option<Os>,
    arch: Option<Arch>,
    set: Vec<Candidate>,
}

impl Narrowing<'_> {
    fn has_os(&self, os: Os) -> bool {
        self.os == Some(os)
    }

    fn has_arch(&self, arch: Arch) -> bool {
        self.arch == Some(arch)
    }

    fn of_flavor(&self, flavor: Flavor) -> Vec<Candidate> {
        self.set
            .iter()
            .filter(|c| c.flavor == flavor)
            .cloned()
            .collect()
    }

    fn settle_if_single(&self) -> ControlFlow<()> {
        if self.set.len() == 1 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

type Stage = fn(&mut Narrowing) -> ControlFlow<()>;

/// The narrowing cascade, in order. Every stage shrinks (or keeps) the
/// working set; `Break` means the set is final.
static STAGES: &[(&str, Stage)] = &[
    ("os-arch compatibility", stage_compatibility),
    ("minimum depth", stage_minimum_depth),
    ("love wins", stage_love_wins),
    ("app bundles win", stage_app_bundles_win),
    ("windows scripts win", stage_windows_scripts_win),
    ("linux scripts win", stage_linux_scripts_win),
    ("linux 64-bit preference", stage_linux_64bit),
    ("installer exclusion", stage_installer_exclusion),
    ("gui preference", stage_gui_preference),
    ("html last resort", stage_html_last_resort),
    ("jar last resort", stage_jar_last_resort),
    ("biggest first", stage_biggest_first),
    ("scored ranking", stage_scored_ranking),
];

/// Drop candidates the requested OS or arch can never run. Flavors
/// without a native loader (HTML, Love, Jar, scripts, MSI) pass every
/// OS filter.
fn stage_compatibility(n: &mut Narrowing) -> ControlFlow<()> {
    let (os, arch) = (n.os, n.arch);
    let excludes = |target: Os| os.is_some() && os != Some(target);
    let wants_386 = arch == Some(Arch::I386);

    n.set.retain(|c| {
        let keep = match c.flavor {
            Flavor::NativeLinux => {
                let os_ok = !excludes(Os::Linux);
                let arch_ok = !(wants_386 && c.arch.is_some() && c.arch != Some(Arch::I386));
                os_ok && arch_ok
            }
            Flavor::NativeWindows => !excludes(Os::Windows),
            Flavor::NativeMacos | Flavor::AppMacos => !excludes(Os::Darwin),
            _ => true,
        };
        if !keep {
            debug!(path = %c.path, flavor = %c.flavor, "excluding, incompatible with target");
        }
        keep
    });

    n.settle_if_single()
}

/// Keep only the candidates closest to the top of the tree.
fn stage_minimum_depth(n: &mut Narrowing) -> ControlFlow<()> {
    let Some(lowest) = n.set.iter().map(|c| c.depth).min() else {
        return ControlFlow::Continue(());
    };

    n.set.retain(|c| {
        if c.depth == lowest {
            true
        } else {
            debug!(path = %c.path, depth = c.depth, lowest, "excluding, deeper than lowest");
            false
        }
    });

    n.settle_if_single()
}

/// A lone Love2D game settles the verdict outright.
fn stage_love_wins(n: &mut Narrowing) -> ControlFlow<()> {
    let loves = n.of_flavor(Flavor::Love);
    if loves.len() == 1 {
        debug!("found single love candidate");
        n.set = loves;
        return ControlFlow::Break(());
    }
    ControlFlow::Continue(())
}

/// On macOS, app bundles beat loose Mach-O binaries.
fn stage_app_bundles_win(n: &mut Narrowing) -> ControlFlow<()> {
    if n.has_os(Os::Darwin) {
        let apps = n.of_flavor(Flavor::AppMacos);
        if !apps.is_empty() {
            debug!(count = apps.len(), "keeping app bundles only");
            n.set = apps;
        }
    }
    ControlFlow::Continue(())
}

/// On Windows, a lone batch script settles the verdict.
fn stage_windows_scripts_win(n: &mut Narrowing) -> ControlFlow<()> {
    if n.has_os(Os::Windows) {
        let scripts = n.of_flavor(Flavor::ScriptWindows);
        if scripts.len() == 1 {
            debug!(path = %scripts[0].path, "found single windows script");
            n.set = scripts;
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

/// On Linux, a lone shell script settles the verdict.
fn stage_linux_scripts_win(n: &mut Narrowing) -> ControlFlow<()> {
    if n.has_os(Os::Linux) {
        let scripts = n.of_flavor(Flavor::Script);
        if scripts.len() == 1 {
            debug!(path = %scripts[0].path, "found single linux script");
            n.set = scripts;
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

/// On 64-bit Linux, 64-bit natives beat everything; with no 64-bit
/// natives around, jars beat the remaining 32-bit natives.
fn stage_linux_64bit(n: &mut Narrowing) -> ControlFlow<()> {
    if !(n.has_os(Os::Linux) && n.has_arch(Arch::Amd64)) {
        return ControlFlow::Continue(());
    }

    let linux64: Vec<Candidate> = n
        .set
        .iter()
        .filter(|c| c.flavor == Flavor::NativeLinux && c.arch == Some(Arch::Amd64))
        .cloned()
        .collect();

    if !linux64.is_empty() {
        debug!(count = linux64.len(), "keeping native 64-bit linux candidates");
        n.set = linux64;
        return ControlFlow::Continue(());
    }

    let jars = n.of_flavor(Flavor::Jar);
    if !jars.is_empty() {
        debug!(count = jars.len(), "no 64-bit natives, keeping jars");
        n.set = jars;
        return ControlFlow::Break(());
    }

    ControlFlow::Continue(())
}

/// On Windows, drop native executables that look like installers:
/// recognized installer payloads, binaries requesting elevation, and
/// manifest-less binaries with setup-like names. Files that cannot be
/// opened or probed are kept.
fn stage_installer_exclusion(n: &mut Narrowing) -> ControlFlow<()> {
    if !n.has_os(Os::Windows) {
        return ControlFlow::Continue(());
    }

    let base = n.base;
    n.set
        .retain(|c| c.flavor != Flavor::NativeWindows || !is_installer_like(base, c));

    n.settle_if_single()
}

fn is_installer_like(base: &Path, c: &Candidate) -> bool {
    if let Some(info) = &c.windows_info {
        if let Some(kind) = info.installer_type {
            debug!(path = %c.path, installer = %kind, "excluding, recognized installer");
            return true;
        }
    }

    let full = base.join(&c.path);
    let mut file = match std::fs::File::open(&full) {
        Ok(f) => f,
        Err(e) => {
            warn!(path = %c.path, error = %e, "could not open windows candidate for inspection");
            return false;
        }
    };

    let info = match pe::probe(&mut file) {
        Ok(Some(info)) => info,
        Ok(None) => return false,
        Err(e) => {
            warn!(path = %c.path, error = %e, "could not probe windows candidate");
            return false;
        }
    };

    if info.requires_elevation {
        debug!(path = %c.path, "excluding, requires elevation");
        return true;
    }

    let basename = c.path.rsplit('/').next().unwrap_or(&c.path);
    if !info.has_assembly_info && pe::has_suspiciously_setup_like_name(basename) {
        debug!(path = %c.path, "excluding, no assembly info and setup-like name");
        return true;
    }

    false
}

/// On Windows, GUI executables beat console ones.
fn stage_gui_preference(n: &mut Narrowing) -> ControlFlow<()> {
    if !n.has_os(Os::Windows) {
        return ControlFlow::Continue(());
    }

    let gui: Vec<Candidate> = n
        .set
        .iter()
        .filter(|c| {
            c.flavor == Flavor::NativeWindows
                && c.windows_info.as_ref().is_some_and(|info| info.gui)
        })
        .cloned()
        .collect();

    if !gui.is_empty() {
        n.set = gui;
    }

    n.settle_if_single()
}

/// HTML only survives when nothing else does.
fn stage_html_last_resort(n: &mut Narrowing) -> ControlFlow<()> {
    last_resort(n, Flavor::Html)
}

/// Jars only survive when nothing else does.
fn stage_jar_last_resort(n: &mut Narrowing) -> ControlFlow<()> {
    last_resort(n, Flavor::Jar)
}

fn last_resort(n: &mut Narrowing, flavor: Flavor) -> ControlFlow<()> {
    let matching = n.set.iter().filter(|c| c.flavor == flavor).count();
    if matching > 0 && matching < n.set.len() {
        debug!(
            %flavor,
            matching,
            others = n.set.len() - matching,
            "dropping last-resort flavor, better candidates exist"
        );
        n.set.retain(|c| c.flavor != flavor);
    }
    ControlFlow::Continue(())
}

/// Stable sort, biggest candidate first.
fn stage_biggest_first(n: &mut Narrowing) -> ControlFlow<()> {
    n.set.sort_by(|a, b| b.size.cmp(&a.size));
    ControlFlow::Continue(())
}

/// What a pattern match does to a candidate's score.
#[derive(Debug, Clone, Copy)]
enum Penalty {
    /// Subtract from the base score.
    Score(i64),
    /// Zero the score, dropping the candidate.
    Exclude,
}

struct PatternEntry {
    pattern: Regex,
    penalty: Penalty,
}

fn entry(pattern: &str, penalty: Penalty) -> PatternEntry {
    PatternEntry {
        pattern: Regex::new(pattern).expect("pattern blacklist regex"),
        penalty,
    }
}

/// Path patterns that make a candidate less likely (or impossible) to
/// be the thing the player actually launches.
static PATTERN_BLACKLIST: Lazy<Vec<PatternEntry>> = Lazy::new(|| {
    vec![
        // penalties
        entry(r"(?i)unins.*\.exe$", Penalty::Score(50)),
        entry(r"(?i)kick\.bin$", Penalty::Score(50)),
        entry(r"(?i)\.vshost\.exe$", Penalty::Score(50)),
        entry(r"(?i)nacl_helper", Penalty::Score(20)),
        entry(r"(?i)nwjc\.exe$", Penalty::Score(20)),
        entry(r"(?i)flixel\.exe$", Penalty::Score(20)),
        // excludes
        entry(r"(?i)\.(so|dylib)$", Penalty::Exclude),
        entry(r"(?i)dxwebsetup\.exe$", Penalty::Exclude),
        entry(r"(?i)vcredist.*\.exe$", Penalty::Exclude),
        entry(r"(?i)unitycrashhandler.*\.exe$", Penalty::Exclude),
    ]
});

fn compute_score(c: &Candidate) -> i64 {
    let mut score: i64 = 100;
    for e in PATTERN_BLACKLIST.iter() {
        if e.pattern.is_match(&c.path) {
            match e.penalty {
                Penalty::Score(delta) => {
                    debug!(path = %c.path, delta, pattern = %e.pattern, "score penalty");
                    score -= delta;
                }
                Penalty::Exclude => {
                    debug!(path = %c.path, pattern = %e.pattern, "zero-scoring");
                    score = 0;
                }
            }
        }
    }
    score
}

/// Score every candidate against the pattern blacklist, drop the
/// non-positive ones, and rank the rest highest score first. Ties keep
/// the biggest-first order from the previous stage.
fn stage_scored_ranking(n: &mut Narrowing) -> ControlFlow<()> {
    let mut scored: Vec<(Candidate, i64)> = Vec::with_capacity(n.set.len());
    for c in n.set.drain(..) {
        let score = compute_score(&c);
        if score > 0 {
            scored.push((c, score));
        } else {
            debug!(path = %c.path, score, "excluding, non-positive score");
        }
    }

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    for (c, score) in &scored {
        debug!(score, path = %c.path, "ranked candidate");
    }

    n.set = scored.into_iter().map(|(c, _)| c).collect();
    ControlFlow::Continue(())
}
