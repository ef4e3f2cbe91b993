//! Launch Classifier CLI
//!
//! Command-line front end: scans a folder, optionally narrows the
//! verdict to one OS/arch target, and prints the ranked candidates.

use clap::{Parser, ValueEnum};
use launch_classifier::{
    configure, fix_permissions, Arch, ConfigureParams, FilterParams, FixPermissionsParams, Os,
    Verdict, VerdictStats,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Find and rank launch candidates in an install folder.
///
/// Walks the folder, sniffs launchable files (native executables,
/// scripts, bundles, jars, HTML), and prints them best first.
#[derive(Parser, Debug)]
#[command(name = "launch-classify")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Folder to scan
    path: PathBuf,

    /// Narrow the verdict to this operating system
    #[arg(long)]
    os: Option<OsArg>,

    /// Narrow the verdict to this architecture
    #[arg(long)]
    arch: Option<ArchArg>,

    /// Output format
    #[arg(short, long, default_value = "human")]
    format: OutputFormat,

    /// Add missing executable bits on native/script candidates
    #[arg(long)]
    fix_permissions: bool,

    /// With --fix-permissions, report changes without applying them
    #[arg(long)]
    dry_run: bool,

    /// Print sniffing statistics
    #[arg(long)]
    stats: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Operating system filter options.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OsArg {
    Linux,
    Windows,
    Darwin,
}

impl From<OsArg> for Os {
    fn from(value: OsArg) -> Self {
        match value {
            OsArg::Linux => Os::Linux,
            OsArg::Windows => Os::Windows,
            OsArg::Darwin => Os::Darwin,
        }
    }
}

/// Architecture filter options.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ArchArg {
    #[value(name = "386")]
    I386,
    Amd64,
}

impl From<ArchArg> for Arch {
    fn from(value: ArchArg) -> Self {
        match value {
            ArchArg::I386 => Arch::I386,
            ArchArg::Amd64 => Arch::Amd64,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("launch_classifier=debug")
            .init();
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> launch_classifier::Result<()> {
    let mut stats = VerdictStats::default();
    let params = ConfigureParams {
        filter: None,
        stats: args.stats.then_some(&mut stats),
    };

    let verdict = configure(&args.path, params)?;

    let mut verdict = if args.os.is_some() || args.arch.is_some() {
        verdict.filter(FilterParams {
            os: args.os.map(Os::from),
            arch: args.arch.map(Arch::from),
        })
    } else {
        verdict
    };

    let fixed = if args.fix_permissions {
        fix_permissions(
            &mut verdict,
            FixPermissionsParams {
                dry_run: args.dry_run,
            },
        )?
    } else {
        Vec::new()
    };

    match args.format {
        OutputFormat::Human => print_human(&verdict, &fixed, args.stats.then_some(&stats)),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&verdict).expect("verdict serializes")
            );
        }
    }

    Ok(())
}

fn print_human(verdict: &Verdict, fixed: &[String], stats: Option<&VerdictStats>) {
    println!("{}:", verdict.base_path.display());
    println!("  total size: {} bytes", verdict.total_size);

    if verdict.candidates.is_empty() {
        println!("  no launch candidates");
    }
    for (i, c) in verdict.candidates.iter().enumerate() {
        print!("  #{} {}", i + 1, c);
        if c.size > 0 {
            print!(" ({} bytes)", c.size);
        }
        println!();
    }

    for path in fixed {
        println!("  fixed permissions: {path}");
    }

    if let Some(stats) = stats {
        println!("  sniffs: {}", stats.num_sniffs);
        let mut by_ext: Vec<_> = stats.sniffs_by_ext.iter().collect();
        by_ext.sort();
        for (ext, count) in by_ext {
            let label = if ext.is_empty() { "(none)" } else { ext };
            println!("    {label}: {count}");
        }
    }
}
