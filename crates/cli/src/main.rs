// RVOracle - RV32I Commit-Trace Verification Oracle
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::fmt::Write as _;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use rvoracle_core::image::ProgramImage;
use rvoracle_core::isa::DecodePolicy;
use rvoracle_core::sim::{run_image, SimOptions, StopReason};
use rvoracle_core::trace::{parse_trace, write_trace};
use rvoracle_verify::commit::parse_commit_jsonl;
use rvoracle_verify::decode_log::{check_fetch_log, DecodeCheckReport};
use rvoracle_verify::diff::{diff_commits, DiffReport, DEFAULT_RADIUS};
use rvoracle_verify::redirect::{check_redirect_log, RedirectReport, DEFAULT_MAX_LAT};

const EXIT_PASS: u8 = 0;
const EXIT_VERIFY_FAIL: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

const REPORT_SCHEMA_VERSION: &str = "1.0";

/// Step budget for golden trace generation. Directed tests are tiny,
/// but randomized programs can spin for a while before walking off the
/// end of the image.
const TRACE_DEFAULT_MAX_STEPS: u64 = 3_000_000;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Golden-model verification oracle for an RV32I core",
    long_about = None
)]
struct Cli {
    /// Enable debug-level execution tracing
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate golden commit traces for one or more program images.
    Trace(TraceArgs),

    /// Compare an RTL commit log (JSONL) against a golden trace.
    Diff(DiffArgs),

    /// Check RTL decoder fields against the golden decoder.
    CheckDecode(CheckDecodeArgs),

    /// Check that front-end redirects are honored within a bounded
    /// number of decoded micro-ops.
    CheckRedirect(CheckRedirectArgs),
}

#[derive(Parser, Debug)]
struct TraceArgs {
    /// Program images in hex format, one 32-bit word per line
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Directory for .truth traces and the index file
    #[arg(long, default_value = "golden_traces")]
    out_dir: PathBuf,

    /// Step budget per program
    #[arg(long, default_value_t = TRACE_DEFAULT_MAX_STEPS)]
    max_steps: u64,

    /// Reject image words that do not decode as RV32I instead of
    /// treating them as inert data
    #[arg(long)]
    strict_decode: bool,

    /// Write a JSON generation report to this path
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct DiffArgs {
    /// Golden commit trace (.truth)
    #[arg(long)]
    gold: PathBuf,

    /// RTL commit log (JSONL)
    #[arg(long)]
    rtl: PathBuf,

    /// Context rows shown around a divergence
    #[arg(long, default_value_t = DEFAULT_RADIUS)]
    radius: usize,

    /// Write the full report as JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CheckDecodeArgs {
    /// Program image the decode log was captured against
    #[arg(long)]
    image: PathBuf,

    /// Decoder log with PC=/op=/rs1=/rs2=/rd=/imm= lines
    #[arg(long)]
    log: PathBuf,

    /// Write the full report as JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CheckRedirectArgs {
    /// Decoder log to scan for REDIRECT events
    #[arg(long)]
    log: PathBuf,

    /// Wrong-path micro-ops tolerated after a redirect
    #[arg(long, default_value_t = DEFAULT_MAX_LAT)]
    max_lat: u32,

    /// Write the full report as JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct TraceReport {
    report_schema_version: String,
    tool: String,
    max_steps: u64,
    programs: Vec<ProgramReport>,
}

#[derive(Debug, Serialize)]
struct ProgramReport {
    name: String,
    trace_file: String,
    image_sha256: String,
    commits: usize,
    steps: u64,
    stop: StopReason,
    final_x31: u32,
}

#[derive(Debug, Serialize)]
struct DiffReportFile {
    report_schema_version: String,
    tool: String,
    gold: PathBuf,
    rtl: PathBuf,
    gold_sha256: String,
    rtl_sha256: String,
    report: DiffReport,
}

#[derive(Debug, Serialize)]
struct DecodeReportFile {
    report_schema_version: String,
    tool: String,
    image: PathBuf,
    log: PathBuf,
    image_sha256: String,
    report: DecodeCheckReport,
}

#[derive(Debug, Serialize)]
struct RedirectReportFile {
    report_schema_version: String,
    tool: String,
    log: PathBuf,
    report: RedirectReport,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    match cli.command {
        Commands::Trace(args) => run_trace(args),
        Commands::Diff(args) => run_diff(args),
        Commands::CheckDecode(args) => run_check_decode(args),
        Commands::CheckRedirect(args) => run_check_redirect(args),
    }
}

fn run_trace(args: TraceArgs) -> ExitCode {
    if let Err(e) = fs::create_dir_all(&args.out_dir) {
        error!("Failed to create output directory {:?}: {}", args.out_dir, e);
        return ExitCode::from(EXIT_RUNTIME_ERROR);
    }

    let opts = SimOptions {
        max_steps: args.max_steps,
        decode_policy: if args.strict_decode {
            DecodePolicy::Strict
        } else {
            DecodePolicy::Lenient
        },
        ..SimOptions::default()
    };

    let mut programs = Vec::new();
    for path in &args.images {
        let (text, image) = match load_image(path) {
            Ok(v) => v,
            Err(e) => {
                error!("{:#}", e);
                return ExitCode::from(EXIT_CONFIG_ERROR);
            }
        };

        let result = match run_image(&image, &opts) {
            Ok(r) => r,
            Err(e) => {
                error!("Golden run of {:?} failed: {}", path, e);
                return ExitCode::from(EXIT_RUNTIME_ERROR);
            }
        };

        let name = program_name(path);
        let trace_file = format!("{}.truth", name);
        let trace_path = args.out_dir.join(&trace_file);
        let file = match fs::File::create(&trace_path) {
            Ok(f) => f,
            Err(e) => {
                error!("Failed to create {:?}: {}", trace_path, e);
                return ExitCode::from(EXIT_RUNTIME_ERROR);
            }
        };
        if let Err(e) = write_trace(BufWriter::new(file), &result.trace) {
            error!("Failed to write {:?}: {}", trace_path, e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }

        info!(
            "{}: {} commits in {} steps, stop={:?}, final x31={:#010x}",
            name,
            result.trace.len(),
            result.steps,
            result.stop,
            result.regs[31]
        );

        programs.push(ProgramReport {
            name,
            trace_file,
            image_sha256: sha256_hex(text.as_bytes()),
            commits: result.trace.len(),
            steps: result.steps,
            stop: result.stop,
            final_x31: result.regs[31],
        });
    }

    let mut index = String::new();
    let _ = writeln!(index, "# max_steps={}", args.max_steps);
    let _ = writeln!(index, "# name  trace_file  final_x31");
    for p in &programs {
        let _ = writeln!(index, "{}  {}  0x{:08x}", p.name, p.trace_file, p.final_x31);
    }
    let index_path = args.out_dir.join("index.txt");
    if let Err(e) = fs::write(&index_path, index) {
        error!("Failed to write {:?}: {}", index_path, e);
        return ExitCode::from(EXIT_RUNTIME_ERROR);
    }

    if let Some(json_path) = &args.json {
        let report = TraceReport {
            report_schema_version: REPORT_SCHEMA_VERSION.to_string(),
            tool: String::from("trace"),
            max_steps: args.max_steps,
            programs,
        };
        if !write_json_report(json_path, &report) {
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    }

    ExitCode::from(EXIT_PASS)
}

fn run_diff(args: DiffArgs) -> ExitCode {
    let gold_text = match read_text(&args.gold, "golden trace") {
        Ok(t) => t,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    let golden = parse_trace(&gold_text);
    if golden.is_empty() {
        warn!("No commits parsed from golden trace {:?}", args.gold);
    }

    let rtl_text = match read_text(&args.rtl, "RTL commit log") {
        Ok(t) => t,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    let log = parse_commit_jsonl(&rtl_text);

    let report = diff_commits(&golden, &log, args.radius);
    print!("{}", report.render());

    if let Some(json_path) = &args.json {
        let file_report = DiffReportFile {
            report_schema_version: REPORT_SCHEMA_VERSION.to_string(),
            tool: String::from("diff"),
            gold: args.gold.clone(),
            rtl: args.rtl.clone(),
            gold_sha256: sha256_hex(gold_text.as_bytes()),
            rtl_sha256: sha256_hex(rtl_text.as_bytes()),
            report: report.clone(),
        };
        if !write_json_report(json_path, &file_report) {
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    }

    verdict_exit(report.passed())
}

fn run_check_decode(args: CheckDecodeArgs) -> ExitCode {
    let (image_text, image) = match load_image(&args.image) {
        Ok(v) => v,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    let log_text = match read_text(&args.log, "decode log") {
        Ok(t) => t,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let report = check_fetch_log(&image, &log_text);
    print!("{}", report.render());

    if let Some(json_path) = &args.json {
        let file_report = DecodeReportFile {
            report_schema_version: REPORT_SCHEMA_VERSION.to_string(),
            tool: String::from("check-decode"),
            image: args.image.clone(),
            log: args.log.clone(),
            image_sha256: sha256_hex(image_text.as_bytes()),
            report: report.clone(),
        };
        if !write_json_report(json_path, &file_report) {
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    }

    verdict_exit(report.passed())
}

fn run_check_redirect(args: CheckRedirectArgs) -> ExitCode {
    let log_text = match read_text(&args.log, "decode log") {
        Ok(t) => t,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let report = match check_redirect_log(&log_text, args.max_lat) {
        Ok(r) => r,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    println!("{}", report.render());

    if let Some(json_path) = &args.json {
        let file_report = RedirectReportFile {
            report_schema_version: REPORT_SCHEMA_VERSION.to_string(),
            tool: String::from("check-redirect"),
            log: args.log.clone(),
            report: report.clone(),
        };
        if !write_json_report(json_path, &file_report) {
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    }

    verdict_exit(report.passed())
}

fn load_image(path: &Path) -> anyhow::Result<(String, ProgramImage)> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read image {:?}", path))?;
    let image = ProgramImage::parse_hex(&text)
        .with_context(|| format!("Failed to parse image {:?}", path))?;
    Ok((text, image))
}

fn read_text(path: &Path, what: &str) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {} {:?}", what, path))
}

fn program_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("program"))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn write_json_report<T: Serialize>(path: &Path, report: &T) -> bool {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create report dir {:?}: {}", parent, e);
                return false;
            }
        }
    }
    match fs::File::create(path) {
        Ok(f) => match serde_json::to_writer_pretty(f, report) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to write report {:?}: {}", path, e);
                false
            }
        },
        Err(e) => {
            error!("Failed to create report {:?}: {}", path, e);
            false
        }
    }
}

fn verdict_exit(passed: bool) -> ExitCode {
    if passed {
        ExitCode::from(EXIT_PASS)
    } else {
        ExitCode::from(EXIT_VERIFY_FAIL)
    }
}
