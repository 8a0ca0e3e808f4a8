//! # CLI Module
//!
//! Argument definitions and the one-shot commands.
//!
//! Every `cmd_*` function writes to the given output instead of stdout so the
//! integration tests can capture it. File I/O for the mission log happens
//! here and in [`crate::shell`]; `c2c-core` only converts formats.

use crate::error::CliError;
use crate::shell::Shell;
use c2c_core::derive::segments;
use c2c_core::formats::{self, ExportBundle};
use c2c_core::{Command, DerivedCode, DeviceDescriptor, HistoryEntry, Session, SystemClock};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::fs::OpenOptions;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// =============================================================================
// ARGUMENTS
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "c2c")]
#[command(version, about = "C2C Decipher - protocol assistant and override tool")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Derive the unlock code for a device
    Derive(DeriveArgs),

    /// Validate a mission log file and list its entries
    Inspect {
        /// Path to the log file
        path: PathBuf,

        /// Print the normalized entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive session with its own mission log
    Shell(ShellArgs),
}

/// Descriptor fields. Omitted fields stay empty and the code stays pending.
#[derive(Debug, Clone, Args)]
pub struct DeriveArgs {
    /// Serial number (XXXX-XXXX)
    #[arg(long, default_value = "")]
    pub serial: String,

    /// Device name
    #[arg(long, default_value = "")]
    pub name: String,

    /// Device IP
    #[arg(long, default_value = "")]
    pub ip: String,

    /// Device model (XXX-XXX)
    #[arg(long, default_value = "")]
    pub model: String,

    /// Fabrication day (01-31)
    #[arg(long, default_value = "01")]
    pub day: String,

    /// Fabrication month (01-12)
    #[arg(long, default_value = "01")]
    pub month: String,

    /// Device latency in milliseconds
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub latency: String,

    /// Print a single JSON object instead of text
    #[arg(long)]
    pub json: bool,
}

impl DeriveArgs {
    /// The descriptor as typed, before normalization.
    pub fn descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor {
            serial_number: self.serial.clone(),
            device_name: self.name.clone(),
            device_ip: self.ip.clone(),
            device_model: self.model.clone(),
            fab_day: self.day.clone(),
            fab_month: self.month.clone(),
            latency: self.latency.clone(),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ShellArgs {
    /// Load this log file into the session before the first prompt
    #[arg(long)]
    pub import: Option<PathBuf>,

    /// Directory export files are written to
    #[arg(long, env = "C2C_EXPORT_DIR", default_value = ".")]
    pub export_dir: PathBuf,
}

/// Dispatch a parsed command line against the process's stdin and stdout.
pub fn run(cli: Cli) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Derive(args) => {
            cmd_derive(&args.descriptor(), args.json, &mut out)?;
        }
        Commands::Inspect { path, json } => {
            cmd_inspect(&path, json, &mut out)?;
        }
        Commands::Shell(args) => {
            let stdin = io::stdin();
            let prompt = stdin.is_terminal();
            cmd_shell(
                args.import.as_deref(),
                &args.export_dir,
                prompt,
                stdin.lock(),
                &mut out,
            )?;
        }
    }
    Ok(())
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Derive and print the code for one descriptor.
///
/// Serial number and model are uppercased first, as the form does.
pub fn cmd_derive<W: Write>(
    descriptor: &DeviceDescriptor,
    json: bool,
    out: &mut W,
) -> Result<DerivedCode, CliError> {
    let mut session: Session = Session::default();
    session.load(descriptor.clone());
    let code = session.recompute().clone();
    let descriptor = session.descriptor();

    for advisory in descriptor.advisories() {
        warn!(field = %advisory.field, "{advisory}");
    }
    debug!(code = %code, "derived");

    if json {
        let report = report_json(descriptor, &code);
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write_report(out, descriptor, &code)?;
    }
    Ok(code)
}

/// Validate a log file with import semantics and list its entries.
///
/// Nothing is modified; this is a dry run of an import.
pub fn cmd_inspect<W: Write>(path: &Path, json: bool, out: &mut W) -> Result<usize, CliError> {
    let raw = read_log_file(path)?;
    let entries = formats::import(&raw)?;
    info!(path = %path.display(), entries = entries.len(), "log file is valid");

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
    } else {
        write_entries(out, &entries)?;
    }
    Ok(entries.len())
}

/// Run an interactive session over `input`, optionally seeded from a log
/// file.
pub fn cmd_shell<R: BufRead, W: Write>(
    import: Option<&Path>,
    export_dir: &Path,
    prompt: bool,
    input: R,
    out: &mut W,
) -> Result<(), CliError> {
    let mut shell = Shell::new(Session::<SystemClock>::default(), export_dir).with_prompt(prompt);
    if let Some(path) = import {
        shell.import_file(path, out)?;
    }
    shell.run(input, out)
}

// =============================================================================
// FILE I/O
// =============================================================================

/// Read a log file as UTF-8 text.
pub fn read_log_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Write an export bundle into `dir` under its resolved file name.
///
/// An existing file is never overwritten.
pub fn write_export(dir: &Path, bundle: &ExportBundle) -> Result<PathBuf, CliError> {
    let path = dir.join(&bundle.file_name);
    let written = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .and_then(|mut file| file.write_all(&bundle.bytes));
    written.map_err(|source| CliError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

// =============================================================================
// OUTPUT
// =============================================================================

/// Human-readable report for a descriptor and its code.
pub fn write_report<W: Write>(
    out: &mut W,
    descriptor: &DeviceDescriptor,
    code: &DerivedCode,
) -> io::Result<()> {
    writeln!(out, "code: {code}")?;

    if let Ok(s) = segments(descriptor) {
        writeln!(out, "segments: AA={} BB={} CC={} DD={}", s.aa, s.bb, s.cc, s.dd)?;
    }

    let missing = descriptor.missing_fields();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|f| f.name()).collect();
        writeln!(out, "missing: {}", names.join(", "))?;
    }

    for advisory in descriptor.advisories() {
        writeln!(out, "note: {advisory}")?;
    }

    for command in Command::FORM {
        if let Some(text) = command.render(descriptor) {
            writeln!(out, "{text}")?;
        }
    }
    Ok(())
}

/// Machine-readable report for a descriptor and its code.
pub fn report_json(descriptor: &DeviceDescriptor, code: &DerivedCode) -> serde_json::Value {
    let status = match code {
        DerivedCode::Code(_) => "ready",
        DerivedCode::Pending => "pending",
        DerivedCode::Error => "error",
    };
    let segments = segments(descriptor)
        .ok()
        .map(|s| json!({ "aa": s.aa, "bb": s.bb, "cc": s.cc, "dd": s.dd }));
    let missing: Vec<&str> = descriptor.missing_fields().iter().map(|f| f.name()).collect();
    let advisories: Vec<String> = descriptor
        .advisories()
        .iter()
        .map(ToString::to_string)
        .collect();
    let commands: serde_json::Map<String, serde_json::Value> = Command::FORM
        .into_iter()
        .filter_map(|c| c.render(descriptor).map(|text| (c.to_string(), json!(text))))
        .collect();

    json!({
        "code": code.text(),
        "status": status,
        "segments": segments,
        "missing": missing,
        "advisories": advisories,
        "commands": commands,
    })
}

/// One line per entry, newest first.
pub fn write_entries<W: Write>(out: &mut W, entries: &[HistoryEntry]) -> io::Result<()> {
    match entries.len() {
        0 => writeln!(out, "no entries")?,
        1 => writeln!(out, "1 entry")?,
        n => writeln!(out, "{n} entries")?,
    }
    for entry in entries {
        writeln!(
            out,
            "{:<15} {:<21} {:<10} {:<16} {:<20} {}",
            entry.id,
            entry.timestamp,
            entry.password,
            entry.serial_number,
            entry.device_ip,
            entry.label
        )?;
    }
    Ok(())
}
