//! # Shell Module
//!
//! Line-oriented front end for one operator session.
//!
//! The shell plays the part of the form: it edits the descriptor, asks the
//! session to recompute after every edit, and turns save / delete / export /
//! import requests into session calls. Commands run one at a time, so at most
//! one import is ever in flight.

use crate::cli::{read_log_file, write_entries, write_export, write_report};
use crate::error::CliError;
use c2c_core::{Clock, Command, Field, Session};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const HELP: &str = "\
commands:
  set <field> [value]   edit a field (serial, name, ip, model, day, month, latency)
  show                  print the form, the code and the copyable commands
  save [label]          save the current code to the mission log
  log                   list the mission log, newest first
  rm <id>               delete a log entry
  copy <what>           print identify | scan | ping | code | override <id>
  export [name]         write the mission log to <name>.json
  import <path>         replace the mission log with a log file
  clear                 reset the form (the log is kept)
  help                  show this text
  quit                  leave the session";

/// What to do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Set { field: Field, value: String },
    Show,
    Save { label: String },
    Log,
    Remove { id: String },
    Copy(CopyTarget),
    Export { name: String },
    Import { path: PathBuf },
    Clear,
    Help,
    Quit,
}

/// What `copy` prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyTarget {
    /// A form command.
    Command(Command),
    /// `/override` for a saved entry.
    Override { id: String },
    /// The raw code.
    Code,
}

impl ShellCommand {
    /// Parse one input line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CliError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "set" => {
                let (field, value) = match rest.split_once(char::is_whitespace) {
                    Some((field, value)) => (field, value.trim()),
                    None => (rest, ""),
                };
                if field.is_empty() {
                    return Err(usage("set <field> [value]"));
                }
                ShellCommand::Set {
                    field: field.parse()?,
                    value: value.to_string(),
                }
            }
            "show" => ShellCommand::Show,
            "save" => ShellCommand::Save {
                label: rest.to_string(),
            },
            "log" | "ls" => ShellCommand::Log,
            "rm" | "delete" => {
                if rest.is_empty() {
                    return Err(usage("rm <id>"));
                }
                ShellCommand::Remove {
                    id: rest.to_string(),
                }
            }
            "copy" => ShellCommand::Copy(parse_copy_target(rest)?),
            "export" => ShellCommand::Export {
                name: rest.to_string(),
            },
            "import" => {
                if rest.is_empty() {
                    return Err(usage("import <path>"));
                }
                ShellCommand::Import {
                    path: PathBuf::from(rest),
                }
            }
            "clear" | "reset" => ShellCommand::Clear,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            other => {
                return Err(CliError::Usage(format!(
                    "unknown command `{other}` (type `help`)"
                )));
            }
        };
        Ok(Some(command))
    }
}

fn parse_copy_target(rest: &str) -> Result<CopyTarget, CliError> {
    let (what, arg) = match rest.split_once(char::is_whitespace) {
        Some((what, arg)) => (what, arg.trim()),
        None => (rest, ""),
    };
    match what.to_ascii_lowercase().as_str() {
        "code" | "password" => Ok(CopyTarget::Code),
        "override" if arg.is_empty() => Err(usage("copy override <id>")),
        "override" => Ok(CopyTarget::Override {
            id: arg.to_string(),
        }),
        "" => Err(usage("copy <identify|scan|ping|code|override <id>>")),
        other => Ok(CopyTarget::Command(other.parse::<Command>()?)),
    }
}

fn usage(text: &str) -> CliError {
    CliError::Usage(format!("usage: {text}"))
}

// =============================================================================
// SHELL
// =============================================================================

/// An interactive session bound to an export directory.
#[derive(Debug)]
pub struct Shell<C: Clock> {
    session: Session<C>,
    export_dir: PathBuf,
    prompt: bool,
}

impl<C: Clock> Shell<C> {
    /// Wrap a session. Exports are written into `export_dir`.
    pub fn new(session: Session<C>, export_dir: &Path) -> Self {
        Self {
            session,
            export_dir: export_dir.to_path_buf(),
            prompt: false,
        }
    }

    /// Print a prompt before each line (for terminals).
    #[must_use]
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    /// The session being driven.
    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    /// Read commands until end of input or `quit`.
    ///
    /// Command failures are printed and the session continues, including
    /// lines that are not valid UTF-8. Only a broken input or output stream
    /// ends it early.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, out: &mut W) -> Result<(), CliError> {
        if self.prompt {
            writeln!(out, "C2C Decipher - type `help` for commands")?;
        }

        let mut buffer = Vec::new();
        let mut number = 0usize;
        loop {
            if self.prompt {
                write!(out, "c2c> ")?;
                out.flush()?;
            }
            buffer.clear();
            if input.read_until(b'\n', &mut buffer).map_err(CliError::Input)? == 0 {
                break;
            }
            number += 1;

            let result = match std::str::from_utf8(&buffer) {
                Ok(line) => self.execute(line, out),
                Err(_) => Err(CliError::Encoding { line: number }),
            };
            match result {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    debug!(error = %err, line = number, "command failed");
                    writeln!(out, "error: {err}")?;
                }
            }
        }
        Ok(())
    }

    /// Parse and run a single line.
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow, CliError> {
        let Some(command) = ShellCommand::parse(line)? else {
            return Ok(Flow::Continue);
        };

        match command {
            ShellCommand::Set { field, value } => {
                self.session.set(field, &value);
                let code = self.session.recompute();
                writeln!(out, "code: {code}")?;
            }
            ShellCommand::Show => {
                write_report(out, self.session.descriptor(), self.session.code())?;
            }
            ShellCommand::Save { label } => match self.session.save(&label) {
                Some(entry) => {
                    info!(id = %entry.id, label = %entry.label, "entry saved");
                    writeln!(out, "saved {} ({})", entry.id, entry.label)?;
                }
                None => {
                    writeln!(out, "nothing saved: code is {}", self.session.code())?;
                }
            },
            ShellCommand::Log => {
                write_entries(out, self.session.log().snapshot())?;
            }
            ShellCommand::Remove { id } => {
                if self.session.remove(&id) {
                    info!(id = %id, "entry removed");
                    writeln!(out, "removed {id}")?;
                } else {
                    writeln!(out, "no entry with id {id}")?;
                }
            }
            ShellCommand::Copy(target) => {
                let text = self.copy_text(&target)?;
                writeln!(out, "{text}")?;
            }
            ShellCommand::Export { name } => {
                let path = self.export(&name)?;
                writeln!(
                    out,
                    "exported {} entries to {}",
                    self.session.log().len(),
                    path.display()
                )?;
            }
            ShellCommand::Import { path } => {
                self.import_file(&path, out)?;
            }
            ShellCommand::Clear => {
                self.session.clear();
                writeln!(out, "form cleared; code: {}", self.session.code())?;
            }
            ShellCommand::Help => {
                writeln!(out, "{HELP}")?;
            }
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Replace the log with a log file. On any failure the log is unchanged.
    pub fn import_file<W: Write>(&mut self, path: &Path, out: &mut W) -> Result<usize, CliError> {
        let raw = read_log_file(path)?;
        let replaced = self.session.log().len();
        let count = self.session.import(&raw).inspect_err(|err| {
            warn!(path = %path.display(), error = %err, "import rejected");
        })?;

        info!(path = %path.display(), entries = count, replaced, "mission log replaced");
        writeln!(
            out,
            "imported {count} entries from {} (replaced {replaced})",
            path.display()
        )?;
        Ok(count)
    }

    fn export(&self, name: &str) -> Result<PathBuf, CliError> {
        if self.session.log().is_empty() {
            return Err(CliError::EmptyLog);
        }
        let bundle = self.session.export(name)?;
        let path = write_export(&self.export_dir, &bundle)?;
        info!(path = %path.display(), entries = self.session.log().len(), "mission log exported");
        Ok(path)
    }

    fn copy_text(&self, target: &CopyTarget) -> Result<String, CliError> {
        match target {
            CopyTarget::Code => self
                .session
                .code()
                .as_code()
                .map(|code| code.to_string())
                .ok_or_else(|| CliError::NothingToCopy(format!("code is {}", self.session.code()))),
            CopyTarget::Command(command) => {
                command.render(self.session.descriptor()).ok_or_else(|| {
                    CliError::NothingToCopy(format!("{} is empty", command.source()))
                })
            }
            CopyTarget::Override { id } => self
                .session
                .log()
                .get(id)
                .map(Command::override_for)
                .ok_or_else(|| CliError::UnknownEntry(id.clone())),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_set_keeps_rest_of_line() {
        let parsed = ShellCommand::parse("set name Main Server 2");
        assert_eq!(
            parsed.ok().flatten(),
            Some(ShellCommand::Set {
                field: Field::DeviceName,
                value: "Main Server 2".to_string()
            })
        );
    }

    #[test]
    fn parse_set_without_value_clears() {
        let parsed = ShellCommand::parse("set latency");
        assert_eq!(
            parsed.ok().flatten(),
            Some(ShellCommand::Set {
                field: Field::Latency,
                value: String::new()
            })
        );
    }

    #[test]
    fn parse_ignores_blank_and_comment_lines() {
        assert!(matches!(ShellCommand::parse("   "), Ok(None)));
        assert!(matches!(ShellCommand::parse("# note"), Ok(None)));
    }

    #[test]
    fn parse_copy_targets() {
        assert_eq!(
            ShellCommand::parse("copy ping").ok().flatten(),
            Some(ShellCommand::Copy(CopyTarget::Command(Command::Ping)))
        );
        assert_eq!(
            ShellCommand::parse("copy code").ok().flatten(),
            Some(ShellCommand::Copy(CopyTarget::Code))
        );
        assert_eq!(
            ShellCommand::parse("copy override 42").ok().flatten(),
            Some(ShellCommand::Copy(CopyTarget::Override {
                id: "42".to_string()
            }))
        );
        assert!(ShellCommand::parse("copy override").is_err());
        assert!(matches!(
            ShellCommand::parse("copy nonsense"),
            Err(CliError::Command(_))
        ));
    }

    #[test]
    fn parse_rejects_unknown_verbs_and_fields() {
        assert!(matches!(
            ShellCommand::parse("launch"),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            ShellCommand::parse("set colour red"),
            Err(CliError::Field(_))
        ));
        assert!(matches!(ShellCommand::parse("rm"), Err(CliError::Usage(_))));
    }

    #[test]
    fn only_stream_errors_are_fatal() {
        let broken = CliError::Output(std::io::Error::other("pipe closed"));
        assert!(broken.is_fatal());
        assert!(CliError::Input(std::io::Error::other("tty gone")).is_fatal());
        assert!(!CliError::Encoding { line: 2 }.is_fatal());
        assert!(!CliError::EmptyLog.is_fatal());
    }
}
