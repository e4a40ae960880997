
//! Command line calculator. Reads one statement per line from stdin
//! or from a script file, and prints each result or error.

use unitcalc::Session;
use unitcalc::catalog::defaults::default_catalog;
use unitcalc::config::Settings;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "unitcalc")]
#[clap(about = "A unit-aware calculator")]
struct Args {
  /// JSON settings file
  #[clap(short, long)]
  config: Option<PathBuf>,

  /// Report errors in full detail and log every evaluation step
  #[clap(long)]
  trace: bool,

  /// Script to run instead of reading from stdin
  script: Option<PathBuf>,
}

fn main() -> Result<()> {
  let args = Args::parse();

  let default_filter = if args.trace { "warn,unitcalc=debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
    .with_writer(io::stderr)
    .init();

  let mut settings = match &args.config {
    Some(path) => Settings::from_path(path)
      .with_context(|| format!("loading settings from {}", path.display()))?,
    None => Settings::default(),
  };
  settings.trace |= args.trace;

  let mut session = Session::with_settings(default_catalog(), settings);
  match &args.script {
    Some(path) => {
      let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
      run_lines(&mut session, BufReader::new(file), false)
    }
    None => run_lines(&mut session, io::stdin().lock(), true),
  }
}

fn run_lines(session: &mut Session, input: impl BufRead, interactive: bool) -> Result<()> {
  let mut stdout = io::stdout();
  if interactive {
    write!(stdout, "> ")?;
    stdout.flush()?;
  }
  for line in input.lines() {
    let line = line?;
    let statement = line.trim();
    if !statement.is_empty() && !statement.starts_with('#') {
      match session.run(statement) {
        Ok(value) => writeln!(stdout, "{}", session.render(&value))?,
        Err(err) if session.settings().trace => eprintln!("error: {err:?}"),
        Err(err) => eprintln!("error: {err}"),
      }
    }
    if interactive {
      write!(stdout, "> ")?;
      stdout.flush()?;
    }
  }
  Ok(())
}
