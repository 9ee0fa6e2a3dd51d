mod config;
mod test_runner;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::{debug, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const SUBCOMMANDS: &[&str] = &["build", "fmt", "test", "help"];

/// Environment variable holding the log filter, e.g. `BTML_LOG=debug`.
const LOG_ENV: &str = "BTML_LOG";

#[derive(Parser)]
#[command(name = "btml", version, about = "BTML to HTML compiler")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a BTML file to HTML
    Build(BuildArgs),

    /// Print a BTML file in canonical form
    Fmt(FmtArgs),

    /// Run .test.btml fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct BuildArgs {
    /// BTML source file
    file: PathBuf,

    /// Write HTML here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Indent nested elements, one per line
    #[arg(long)]
    pretty: bool,

    /// Spaces per nesting level in pretty output
    #[arg(long)]
    indent: Option<u8>,

    /// TOML file with a [render] table
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Parse only, don't render (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Dump parsed AST
    #[arg(long)]
    ast: bool,

    /// Fail when the parser reports warnings
    #[arg(long)]
    deny_warnings: bool,
}

#[derive(clap::Args)]
struct FmtArgs {
    /// BTML source file
    file: PathBuf,

    /// Rewrite the file in place
    #[arg(short, long)]
    write: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.btml file or a directory containing them
    path: PathBuf,

    /// Run only fixtures in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::OFF.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: logging disabled: {e}");
    }
}

fn main() {
    init_tracing();

    // `btml page.btml` is shorthand for `btml build page.btml`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().skip(1).position(|a| !a.starts_with('-')) {
        if !SUBCOMMANDS.contains(&args[pos + 1].as_str()) {
            args.insert(pos + 1, "build".to_string());
        }
    }
    trace!(?args, "starting cli");

    let cli = Cli::parse_from(&args);
    let color = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let result = match cli.command {
        Command::Build(build_args) => do_build(build_args, color),
        Command::Fmt(fmt_args) => do_fmt(fmt_args, color),
        Command::Test(test_args) => do_test(test_args, color),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1)
        }
    }
}

/// Source file registered with codespan, plus where to print diagnostics.
struct Session {
    files: SimpleFiles<String, String>,
    file_id: usize,
    writer: StandardStream,
    config: term::Config,
}

impl Session {
    fn open(path: &Path, color: ColorChoice) -> Result<(Self, String)> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("cannot read '{}'", path.display()))?;
        let mut files = SimpleFiles::new();
        let file_id = files.add(path.display().to_string(), source.clone());
        let session = Session {
            files,
            file_id,
            writer: StandardStream::stderr(color),
            config: term::Config::default(),
        };
        Ok((session, source))
    }

    fn emit(&self, diagnostic: &Diagnostic<usize>) {
        let _ = term::emit_to_write_style(
            &mut self.writer.lock(),
            &self.config,
            &self.files,
            diagnostic,
        );
    }

    /// Parse the session's source, printing every diagnostic. `None` means
    /// parsing failed and the error has been reported.
    fn parse(&self, source: String) -> Option<(btml::Document, Vec<btml::Warning>)> {
        let parser = btml::Parser::new(source, self.file_id);
        match parser.parse_with_warnings() {
            Ok((document, warnings)) => {
                for warning in &warnings {
                    self.emit(&warning.to_diagnostic());
                }
                Some((document, warnings))
            }
            Err(error) => {
                self.emit(&error.to_diagnostic());
                None
            }
        }
    }
}

fn do_build(args: BuildArgs, color: ColorChoice) -> Result<i32> {
    let render_config =
        config::resolve_render_config(args.config.as_deref(), args.pretty, args.indent)?;
    let (session, source) = Session::open(&args.file, color)?;

    let Some((document, warnings)) = session.parse(source) else {
        return Ok(1);
    };

    if args.deny_warnings && !warnings.is_empty() {
        eprintln!(
            "error: {} warning(s) reported and --deny-warnings is set",
            warnings.len()
        );
        return Ok(1);
    }

    if args.check {
        eprintln!("ok: {} parsed successfully", args.file.display());
        return Ok(0);
    }

    if args.ast {
        println!("{:#?}", document);
        return Ok(0);
    }

    let html = transpiler::render(&document, &render_config);
    match &args.output {
        Some(path) => {
            fs::write(path, format!("{html}\n"))
                .with_context(|| format!("cannot write '{}'", path.display()))?;
            debug!(path = %path.display(), bytes = html.len(), "wrote html");
        }
        None => println!("{html}"),
    }
    Ok(0)
}

fn do_fmt(args: FmtArgs, color: ColorChoice) -> Result<i32> {
    let (session, source) = Session::open(&args.file, color)?;
    let Some((document, _)) = session.parse(source) else {
        return Ok(1);
    };

    let formatted = document.to_string();
    if args.write {
        fs::write(&args.file, &formatted)
            .with_context(|| format!("cannot write '{}'", args.file.display()))?;
    } else {
        print!("{formatted}");
    }
    Ok(0)
}

fn do_test(args: TestArgs, color: ColorChoice) -> Result<i32> {
    if args.list_categories {
        test_runner::list_categories(&args.path);
        return Ok(0);
    }
    test_runner::run_tests(&args.path, color, &args.category)
        .context("cannot write test report")
}
