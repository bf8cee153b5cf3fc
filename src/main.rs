//! Mica compiler CLI
//!
//! Usage: micac <build|run|check> <input.mica> [options]

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use mica::{BytecodeModule, CompileFailure, CompileOptions, Compilation, Driver};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "micac")]
#[command(version)]
#[command(about = "Mica compiler - build, run and check Mica programs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print the bytecode listing after compiling
    #[arg(long, global = true, default_value_t = false)]
    dump_bytecode: bool,

    /// Raise the log level (-v info, -vv debug, -vvv trace); MICA_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true, default_value_t = false)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a program to a JSON bytecode artifact
    Build {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Artifact path (defaults to <input>.json)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Compile and execute a program, or execute a built artifact
    Run {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Read program input from this file instead of stdin
        #[arg(long, value_name = "FILE")]
        stdin_file: Option<PathBuf>,
    },

    /// Parse and analyze a program without generating code
    Check {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }
    init_tracing(cli.verbose);

    match &cli.command {
        Command::Build { input, output } => build(&cli, input, output.as_deref()),
        Command::Run { input, stdin_file } => run(&cli, input, stdin_file.as_deref()),
        Command::Check { input } => check(input),
    }
}

fn init_tracing(verbosity: u8) {
    let fallback = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("MICA_LOG").unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn build(cli: &Cli, input: &Path, output: Option<&Path>) -> ExitCode {
    let output = output.map_or_else(|| input.with_extension("json"), Path::to_path_buf);
    let driver = Driver::new(CompileOptions {
        output: Some(output.clone()),
        dump_bytecode: cli.dump_bytecode,
        ..CompileOptions::default()
    });

    match driver.compile_file(input) {
        Ok(compilation) => {
            print_listing(&compilation);
            println!(
                "{}: {} -> {}",
                "compiled".green().bold(),
                input.display(),
                output.display()
            );
            ExitCode::SUCCESS
        }
        Err(failure) => report(&failure),
    }
}

fn run(cli: &Cli, input: &Path, stdin_file: Option<&Path>) -> ExitCode {
    let driver = Driver::new(CompileOptions {
        dump_bytecode: cli.dump_bytecode,
        ..CompileOptions::default()
    });

    let module: BytecodeModule = if input.extension().is_some_and(|ext| ext == "json") {
        match driver.load_artifact(input) {
            Ok(module) => module,
            Err(failure) => return report(&failure),
        }
    } else {
        match driver.compile_file(input) {
            Ok(compilation) => {
                print_listing(&compilation);
                compilation.module
            }
            Err(failure) => return report(&failure),
        }
    };

    let stdin: Box<dyn BufRead> = match stdin_file {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(err) => {
                eprintln!(
                    "{}: could not open '{}': {}",
                    "error".red().bold(),
                    path.display(),
                    err
                );
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(io::stdin().lock()),
    };

    let execution = driver.run(&module, stdin);
    print!("{}", execution.stdout);
    match execution.error {
        None => ExitCode::SUCCESS,
        Some(err) => {
            eprintln!("{}: {}", "runtime error".red().bold(), err);
            ExitCode::from(u8::try_from(execution.exit_code).unwrap_or(1))
        }
    }
}

fn check(input: &Path) -> ExitCode {
    let source = match std::fs::read_to_string(input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!(
                "{}: could not read file '{}': {}",
                "error".red().bold(),
                input.display(),
                err
            );
            return ExitCode::FAILURE;
        }
    };

    match Driver::default().check_source(&source) {
        Ok(()) => {
            println!("{}: {}", "ok".green().bold(), input.display());
            ExitCode::SUCCESS
        }
        Err(failure) => report(&failure),
    }
}

fn print_listing(compilation: &Compilation) {
    if let Some(listing) = &compilation.listing {
        eprintln!("=== Bytecode ===");
        eprint!("{listing}");
        eprintln!();
    }
}

fn report(failure: &CompileFailure) -> ExitCode {
    eprintln!("{}", failure.render());
    let count = failure.diagnostics().map_or(1, |d| d.len());
    eprintln!(
        "\n{} generated",
        format!("{} error{}", count, if count == 1 { "" } else { "s" })
            .red()
            .bold()
    );
    ExitCode::FAILURE
}
