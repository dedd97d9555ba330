use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use aq::ast_printer::AstPrinter;
use aq::error::RunError;
use aq::parser::Parser;
use aq::runner::{repl, Aq};
use aq::scanner::{scan, Scanner};

/// Malformed command line.
const EXIT_USAGE: u8 = 64;

/// Static (lexical, syntax, resolution) errors.
const EXIT_COMPILE_ERROR: u8 = 65;

/// Runtime errors.
const EXIT_RUNTIME_ERROR: u8 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "aq language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to aq.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints its AST
    Parse { filename: PathBuf },

    /// Runs input from a file as an aq program
    Run { filename: PathBuf },

    /// Starts an interactive session reading one unit per line
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger(enabled: bool) -> Result<()> {
    if !enabled {
        // A minimal logger to avoid "no logger" errors
        Builder::new().filter_level(log::LevelFilter::Off).init();
        return Ok(());
    }

    let log_file = File::create("aq.log").context("Failed to create aq.log")?;

    // Write to file with module and source line, overridable with RUST_LOG
    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("aq::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to aq.log");
    Ok(())
}

fn tokenize(filename: &PathBuf, json: bool) -> Result<ExitCode> {
    let source = read_file(filename)?;

    if json {
        let (tokens, errors) = scan(&source);
        for e in &errors {
            eprintln!("{}", e);
        }
        println!("{}", serde_json::to_string_pretty(&tokens)?);

        return Ok(exit_status(errors.is_empty(), EXIT_COMPILE_ERROR));
    }

    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => println!("{}", token),
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    Ok(exit_status(tokenized, EXIT_COMPILE_ERROR))
}

fn parse(filename: &PathBuf) -> Result<ExitCode> {
    let source = read_file(filename)?;
    let (tokens, scan_errors) = scan(&source);

    for e in &scan_errors {
        eprintln!("{}", e);
    }

    match Parser::new(&tokens).parse() {
        Ok(statements) => {
            for stmt in &statements {
                println!("{}", AstPrinter::print_stmt(stmt));
            }

            Ok(exit_status(scan_errors.is_empty(), EXIT_COMPILE_ERROR))
        }
        // A bare expression such as `1 + 2` is not a program; print it as one.
        Err(errors) => match Parser::new(&tokens).parse_expression() {
            Ok(expr) => {
                println!("{}", AstPrinter::print_expr(&expr));

                Ok(exit_status(scan_errors.is_empty(), EXIT_COMPILE_ERROR))
            }
            Err(_) => {
                for e in &errors {
                    eprintln!("{}", e);
                }

                Ok(ExitCode::from(EXIT_COMPILE_ERROR))
            }
        },
    }
}

fn run(filename: &PathBuf) -> Result<ExitCode> {
    let source = read_file(filename)?;
    let mut session = Aq::new();

    match session.run(&source) {
        Ok(()) => {
            info!("Program executed successfully");
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            debug!("Run failed: {}", failure);

            for e in failure.diagnostics() {
                eprintln!("{}", e);
            }

            Ok(ExitCode::from(match failure {
                RunError::Compile(_) => EXIT_COMPILE_ERROR,
                RunError::Runtime(_) => EXIT_RUNTIME_ERROR,
            }))
        }
    }
}

fn exit_status(ok: bool, failure: u8) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(failure)
    }
}

fn main() -> Result<ExitCode> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // `--help` and `--version` also arrive here, on stdout.
            let code: u8 = if e.use_stderr() { EXIT_USAGE } else { 0 };
            e.print()?;

            return Ok(ExitCode::from(code));
        }
    };

    init_logger(args.log)?;

    info!("CLI arguments: {:?}", args);

    match &args.commands {
        Commands::Tokenize { filename, json } => tokenize(filename, *json),
        Commands::Parse { filename } => parse(filename),
        Commands::Run { filename } => run(filename),
        Commands::Repl => {
            let mut session = Aq::new();
            let stdin = io::stdin();

            repl(&mut session, stdin.lock(), io::stdout(), io::stderr())?;

            Ok(ExitCode::SUCCESS)
        }
    }
}
