use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::ast_printer::AstPrinter;
use rox::error::{LoxError, EXIT_IO, EXIT_STATIC};
use rox::interpreter::DEFAULT_MAX_CALL_DEPTH;
use rox::scanner::Scanner;
use rox::session::{self, Session};
use rox::token::Token;

/// Exit status for command‑line usage errors.
const EXIT_USAGE: i32 = 64;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,

    /// Write the log somewhere other than app.log
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Nested calls allowed before reporting a stack overflow
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print the tokens as a JSON array instead
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a Lox program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive prompt
    Repl,
}

/// A script file mapped into memory.  Empty files cannot be mapped and read
/// as empty source.
struct SourceFile {
    map: Option<Mmap>,
}

impl SourceFile {
    fn open(filename: &Path) -> Result<Self> {
        info!("Reading file: {:?}", filename);

        let file = File::open(filename).with_context(|| format!("Failed to open file {:?}", filename))?;
        let len = file
            .metadata()
            .with_context(|| format!("Failed to stat file {:?}", filename))?
            .len();

        if len == 0 {
            return Ok(Self { map: None });
        }

        // SAFETY: assumes nothing truncates or rewrites the script while it
        // runs.  The map is read-only but another process could still change
        // the file underneath it.
        let map = unsafe { Mmap::map(&file) }.with_context(|| format!("Failed to map file {:?}", filename))?;

        info!("Mapped {} bytes from {:?}", map.len(), filename);

        Ok(Self { map: Some(map) })
    }

    fn text(&self) -> std::result::Result<&str, LoxError> {
        match &self.map {
            Some(map) => Ok(std::str::from_utf8(map)?),
            None => Ok(""),
        }
    }
}

fn init_logger(path: &Path) -> Result<()> {
    // Create or open the log file
    let log_file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;

    // Configure env_logger to write to file with statement number and source line
    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

/// Reports `err` on stderr and ends the process with its exit status.
fn fail(err: LoxError) -> ! {
    debug!("Exiting after error: {:?}", err);
    eprintln!("{}", err);
    process::exit(err.exit_code());
}

fn require_file(filename: Option<PathBuf>) -> PathBuf {
    match filename {
        Some(filename) => filename,
        None => {
            info!("No filepath provided");
            eprintln!("No input filepath was provided.");
            process::exit(EXIT_USAGE);
        }
    }
}

fn open_source(filename: Option<PathBuf>) -> SourceFile {
    let filename = require_file(filename);

    match SourceFile::open(&filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{:#}", e);
            process::exit(EXIT_IO);
        }
    }
}

fn tokenize(text: &str, json: bool) -> Result<()> {
    info!("Running Tokenize subcommand");

    let mut tokens: Vec<Token> = Vec::new();
    let mut tokenized = true;

    for token in Scanner::new(text) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                if !json {
                    println!("{}", token);
                }
                tokens.push(token);
            }

            Err(e) => {
                tokenized = false;

                debug!("Tokenization debug: {}", e);

                eprintln!("{}", e);
            }
        }
    }

    if json {
        let rendered = serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?;
        println!("{}", rendered);
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code 65");

        process::exit(EXIT_STATIC);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(text: &str) {
    info!("Running Parse subcommand");

    let rendered = match session::parse_program(text) {
        Ok(statements) => AstPrinter::print_program(&statements),
        Err(program_error) => match session::parse_expression(text) {
            Ok(expr) => AstPrinter::print(&expr),
            Err(_) => fail(program_error),
        },
    };

    debug!("AST: {}", rendered);
    println!("{}", rendered);

    info!("Parse subcommand completed");
}

fn repl(session: &mut Session) -> Result<()> {
    info!("Starting REPL");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        print!("> ");
        stdout.flush().context("Failed to flush prompt")?;

        line.clear();
        let read = stdin.lock().read_line(&mut line).context("Failed to read from stdin")?;

        if read == 0 {
            println!();
            break;
        }

        if line.trim().is_empty() {
            continue;
        }

        match session.eval_line(&line) {
            Ok(Some(value)) => println!("{}", value),
            Ok(None) => {}
            Err(e) if e.is_fatal() => fail(e),
            Err(e) => eprintln!("{}", e),
        }
    }

    info!("REPL finished");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        let path = args.log_file.clone().unwrap_or_else(|| PathBuf::from("app.log"));
        init_logger(&path)?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let mut session = Session::new();
    session.set_max_call_depth(args.max_call_depth);

    match args.commands {
        Commands::Tokenize { filename, json } => {
            let source = open_source(filename);
            let text = source.text().unwrap_or_else(|e| fail(e));
            tokenize(text, json)?;
        }

        Commands::Parse { filename } => {
            let source = open_source(filename);
            let text = source.text().unwrap_or_else(|e| fail(e));
            parse(text);
        }

        Commands::Evaluate { filename } => {
            info!("Running Evaluate subcommand");

            let source = open_source(filename);
            let text = source.text().unwrap_or_else(|e| fail(e));

            match session.evaluate(text) {
                Ok(value) => {
                    debug!("Evaluated to: {}", value);
                    println!("{}", value);
                }
                Err(e) => fail(e),
            }

            info!("Evaluate subcommand completed");
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");

            let source = open_source(filename);
            let text = source.text().unwrap_or_else(|e| fail(e));

            if let Err(e) = session.run(text) {
                fail(e);
            }

            info!("Program executed successfully");
        }

        Commands::Repl => repl(&mut session)?,
    }

    Ok(())
}
