use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast::{ExprId, Stmt};
use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::resolver::Resolver;
use rox::scanner::Scanner;
use rox::token::Token;

/// Exit code for lex, parse and resolution errors.
const EXIT_STATIC: i32 = 65;

/// Exit code for runtime errors.
const EXIT_RUNTIME: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Rox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print one JSON object per token
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a Rox program
    Run { filename: Option<PathBuf> },

    /// Reads and runs one line at a time from standard input
    Repl,
}

/// Reads the contents of a file into a Vec<u8>
fn read_file(filename: PathBuf) -> Result<Vec<u8>> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{} {}:{}] - {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Print a diagnostic and exit with the code matching its category.
fn fail(e: &LoxError) -> ! {
    debug!("Failing with: {:?}", e);
    eprintln!("{}", e);

    let code = if e.is_static() {
        EXIT_STATIC
    } else {
        EXIT_RUNTIME
    };

    std::process::exit(code);
}

fn no_input() -> ! {
    info!("No filepath provided");
    println!("No input filepath was provided. Exiting...");
    std::process::exit(0);
}

fn tokenize(buf: &[u8], json: bool) -> Result<()> {
    let mut tokenized = true;

    for token in Scanner::new(buf) {
        match token {
            Ok(token) if json => println!("{}", serde_json::to_string(&token)?),

            Ok(token) => println!("{}", token),

            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC);
        std::process::exit(EXIT_STATIC);
    }

    Ok(())
}

fn parse(buf: &[u8]) {
    let tokens = Scanner::new(buf).scan_all().unwrap_or_else(|e| fail(&e));
    let expr = Parser::new(&tokens)
        .parse_expression()
        .unwrap_or_else(|e| fail(&e));

    let ast_str = AstPrinter::print(&expr);

    debug!("AST: {}", ast_str);
    println!("{}", ast_str);
}

fn evaluate(buf: &[u8]) {
    let tokens = Scanner::new(buf).scan_all().unwrap_or_else(|e| fail(&e));
    let expr = Parser::new(&tokens)
        .parse_expression()
        .unwrap_or_else(|e| fail(&e));

    let mut interpreter = Interpreter::new();

    match interpreter.evaluate(&expr) {
        Ok(value) => println!("{}", value),
        Err(e) => fail(&e),
    }
}

/// Scan, parse, resolve and run a whole program.  Nothing runs unless the
/// program is free of static errors.
fn run_program(buf: &[u8]) -> std::result::Result<(), LoxError> {
    let tokens = Scanner::new(buf).scan_all()?;
    let statements = Parser::new(&tokens).parse()?;
    let locals = Resolver::new().resolve(&statements)?;

    info!("Program resolved, {} statements", statements.len());

    let mut interpreter = Interpreter::new();
    interpreter.resolve(locals);
    interpreter.interpret(&statements)
}

/// Interactive session.  Each line is a batch: static errors reject the line,
/// runtime errors abort it, and globals survive either way.
fn repl() -> Result<()> {
    let stdin = io::stdin();
    let mut interpreter: Interpreter<'static> = Interpreter::new();
    let mut next_id = ExprId(0);

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        // Functions declared on this line may be called from later lines, so
        // its source and tree stay alive for the rest of the session.
        let source: &'static str = Box::leak(line.into_boxed_str());

        let tokens: &'static [Token<'static>] = match Scanner::new(source.as_bytes()).scan_all() {
            Ok(tokens) => Box::leak(tokens.into_boxed_slice()),
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        let mut parser = Parser::new(tokens).starting_at(next_id);
        let parsed = parser.parse();
        next_id = parser.next_expr_id();

        let statements: &'static [Stmt<'static>] = match parsed {
            Ok(statements) => Box::leak(statements.into_boxed_slice()),
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match Resolver::new().resolve(statements) {
            Ok(locals) => interpreter.resolve(locals),
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        }

        if let Err(e) = interpreter.interpret(statements) {
            eprintln!("{}", e);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => {
            let buf = read_file(filename.unwrap_or_else(|| no_input()))?;
            tokenize(&buf, json)?;
        }

        Commands::Parse { filename } => {
            let buf = read_file(filename.unwrap_or_else(|| no_input()))?;
            parse(&buf);
        }

        Commands::Evaluate { filename } => {
            let buf = read_file(filename.unwrap_or_else(|| no_input()))?;
            evaluate(&buf);
        }

        Commands::Run { filename } => {
            let buf = read_file(filename.unwrap_or_else(|| no_input()))?;

            info!("Provided input:\n {}", String::from_utf8_lossy(&buf));

            if let Err(e) = run_program(&buf) {
                fail(&e);
            }

            info!("Program executed successfully");
        }

        Commands::Repl => repl()?,
    }

    Ok(())
}
