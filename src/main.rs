use clap::{Parser as ClapParser, Subcommand};
use sprig_lang::cli::{self, CliError, EvalOptions};
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "sprig")]
#[command(about = "Sprig - an expression language for computed properties, validation and templates over entity data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression against a JSON document
    Eval {
        /// The expression to evaluate (with or without ${...})
        expression: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Exchange directory for the sandboxed file functions
        #[arg(long)]
        exchange_dir: Option<PathBuf>,
    },

    /// List all built-in functions with their usage
    Docs,

    /// Show the usage of a single built-in function
    Doc {
        /// Function name (use 'sprig docs' to list all)
        name: String,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval {
            expression,
            input,
            pretty,
            exchange_dir,
        } => run_eval(expression, input, pretty, exchange_dir),
        Commands::Docs => {
            print!("{}", cli::docs_overview());
            Ok(())
        }
        Commands::Doc { name } => match cli::doc_for(&name) {
            Ok(content) => {
                print!("{}", content);
                Ok(())
            }
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_eval(
    expression: String,
    input: Option<String>,
    pretty: bool,
    exchange_dir: Option<PathBuf>,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(CliError::Io)?;
            Some(buffer)
        }
        None => None,
    };

    let options = EvalOptions {
        expression,
        input,
        pretty,
        exchange_dir,
    };

    let report = cli::execute_eval(&options)?;
    if !report.printed.is_empty() {
        print!("{}", report.printed);
        if !report.printed.ends_with('\n') {
            println!();
        }
    }
    println!("{}", report.rendered);
    Ok(())
}
