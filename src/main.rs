use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use pagechain::{Catalog, EngineConfig, FileStore, MessageId, Output, Shell, ShellError, ShellResult};

const PROMPT: &str = "pagechain> ";

/// Key-value databases stored as linked pages in a message store
#[derive(Parser, Debug)]
#[command(name = "pagechain", version, about)]
struct Args {
    /// Directory holding the message files
    #[arg(long, value_name = "DIR", default_value = "pagechain-store")]
    store: PathBuf,

    /// Entry point id. A fresh entry point is created when omitted
    #[arg(long, value_name = "ID")]
    root: Option<MessageId>,

    /// JSON engine configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log engine debug messages
    #[arg(long)]
    debug: bool,

    /// Run a single command and exit
    #[arg(short = 'c', long)]
    command: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("pagechain=debug")
        } else {
            EnvFilter::new("pagechain=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

async fn run(args: Args) -> ShellResult<()> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path).map_err(pagechain::DatabaseError::from)?,
        None => EngineConfig::default(),
    };
    if args.debug {
        config = config.with_debug(true);
    }

    let store = FileStore::open(&args.store)
        .await
        .map_err(pagechain::DatabaseError::from)?;
    let catalog = match args.root {
        Some(root) => Catalog::open(store, root, config).await?,
        None => {
            let catalog = Catalog::create(store, config).await?;
            println!("Created entry point {}", catalog.root_id());
            catalog
        }
    };
    let mut shell = Shell::new(catalog);

    if let Some(line) = &args.command {
        let output = shell.execute(line).await?;
        println!("{}", output);
        return Ok(());
    }

    repl(&mut shell).await
}

async fn repl(shell: &mut Shell<FileStore>) -> ShellResult<()> {
    let mut editor = DefaultEditor::new()?;
    println!("Type 'help' for commands, 'exit' to quit.");

    loop {
        let prompt = match shell.current() {
            Some(db) => format!("pagechain:{}> ", db),
            None => PROMPT.to_string(),
        };

        match editor.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);

                match shell.execute(line).await {
                    Ok(Output::Exit) => break,
                    Ok(output) => println!("{}", output),
                    Err(e) => report(&e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn report(error: &ShellError) {
    match error {
        ShellError::Database(e) => eprintln!("Error ({:?}): {}", e.kind(), e),
        e => eprintln!("Error: {}", e),
    }
}
