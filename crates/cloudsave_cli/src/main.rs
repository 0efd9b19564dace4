//! CloudSave CLI
//!
//! Drives the client library against a reference service running in the
//! same process. Useful for trying out flows and for debugging.
//!
//! # Commands
//!
//! - `demo` - Profile and book flows end to end
//! - `profile` - Save and load the player name and alias
//! - `book` - Save, load and optionally delete a book record
//! - `files` - Upload, inspect, download and delete a local file

mod commands;

use clap::{Parser, Subcommand};
use cloudsave_client::{Severity, StatusLine, StatusReporter};
use commands::book::BookArgs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// CloudSave command-line tools.
#[derive(Parser)]
#[command(name = "cloudsave")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project id to sign in to
    #[arg(global = true, short, long, default_value = "cloudsave-demo")]
    project: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the profile and book flows with sample data
    Demo,

    /// Save and load the player profile
    Profile {
        /// Player name to save
        #[arg(short, long)]
        name: Option<String>,

        /// Player alias to save
        #[arg(short, long)]
        alias: Option<String>,
    },

    /// Save and load a book record
    Book {
        /// Record id
        #[arg(short, long)]
        id: String,

        /// Book title
        #[arg(short, long, default_value = "")]
        title: String,

        /// ISBN
        #[arg(long, default_value = "")]
        isbn: String,

        /// Author, repeat for several
        #[arg(short, long = "author")]
        authors: Vec<String>,

        /// Delete the record after reading it back
        #[arg(short, long)]
        delete: bool,
    },

    /// Round-trip a local file through blob storage
    Files {
        /// File to upload
        #[arg(short, long)]
        input: PathBuf,

        /// Remote file name, defaults to the input's name
        #[arg(short, long)]
        key: Option<String>,

        /// Where to write the downloaded copy
        #[arg(short, long)]
        output: PathBuf,

        /// Keep the remote copy
        #[arg(long)]
        keep: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("CloudSave CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("Protocol v{}", cloudsave_client::PROTOCOL_VERSION);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli))?;
    Ok(())
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let reporter = StatusReporter::new("cli", print_line);
    let cloud = commands::local_cloud(&cli.project);
    commands::connect(&cloud, &reporter).await?;

    match cli.command {
        Commands::Demo => {
            let profile = commands::profile::run(
                &cloud,
                &reporter,
                Some("Paul Atreides".into()),
                Some("Muad'Dib".into()),
            )
            .await?;
            println!("{} ({})", profile.name, profile.alias);

            let dune = BookArgs {
                id: "42".into(),
                title: "Dune".into(),
                isbn: "0441013597".into(),
                authors: vec!["Frank Herbert".into()],
                delete: true,
            };
            commands::book::run(&cloud, &reporter, dune).await?;
        }
        Commands::Profile { name, alias } => {
            let profile = commands::profile::run(&cloud, &reporter, name, alias).await?;
            println!("{} ({})", profile.name, profile.alias);
        }
        Commands::Book {
            id,
            title,
            isbn,
            authors,
            delete,
        } => {
            let args = BookArgs {
                id,
                title,
                isbn,
                authors,
                delete,
            };
            commands::book::run(&cloud, &reporter, args).await?;
        }
        Commands::Files {
            input,
            key,
            output,
            keep,
        } => {
            commands::files::roundtrip(&cloud, &reporter, &input, key.as_deref(), &output, keep)
                .await?;
        }
        Commands::Version => {}
    }
    Ok(())
}

fn print_line(line: &StatusLine) {
    match line.severity {
        Severity::Info => println!("{}", line),
        Severity::Error => eprintln!("error: {}", line),
    }
}
