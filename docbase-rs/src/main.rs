//! docbase CLI entry point.

use clap::Parser;
use docbase::cli::args::{Cli, Commands};
use docbase::cli::output::Output;
use docbase::cli::{check, create, document, relations, relocate, tree};
use docbase::config::Config;
use docbase::error::{DocError, ExitCode as DocExitCode};
use docbase::workspace::Workspace;
use std::process::ExitCode;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(code) => ExitCode::from(code.code() as u8),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {}", e);
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

/// Logs go to stderr so they never mix with command output.
fn init_tracing(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::ERROR
    } else {
        match cli.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(level)
        .init();
}

fn run(cli: &Cli) -> Result<DocExitCode, DocError> {
    let config = Config::load()?;
    let workspace = Workspace::open(config, cli.root.as_deref())?;
    let output = Output::new(cli.output_format(), cli.quiet);

    match &cli.command {
        Commands::Tree(args) => tree::tree(&workspace, args, &output)?,
        Commands::Dir(args) => tree::dir(&workspace, args, &output)?,
        Commands::Get(args) => document::get(&workspace, args, &output)?,
        Commands::Create(args) => create::run(&workspace, args, &output)?,
        Commands::Update(args) => document::update(&workspace, args, &output)?,
        Commands::Delete(args) => document::delete(&workspace, args, &output)?,
        Commands::Move(args) => relocate::move_document(&workspace, args, &output)?,
        Commands::Archive(args) => relocate::archive(&workspace, args, &output)?,
        Commands::Restore(args) => relocate::restore(&workspace, args, &output)?,
        Commands::Relations(args) => relations::run(&workspace, args, &output)?,
        Commands::Check(args) => return check::run(&workspace, args, &output),
    }

    Ok(DocExitCode::Success)
}
