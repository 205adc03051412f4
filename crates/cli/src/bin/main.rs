use clap::Parser;
use sql_structure_cli::{run, Cli};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only the tree
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to set tracing subscriber: {}", e);
    }

    let cli = Cli::parse();
    let result = cli.read_input().and_then(|sql| run(&cli, &sql));

    match result {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
