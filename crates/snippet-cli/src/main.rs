//! snippetc: compile JSX/TypeScript snippets to runnable JavaScript.

mod cli;
mod config;
mod logging;
mod orchestrator;
mod output;

use clap::Parser;
use cli::Args;
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose, args.log_json);

    match orchestrator::run(args).await {
        Ok(summary) => {
            if summary.error_count > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
