use agenda::cli::commands::Cli;
use agenda::cli::handlers;
use agenda::logging;
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.log_json, logging::level_for_verbosity(cli.verbose));

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
