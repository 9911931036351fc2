pub mod cli;

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

fn main() {
    let command_line_interface = cli::CommandLineInterface::load();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&command_line_interface.log_level))
        .unwrap_or_else(|_| EnvFilter::new(cli::DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = command_line_interface.run() {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}
