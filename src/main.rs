//! Cimentar CLI — host provisioning for the Code Execution API.

use clap::Parser;

fn main() {
    let cli = cimentar::cli::Cli::parse();
    if let Err(e) = cimentar::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
