use clap::Parser;
use listkeep::cli::commands::Cli;
use listkeep::cli::handlers;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        // No subcommand → launch TUI
        None => listkeep::tui::run(cli.data_dir.as_deref()),
        Some(_) => handlers::dispatch(cli),
    };
    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
