pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "clientele",
    about = "Clientele operator CLI",
    long_about = "Operate the Clientele customer store from the command line.",
    after_help = "Examples:\n  clientele migrate --to 20250101000001\n  clientele rollback --to 20250101000001\n  clientele customers search --prefix Клиент,Другой"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate {
        #[arg(long, value_name = "VERSION", help = "Stop after applying VERSION")]
        to: Option<i64>,
    },
    #[command(about = "Revert the newest applied migration, or every migration above --to")]
    Rollback {
        #[arg(long, value_name = "VERSION", help = "Keep migrations up to and including VERSION (0 reverts all)")]
        to: Option<i64>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(subcommand, about = "Search or delete customers by first-name prefix")]
    Customers(CustomersCommand),
}

#[derive(Debug, Subcommand)]
enum CustomersCommand {
    #[command(about = "List customers whose first name starts with any of the prefixes")]
    Search {
        #[arg(long, help = "Comma-separated first-name prefixes")]
        prefix: String,
    },
    #[command(about = "Delete customers whose first name starts with any of the prefixes")]
    Delete {
        #[arg(long, help = "Comma-separated first-name prefixes")]
        prefix: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate { to } => commands::migrate::run(to),
        Command::Rollback { to } => commands::rollback::run(to),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Customers(CustomersCommand::Search { prefix }) => {
            commands::customers::search(&prefix)
        }
        Command::Customers(CustomersCommand::Delete { prefix }) => {
            commands::customers::delete(&prefix)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
