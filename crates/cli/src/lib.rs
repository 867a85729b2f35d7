pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::admin::AdminCommand;
use commands::request::RequestArgs;
use commands::session::AuthArgs;

#[derive(Debug, Parser)]
#[command(
    name = "hakata",
    about = "Hakata quote request desk",
    long_about = "Submit, review and archive security-equipment quote requests kept in the local store.",
    after_help = "Examples:\n  hakata login --google\n  hakata request --category alarms-detection --company Acme --phone 0102030405 --description \"two sites\"\n  hakata admin list --status pending\n  hakata doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, database connectivity and stored state")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Send a quote request, signing in first if needed")]
    Request(RequestArgs),
    #[command(about = "Sign in or create an account")]
    Login(AuthArgs),
    #[command(about = "End the current session")]
    Logout,
    #[command(about = "Show the signed-in identity")]
    Whoami,
    #[command(about = "List your current and archived quote requests")]
    Profile,
    #[command(about = "Archive one of your quote requests")]
    Archive { id: String },
    #[command(about = "Permanently delete one of your quote requests")]
    Delete {
        id: String,
        #[arg(long, help = "Confirm the deletion")]
        yes: bool,
    },
    #[command(subcommand, about = "Review every quote request")]
    Admin(AdminCommand),
    #[command(about = "Write all quote requests as JSON")]
    Export {
        #[arg(long, help = "File to write; prints in the command output when omitted")]
        output: Option<PathBuf>,
    },
    #[command(about = "Replace all quote requests with a JSON export")]
    Import {
        path: PathBuf,
        #[arg(long, help = "Confirm replacing the stored collection")]
        yes: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Request(args) => commands::request::run(args),
        Command::Login(args) => commands::session::login(args),
        Command::Logout => commands::session::logout(),
        Command::Whoami => commands::session::whoami(),
        Command::Profile => commands::profile::overview(),
        Command::Archive { id } => commands::profile::archive(id),
        Command::Delete { id, yes } => commands::profile::delete(id, yes),
        Command::Admin(command) => commands::admin::run(command),
        Command::Export { output } => commands::transfer::export(output),
        Command::Import { path, yes } => commands::transfer::import(path, yes),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
