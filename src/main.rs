mod history_cmd;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use runlog::capture::ScriptRunner;
use runlog::exec;
use runlog::git::Git;

/// Exit code for bad invocations (no args, unknown subcommand, empty COMMAND).
const USAGE_EXIT: i32 = 129;

#[derive(Parser)]
#[command(
    name = "runlog",
    version,
    about = "Record terminal sessions and sync them to a shared per-project git branch"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command in a pseudo-terminal and log the session
    Exec {
        #[arg(trailing_var_arg = true, required = true, allow_hyphen_values = true)]
        command_args: Vec<String>,
    },
    /// Browse or maintain the project's execution history
    ///
    /// With no arguments, lists prior log entries. `show COMMIT` displays a
    /// stored transcript, `pull` clones or updates the local mirror, `fix`
    /// re-clones it after confirmation, `git ARGS...` runs an arbitrary git
    /// command inside the store; anything else is passed through to `git log`.
    History {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Print tool name and version
    Version,
}

fn or_exit(r: anyhow::Result<i32>) -> i32 {
    r.unwrap_or_else(|e| {
        eprintln!("[runlog] error: {e:#}");
        1
    })
}

fn cmd_exec(command_args: &[String]) -> anyhow::Result<i32> {
    let runner = ScriptRunner::detect()?;
    exec::run(&runner, &Git, command_args)
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                let _ = e.print();
                std::process::exit(0);
            }
            let _ = e.print();
            std::process::exit(USAGE_EXIT);
        }
    };

    let exit_code = match &cli.command {
        Commands::Exec { command_args } => or_exit(cmd_exec(command_args)),
        Commands::History { args } => or_exit(history_cmd::run(args)),
        Commands::Version => {
            println!("runlog version {}", env!("CARGO_PKG_VERSION"));
            0
        }
    };
    std::process::exit(exit_code);
}
