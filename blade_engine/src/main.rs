use anyhow::Result;

mod cli;
mod runtime;

use cli::Command;

fn main() -> Result<()> {
    let command = cli::parse()?;

    let default_filter = if command.verbose() { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match command {
        Command::Run(args) => runtime::execute(args),
        Command::ListActions { .. } => {
            runtime::list_actions();
            Ok(())
        }
    }
}
