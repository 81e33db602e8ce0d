use clap::Parser;
use gatewire::cli::{check, diagnostic, monitor, stream, CheckCommand, Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let (result, config_path) = match &cli.command {
        Commands::Stream(args) => (stream::execute(args).await, &args.config),
        Commands::Monitor(args) => (monitor::execute(args).await, &args.config),
        Commands::Check(CheckCommand::Config(arg)) => {
            (check::execute_config(&arg.config), &arg.config)
        }
    };

    result.map_err(|e| diagnostic::report(e, Some(config_path)))
}
