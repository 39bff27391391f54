use clap::Parser;
use frame_navigator::cli::commands::{cmd_resolve, cmd_submit};
use frame_navigator::cli::config::{Cli, Commands, load_config};
use frame_navigator::cli::logging::init_subscriber;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_subscriber(cli.verbose);
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Resolve {
            page,
            element,
            submitter,
            get_policy,
        } => {
            cmd_resolve(
                &page,
                &element,
                submitter.as_deref(),
                get_policy.map(Into::into),
                &config,
            )?;
        }
        Commands::Submit {
            page,
            form,
            submitter,
            trace,
        } => {
            let succeeded = cmd_submit(&page, &form, submitter.as_deref(), trace.as_deref(), &config)?;
            if !succeeded {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
