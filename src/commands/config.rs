use clap::{Args, Subcommand};

use crate::config;

#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Debug, Subcommand, Clone)]
enum ConfigSubcommand {
    /// Parse the config file and optionally check that a profile exists.
    Check {
        #[arg(long)]
        profile: Option<String>,
    },
    /// Print the config file location.
    Path,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigSubcommand::Check { profile } => {
            let path = config::validate_config(profile.as_deref())?;
            println!("config OK: {}", path.display());
        }
        ConfigSubcommand::Path => {
            println!("{}", config::config_path()?.display());
        }
    }
    Ok(())
}
