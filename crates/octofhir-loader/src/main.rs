use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use octofhir_loader::cli::{Cli, Commands, ConfigCommands};
use octofhir_loader::output::{print_error, print_success};
use octofhir_loader::{FhirClient, Loader, config, observability};

/// Run finished but at least one file failed and `--fail-on-error` was given.
const EXIT_LOAD_ERRORS: i32 = 1;
/// Configuration or setup failure; nothing was loaded.
const EXIT_SETUP: i32 = 2;

#[tokio::main]
async fn main() {
    // .env is optional
    if let Err(e) = dotenvy::dotenv()
        && !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
    {
        eprintln!("Warning: Failed to load .env file: {e}");
    }

    let cli = Cli::parse();
    observability::init_tracing(&cli.log_level);

    match run(&cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            print_error(&format!("{e:#}"));
            std::process::exit(EXIT_SETUP);
        }
    }
}

async fn run(cli: &Cli) -> Result<i32> {
    let profile = &cli.profile;

    match &cli.command {
        None | Some(Commands::Load) => {
            let cfg = config::resolve(
                cli.server.as_deref(),
                cli.data_dir.as_deref(),
                cli.timeout,
                &config::load_profile(profile)?,
            )?;
            tracing::debug!(
                server = %cfg.server_url,
                data_dir = %cfg.data_dir.display(),
                profile = %profile,
                "Configuration resolved"
            );

            let loader = Loader::new(FhirClient::new(cfg.server_url, cfg.timeout)?);
            let summary = loader.run(&cfg.data_dir).await;
            if cli.fail_on_error && summary.has_errors() {
                return Ok(EXIT_LOAD_ERRORS);
            }
        }
        Some(Commands::Config(args)) => match &args.command {
            ConfigCommands::Show => {
                let cfg = config::load_profile(profile)?;
                println!("{}: {}", "Profile".cyan(), profile);
                println!(
                    "{}: {}",
                    "Server".cyan(),
                    cfg.server.as_deref().unwrap_or(config::DEFAULT_SERVER_URL)
                );
                println!(
                    "{}: {}",
                    "Data dir".cyan(),
                    cfg.data_dir
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "(not set)".to_string())
                );
            }
            ConfigCommands::Set(set_args) => {
                let mut cfg = config::load_profile(profile)?;
                config::set_value(&mut cfg, &set_args.key, &set_args.value)?;
                config::save_profile(profile, &cfg)?;
                print_success(&format!("Set {} = {}", set_args.key, set_args.value));
            }
        },
    }

    Ok(0)
}
