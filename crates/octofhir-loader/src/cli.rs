use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "octofhir-loader")]
#[command(about = "OctoFHIR loader — bulk-submit FHIR JSON files to a FHIR server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// FHIR endpoint that receives every file (overrides config)
    #[arg(short, long, global = true, env = "FHIR_SERVER_URL")]
    pub server: Option<String>,

    /// Directory scanned (non-recursively) for *.json files
    #[arg(short, long, global = true, env = "FHIR_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Config profile name
    #[arg(short, long, global = true, env = "OCTOFHIR_PROFILE", default_value = "default")]
    pub profile: String,

    /// Per-request timeout in seconds (no timeout if omitted)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Exit with status 1 when at least one file failed to load
    #[arg(long, global = true)]
    pub fail_on_error: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load every *.json file from the data directory (default)
    Load,
    /// Manage loader configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the resolved profile
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (server, data_dir)
    pub key: String,
    /// Value
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["octofhir-loader", "--data-dir", "/tmp/synthea"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.profile, "default");
        assert_eq!(cli.log_level, "warn");
        assert!(!cli.fail_on_error);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/synthea")));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "octofhir-loader",
            "load",
            "--server",
            "http://fhir.local/fhir",
            "--timeout",
            "30",
            "--fail-on-error",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Load)));
        assert_eq!(cli.server.as_deref(), Some("http://fhir.local/fhir"));
        assert_eq!(cli.timeout, Some(30));
        assert!(cli.fail_on_error);
    }

    #[test]
    fn test_config_set_args() {
        let cli =
            Cli::try_parse_from(["octofhir-loader", "config", "set", "server", "http://x/fhir"])
                .unwrap();
        match cli.command {
            Some(Commands::Config(ConfigArgs {
                command: ConfigCommands::Set(args),
            })) => {
                assert_eq!(args.key, "server");
                assert_eq!(args.value, "http://x/fhir");
            }
            _ => panic!("expected config set"),
        }
    }
}
