//! Configuration sourced from the CLI

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::notebook::RenderFormat;

pub const DEFAULT_PROXY_CONFIG: &str = "/etc/nginx/nginx.conf";
pub const DEFAULT_NOTEBOOK_CONFIG_DIR: &str = "/etc/jupyter";

#[derive(Parser, Debug)]
#[command(name = "devbox-init", version, about)]
pub struct Cli {
    /// Resolve every input and report what would be done, without writing
    #[arg(long, global = true)]
    pub validate: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Emit the notebook server configuration
    NotebookConfig {
        #[arg(short, long, value_enum, default_value_t = RenderFormat::Json)]
        format: RenderFormat,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace placeholders in the reverse proxy config, in place
    ProxyConfig {
        /// Defaults to $DEVBOX_PROXY_CONFIG_PATH, then /etc/nginx/nginx.conf
        #[arg(short, long)]
        target: Option<PathBuf>,
    },

    /// Run both startup actions, notebook config first
    Startup {
        #[arg(short, long, value_enum, default_value_t = RenderFormat::Json)]
        format: RenderFormat,

        /// Defaults to /etc/jupyter/jupyter_server_config.<json|py>
        #[arg(long)]
        notebook_output: Option<PathBuf>,

        /// Defaults to $DEVBOX_PROXY_CONFIG_PATH, then /etc/nginx/nginx.conf
        #[arg(short, long)]
        target: Option<PathBuf>,
    },
}

pub fn default_notebook_output(format: RenderFormat) -> PathBuf {
    PathBuf::from(DEFAULT_NOTEBOOK_CONFIG_DIR)
        .join(format!("jupyter_server_config.{}", format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_startup() {
        let cli = Cli::try_parse_from([
            "devbox-init",
            "--validate",
            "startup",
            "--format",
            "python",
            "--target",
            "/tmp/nginx.conf",
        ])
        .unwrap();

        assert!(cli.validate);
        match cli.command {
            Commands::Startup {
                format,
                notebook_output,
                target,
            } => {
                assert_eq!(format, RenderFormat::Python);
                assert_eq!(notebook_output, None);
                assert_eq!(target, Some(PathBuf::from("/tmp/nginx.conf")));
            }
            other => panic!("Expected Startup, got {other:?}"),
        }
    }

    #[test]
    fn subcommand_required() {
        assert!(Cli::try_parse_from(["devbox-init"]).is_err());
    }

    #[test]
    fn notebook_output_default_follows_format() {
        assert_eq!(
            default_notebook_output(RenderFormat::Json),
            PathBuf::from("/etc/jupyter/jupyter_server_config.json")
        );
        assert_eq!(
            default_notebook_output(RenderFormat::Python),
            PathBuf::from("/etc/jupyter/jupyter_server_config.py")
        );
    }
}
