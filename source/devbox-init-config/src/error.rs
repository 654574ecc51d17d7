use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Problems with the process environment. All of them are fatal at startup.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum EnvError {
    #[error("environment variable `{name}` is not set")]
    #[diagnostic(
        code(devbox_init::env::missing),
        help("the container runtime must export `{name}` before startup")
    )]
    Missing { name: &'static str },

    #[error("environment variable `{name}` is not a valid port: {value:?}")]
    #[diagnostic(
        code(devbox_init::env::invalid_port),
        help("expected an integer between 0 and 65535")
    )]
    InvalidPort { name: &'static str, value: String },
}

/// Failures while reading or rewriting a template file.
#[derive(Debug, Error, Diagnostic)]
pub enum TemplateError {
    #[error("failed to read template {path:?}")]
    #[diagnostic(code(devbox_init::template::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write template {path:?}")]
    #[diagnostic(
        code(devbox_init::template::write),
        help("the file is rewritten in place, check that it is writable")
    )]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rendering the notebook config record failed.
#[derive(Debug, Error, Diagnostic)]
#[error("failed to render notebook config")]
#[diagnostic(code(devbox_init::notebook::render))]
pub struct RenderError(#[from] pub serde_json::Error);
