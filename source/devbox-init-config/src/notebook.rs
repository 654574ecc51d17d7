//! Settings record for the notebook server.
//!
//! The server reads its configuration at its own startup, either from a JSON
//! file (`{"ServerApp": {...}}`) or from a Python file of `c.X.y = ...`
//! assignments. [`NotebookConfig`] models only the keys this image sets, and
//! [`NotebookConfig::render`] produces either format.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;

use crate::env::{StartupEnv, JUPYTER_SERVER_PORT};
use crate::error::{EnvError, RenderError};

/// Listen on every interface; the reverse proxy is the only entry point.
pub const LISTEN_ALL: &str = "0.0.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RenderFormat {
    /// `jupyter_server_config.json`
    #[default]
    Json,
    /// `jupyter_server_config.py`
    Python,
}

impl RenderFormat {
    pub fn extension(self) -> &'static str {
        match self {
            RenderFormat::Json => "json",
            RenderFormat::Python => "py",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotebookConfig {
    #[serde(rename = "ServerApp")]
    pub server_app: ServerApp,
    #[serde(rename = "NotebookApp")]
    pub notebook_app: AppSurface,
    #[serde(rename = "LabApp")]
    pub lab_app: AppSurface,
    #[serde(rename = "ExtensionApp")]
    pub extension_app: AppSurface,
    #[serde(rename = "FileContentsManager")]
    pub file_contents_manager: FileContentsManager,
    #[serde(rename = "IdentityProvider")]
    pub identity_provider: IdentityProvider,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerApp {
    pub ip: String,
    pub port: u16,
    pub allow_root: bool,
    pub port_retries: u32,
    pub quit_button: bool,
    pub allow_remote_access: bool,
    pub disable_check_xsrf: bool,
    pub allow_origin: String,
    pub trust_xheaders: bool,
    pub open_browser: bool,
    /// `None` keeps the server's own default of `/`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Any application surface that could try to launch a browser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppSurface {
    pub open_browser: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileContentsManager {
    pub delete_to_trash: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityProvider {
    /// An empty token disables authentication entirely.
    pub token: String,
}

impl NotebookConfig {
    pub fn from_env(env: &StartupEnv) -> Result<Self, EnvError> {
        let port = env.port(JUPYTER_SERVER_PORT)?;

        let base_url = format!("/{}", env.main_user());
        let base_url = (base_url != "/").then_some(base_url);

        let headless = AppSurface {
            open_browser: false,
        };

        let config = Self {
            server_app: ServerApp {
                ip: LISTEN_ALL.to_string(),
                port,
                allow_root: true,
                port_retries: 0,
                quit_button: false,
                allow_remote_access: true,
                disable_check_xsrf: true,
                allow_origin: "*".to_string(),
                trust_xheaders: true,
                open_browser: false,
                base_url,
            },
            notebook_app: headless.clone(),
            lab_app: headless.clone(),
            extension_app: headless,
            file_contents_manager: FileContentsManager {
                delete_to_trash: false,
            },
            identity_provider: IdentityProvider {
                token: String::new(),
            },
        };

        if config.auth_disabled() {
            tracing::warn!(
                port,
                "notebook server token authentication is disabled, access control is left to the reverse proxy"
            );
        }

        Ok(config)
    }

    pub fn auth_disabled(&self) -> bool {
        self.identity_provider.token.is_empty()
    }

    pub fn render(&self, format: RenderFormat) -> Result<String, RenderError> {
        match format {
            RenderFormat::Json => {
                let mut out = serde_json::to_string_pretty(self)?;
                out.push('\n');
                Ok(out)
            }
            RenderFormat::Python => Ok(self.render_python()),
        }
    }

    /// Every setting as `(namespace, key, value)`, in the order a config
    /// file would set them.
    pub fn assignments(&self) -> Vec<(&'static str, &'static str, Value)> {
        let s = &self.server_app;
        let mut out = vec![
            ("ServerApp", "ip", Value::from(s.ip.as_str())),
            ("ServerApp", "port", Value::from(s.port)),
            ("ServerApp", "allow_root", Value::from(s.allow_root)),
            ("ServerApp", "port_retries", Value::from(s.port_retries)),
            ("ServerApp", "quit_button", Value::from(s.quit_button)),
            (
                "ServerApp",
                "allow_remote_access",
                Value::from(s.allow_remote_access),
            ),
            (
                "ServerApp",
                "disable_check_xsrf",
                Value::from(s.disable_check_xsrf),
            ),
            ("ServerApp", "allow_origin", Value::from(s.allow_origin.as_str())),
            ("ServerApp", "trust_xheaders", Value::from(s.trust_xheaders)),
            (
                "NotebookApp",
                "open_browser",
                Value::from(self.notebook_app.open_browser),
            ),
            ("LabApp", "open_browser", Value::from(self.lab_app.open_browser)),
            ("ServerApp", "open_browser", Value::from(s.open_browser)),
            (
                "ExtensionApp",
                "open_browser",
                Value::from(self.extension_app.open_browser),
            ),
        ];

        if let Some(base_url) = &s.base_url {
            out.push(("ServerApp", "base_url", Value::from(base_url.as_str())));
        }

        out.push((
            "FileContentsManager",
            "delete_to_trash",
            Value::from(self.file_contents_manager.delete_to_trash),
        ));
        out.push((
            "IdentityProvider",
            "token",
            Value::from(self.identity_provider.token.as_str()),
        ));
        out
    }

    fn render_python(&self) -> String {
        let lines = self
            .assignments()
            .iter()
            .map(|(namespace, key, value)| {
                format!("c.{namespace}.{key} = {}\n", python_literal(value))
            })
            .collect::<String>();

        format!("c = get_config()  # noqa: F821\n\n{lines}")
    }
}

/// Only the scalar shapes produced by [`NotebookConfig::assignments`] occur.
/// JSON string escapes are valid Python string escapes.
fn python_literal(value: &Value) -> String {
    match value {
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}
