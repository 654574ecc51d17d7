use std::collections::HashMap;
use std::env;

use crate::error::EnvError;

pub const JUPYTER_SERVER_PORT: &str = "JUPYTER_SERVER_PORT";
pub const MAIN_USER: &str = "MAIN_USER";
pub const CODE_SERVER_PORT: &str = "CODE_SERVER_PORT";
/// Set by the display server base image; its port is templated as `{VNC_PORT}`.
pub const NO_VNC_PORT: &str = "NO_VNC_PORT";

/// Overrides the default location of the reverse proxy config.
pub const PROXY_CONFIG_PATH: &str = "DEVBOX_PROXY_CONFIG_PATH";

/// The variables this tool reads, captured once at startup.
#[derive(Default, Clone, Debug)]
pub struct StartupEnv {
    pub(crate) vars: HashMap<String, String>,
}

impl StartupEnv {
    /// Snapshot the current process environment. Variables that are not valid
    /// unicode are treated as unset.
    pub fn from_process() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn required(&self, name: &'static str) -> Result<&str, EnvError> {
        self.get(name).ok_or(EnvError::Missing { name })
    }

    /// Unset reads as the empty string.
    pub fn optional(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    /// Surrounding whitespace is ignored, so `" 8888\n"` is port 8888.
    pub fn port(&self, name: &'static str) -> Result<u16, EnvError> {
        let raw = self.required(name)?;
        raw.trim().parse().map_err(|_| EnvError::InvalidPort {
            name,
            value: raw.to_string(),
        })
    }

    pub fn main_user(&self) -> &str {
        self.optional(MAIN_USER)
    }
}

impl<K, V> FromIterator<(K, V)> for StartupEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_variable() {
        let env = StartupEnv::default();
        assert_eq!(
            env.required(CODE_SERVER_PORT),
            Err(EnvError::Missing {
                name: CODE_SERVER_PORT
            })
        );
    }

    #[test]
    fn optional_defaults_to_empty() {
        let env = StartupEnv::default();
        assert_eq!(env.main_user(), "");

        let env = StartupEnv::from_iter([(MAIN_USER, "alice")]);
        assert_eq!(env.main_user(), "alice");
    }

    #[test]
    fn port_parsing() {
        for p in ["0", "80", "8888", "65535"] {
            let env = StartupEnv::from_iter([(JUPYTER_SERVER_PORT, p)]);
            assert_eq!(env.port(JUPYTER_SERVER_PORT).unwrap().to_string(), p);
        }

        for padded in [" 8888", "8888\n", "\t8888 "] {
            let env = StartupEnv::from_iter([(JUPYTER_SERVER_PORT, padded)]);
            assert_eq!(env.port(JUPYTER_SERVER_PORT), Ok(8888), "{padded:?}");
        }

        for bad in ["", "   ", "88x", "88 88", "65536", "-1"] {
            let env = StartupEnv::from_iter([(JUPYTER_SERVER_PORT, bad)]);
            assert!(
                matches!(
                    env.port(JUPYTER_SERVER_PORT),
                    Err(EnvError::InvalidPort { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn invalid_port_keeps_raw_value() {
        let env = StartupEnv::from_iter([(JUPYTER_SERVER_PORT, " 88x\n")]);
        assert_eq!(
            env.port(JUPYTER_SERVER_PORT),
            Err(EnvError::InvalidPort {
                name: JUPYTER_SERVER_PORT,
                value: " 88x\n".to_string(),
            })
        );
    }
}
