//! The `{TOKEN}` table used to template the reverse proxy config.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::env::{StartupEnv, CODE_SERVER_PORT, JUPYTER_SERVER_PORT, NO_VNC_PORT};
use crate::error::EnvError;

/// Bytes left as-is when encoding a base url path: the URL unreserved marks
/// plus `/` and `%`, so separators and existing escapes survive.
const BASE_URL_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/')
    .remove(b'%');

pub const MAIN_USER_TOKEN: &str = "{MAIN_USER}";
pub const BASE_URL_DECODED_TOKEN: &str = "{WORKSPACE_BASE_URL_DECODED}";
pub const BASE_URL_ENCODED_TOKEN: &str = "{WORKSPACE_BASE_URL_ENCODED}";
pub const JUPYTER_SERVER_PORT_TOKEN: &str = "{JUPYTER_SERVER_PORT}";
pub const CODE_SERVER_PORT_TOKEN: &str = "{CODE_SERVER_PORT}";
pub const VNC_PORT_TOKEN: &str = "{VNC_PORT}";

/// `"/" + main_user`, with any percent escapes in the user name decoded.
pub fn decoded_base_url(main_user: &str) -> String {
    let raw = format!("/{main_user}");
    percent_decode_str(&raw).decode_utf8_lossy().into_owned()
}

pub fn encode_base_url(decoded: &str) -> String {
    utf8_percent_encode(decoded, BASE_URL_SAFE).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub token: &'static str,
    pub value: String,
}

/// Fully resolved substitutions, in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderTable {
    rows: Vec<Placeholder>,
}

impl PlaceholderTable {
    /// Resolve every row up front so a missing variable fails before any
    /// file is touched.
    pub fn from_env(env: &StartupEnv) -> Result<Self, EnvError> {
        let main_user = env.main_user();
        let decoded = decoded_base_url(main_user);
        let encoded = encode_base_url(&decoded);

        let rows = vec![
            row(MAIN_USER_TOKEN, main_user),
            row(BASE_URL_DECODED_TOKEN, &decoded),
            row(BASE_URL_ENCODED_TOKEN, &encoded),
            row(JUPYTER_SERVER_PORT_TOKEN, env.required(JUPYTER_SERVER_PORT)?),
            row(CODE_SERVER_PORT_TOKEN, env.required(CODE_SERVER_PORT)?),
            row(VNC_PORT_TOKEN, env.required(NO_VNC_PORT)?),
        ];

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[Placeholder] {
        &self.rows
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.token == token)
            .map(|r| r.value.as_str())
    }
}

impl FromIterator<(&'static str, String)> for PlaceholderTable {
    fn from_iter<I: IntoIterator<Item = (&'static str, String)>>(iter: I) -> Self {
        Self {
            rows: iter
                .into_iter()
                .map(|(token, value)| Placeholder { token, value })
                .collect(),
        }
    }
}

fn row(token: &'static str, value: &str) -> Placeholder {
    Placeholder {
        token,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MAIN_USER;

    fn full_env(user: &str) -> StartupEnv {
        StartupEnv::from_iter([
            (MAIN_USER, user),
            (JUPYTER_SERVER_PORT, "8888"),
            (CODE_SERVER_PORT, "8443"),
            (NO_VNC_PORT, "6901"),
        ])
    }

    #[test]
    fn encoding() {
        assert_eq!(encode_base_url("/alice"), "/alice");
        assert_eq!(encode_base_url("/a b"), "/a%20b");
        assert_eq!(encode_base_url("/a%20b"), "/a%20b");
        assert_eq!(encode_base_url("/a.b-c_d~e"), "/a.b-c_d~e");
        assert_eq!(encode_base_url("/a@b:c"), "/a%40b%3Ac");
        assert_eq!(encode_base_url("/jürgen"), "/j%C3%BCrgen");
    }

    #[test]
    fn decoding() {
        assert_eq!(decoded_base_url(""), "/");
        assert_eq!(decoded_base_url("alice"), "/alice");
        assert_eq!(decoded_base_url("a%20b"), "/a b");
    }

    #[test]
    fn table_order_and_values() {
        let table = PlaceholderTable::from_env(&full_env("a b")).unwrap();
        let rows: Vec<(&str, &str)> = table
            .rows()
            .iter()
            .map(|r| (r.token, r.value.as_str()))
            .collect();

        assert_eq!(
            rows,
            vec![
                ("{MAIN_USER}", "a b"),
                ("{WORKSPACE_BASE_URL_DECODED}", "/a b"),
                ("{WORKSPACE_BASE_URL_ENCODED}", "/a%20b"),
                ("{JUPYTER_SERVER_PORT}", "8888"),
                ("{CODE_SERVER_PORT}", "8443"),
                ("{VNC_PORT}", "6901"),
            ]
        );
    }

    #[test]
    fn vnc_port_comes_from_no_vnc_port() {
        let table = PlaceholderTable::from_env(&full_env("alice")).unwrap();
        assert_eq!(table.get(VNC_PORT_TOKEN), Some("6901"));
    }

    #[test]
    fn empty_user() {
        let table = PlaceholderTable::from_env(&full_env("")).unwrap();
        assert_eq!(table.get(MAIN_USER_TOKEN), Some(""));
        assert_eq!(table.get(BASE_URL_DECODED_TOKEN), Some("/"));
        assert_eq!(table.get(BASE_URL_ENCODED_TOKEN), Some("/"));
    }

    #[test]
    fn each_port_is_required() {
        for missing in [JUPYTER_SERVER_PORT, CODE_SERVER_PORT, NO_VNC_PORT] {
            let env: StartupEnv = [
                (MAIN_USER, "alice"),
                (JUPYTER_SERVER_PORT, "8888"),
                (CODE_SERVER_PORT, "8443"),
                (NO_VNC_PORT, "6901"),
            ]
            .into_iter()
            .filter(|(k, _)| *k != missing)
            .collect();

            assert_eq!(
                PlaceholderTable::from_env(&env),
                Err(EnvError::Missing { name: missing })
            );
        }
    }
}
