//! Startup configuration for the development workstation image.
//!
//! Everything here reads from a [`StartupEnv`](env::StartupEnv) snapshot and
//! produces plain values: the notebook server's settings record and the
//! placeholder table used to template the reverse proxy config. The only I/O
//! goes through the [`TemplateFs`](substitutor::TemplateFs) seam.

pub mod cli;
pub mod env;
pub mod error;
pub mod notebook;
pub mod placeholders;
pub mod substitutor;
