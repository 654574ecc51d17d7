use std::path::{Path, PathBuf};

use devbox_init_config::{
    cli::{default_notebook_output, Cli, Commands, DEFAULT_PROXY_CONFIG},
    env::{StartupEnv, PROXY_CONFIG_PATH},
    notebook::{NotebookConfig, RenderFormat},
    placeholders::PlaceholderTable,
    substitutor::{SubstitutionReport, TemplateSubstitutor},
};
use miette::{Context, IntoDiagnostic};
use tokio::io::AsyncWriteExt;

use crate::fs_adapter::TokioFs;

/// One fully resolved startup action.
#[derive(Debug, Clone)]
pub enum Action {
    EmitNotebookConfig {
        config: NotebookConfig,
        format: RenderFormat,
        /// `None` writes to stdout
        output: Option<PathBuf>,
    },
    TemplateProxyConfig {
        target: PathBuf,
        table: PlaceholderTable,
    },
}

pub struct AppContext {
    validate: bool,
    actions: Vec<Action>,
    substitutor: TemplateSubstitutor<TokioFs>,
}

fn resolve_proxy_target(target: Option<&PathBuf>, env: &StartupEnv) -> PathBuf {
    if let Some(path) = target {
        return path.clone();
    }

    if let Some(env_path) = env.get(PROXY_CONFIG_PATH).filter(|p| !p.is_empty()) {
        return env_path.into();
    }

    DEFAULT_PROXY_CONFIG.into()
}

impl AppContext {
    /// Resolve every input for the requested command. Nothing is written
    /// here, so an environment error leaves no partial state behind.
    pub fn bootstrap(cli: Cli, env: &StartupEnv) -> miette::Result<AppContext> {
        tracing::debug!(config = ?cli, "CLI config parsed");

        let actions = match &cli.command {
            Commands::NotebookConfig { format, output } => {
                vec![Self::notebook_action(env, *format, output.clone())?]
            }
            Commands::ProxyConfig { target } => {
                vec![Self::proxy_action(env, target.as_ref())?]
            }
            Commands::Startup {
                format,
                notebook_output,
                target,
            } => {
                let output = notebook_output
                    .clone()
                    .unwrap_or_else(|| default_notebook_output(*format));

                vec![
                    Self::notebook_action(env, *format, Some(output))?,
                    Self::proxy_action(env, target.as_ref())?,
                ]
            }
        };

        Ok(AppContext {
            validate: cli.validate,
            actions,
            substitutor: TemplateSubstitutor::new(TokioFs),
        })
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub async fn run(self) -> miette::Result<()> {
        self.preflight().await?;

        for action in &self.actions {
            match action {
                Action::EmitNotebookConfig {
                    config,
                    format,
                    output,
                } => {
                    let rendered = config.render(*format)?;
                    self.emit_notebook_config(&rendered, output.as_deref())
                        .await?;
                }
                Action::TemplateProxyConfig { target, table } => {
                    self.template_proxy_config(target, table).await?;
                }
            }
        }

        Ok(())
    }

    /// Every proxy target must be readable before the first write, so a bad
    /// target cannot leave a notebook config behind.
    async fn preflight(&self) -> miette::Result<()> {
        for action in &self.actions {
            if let Action::TemplateProxyConfig { target, .. } = action {
                self.substitutor.preflight(target).await?;
            }
        }
        Ok(())
    }

    fn notebook_action(
        env: &StartupEnv,
        format: RenderFormat,
        output: Option<PathBuf>,
    ) -> miette::Result<Action> {
        let config = NotebookConfig::from_env(env)?;
        Ok(Action::EmitNotebookConfig {
            config,
            format,
            output,
        })
    }

    fn proxy_action(env: &StartupEnv, target: Option<&PathBuf>) -> miette::Result<Action> {
        let table = PlaceholderTable::from_env(env)?;
        Ok(Action::TemplateProxyConfig {
            target: resolve_proxy_target(target, env),
            table,
        })
    }

    async fn emit_notebook_config(&self, rendered: &str, output: Option<&Path>) -> miette::Result<()> {
        if self.validate {
            tracing::info!(output = ?output, "notebook config resolved, not writing");
            return Ok(());
        }

        let Some(path) = output else {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(rendered.as_bytes()).await.into_diagnostic()?;
            return stdout.flush().await.into_diagnostic();
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to create directory: {:?}", parent))?;
        }

        tokio::fs::write(path, rendered)
            .await
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write notebook config: {:?}", path))?;

        tracing::info!("Notebook config written to {:?}", path);
        Ok(())
    }

    async fn template_proxy_config(
        &self,
        target: &Path,
        table: &PlaceholderTable,
    ) -> miette::Result<()> {
        let report = if self.validate {
            self.substitutor.preview(target, table).await?
        } else {
            self.substitutor.apply(target, table).await?
        };

        log_report(target, &report, self.validate);
        Ok(())
    }
}

fn log_report(target: &Path, report: &SubstitutionReport, dry_run: bool) {
    for (token, count) in &report.replaced {
        tracing::info!(token, count, dry_run, "Placeholder substituted");
    }

    for leftover in &report.leftovers {
        tracing::warn!(
            placeholder = leftover.as_str(),
            "Unresolved placeholder left in {:?}",
            target
        );
    }

    tracing::info!(
        "Proxy config {:?}: {} replacements across {} placeholders",
        target,
        report.total_replacements(),
        report.writes()
    );
}
