use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::TemplateError;
use crate::placeholders::PlaceholderTable;

/// File access used by the substitutor. The binary backs this with
/// `tokio::fs`; tests use an in-memory store.
pub trait TemplateFs: Send + Sync {
    fn read_to_string(&self, path: &Path)
        -> impl Future<Output = std::io::Result<String>> + Send;
    fn write(&self, path: &Path, contents: String)
        -> impl Future<Output = std::io::Result<()>> + Send;
}

/// What a run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionReport {
    /// `(token, occurrences)` for every token found, in application order.
    pub replaced: Vec<(&'static str, usize)>,
    /// `{UPPER_SNAKE}` markers still present after all rows were applied.
    pub leftovers: Vec<String>,
}

impl SubstitutionReport {
    pub fn writes(&self) -> usize {
        self.replaced.len()
    }

    pub fn total_replacements(&self) -> usize {
        self.replaced.iter().map(|(_, n)| n).sum()
    }
}

/// Rewrites one file in place, one complete read/replace/write cycle per
/// placeholder that occurs in it.
#[derive(Debug, Clone, Default)]
pub struct TemplateSubstitutor<F: TemplateFs> {
    fs: F,
}

impl<F: TemplateFs> TemplateSubstitutor<F> {
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    pub async fn apply(
        &self,
        path: &Path,
        table: &PlaceholderTable,
    ) -> Result<SubstitutionReport, TemplateError> {
        let mut report = SubstitutionReport::default();

        for row in table.rows() {
            let contents = self.read(path).await?;

            let count = contents.matches(row.token).count();
            if count == 0 {
                tracing::debug!(token = row.token, "placeholder not present");
                continue;
            }

            let rewritten = contents.replace(row.token, &row.value);
            self.fs
                .write(path, rewritten)
                .await
                .map_err(|source| TemplateError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;

            tracing::debug!(token = row.token, count, "placeholder replaced");
            report.replaced.push((row.token, count));
        }

        let final_text = self.read(path).await?;
        report.leftovers = find_leftovers(&final_text);

        Ok(report)
    }

    /// Fails the same way `apply` would on an unreadable target, without
    /// touching it.
    pub async fn preflight(&self, path: &Path) -> Result<(), TemplateError> {
        self.read(path).await.map(|_| ())
    }

    /// Resolve-only pass: report which tokens a real run would replace,
    /// without writing.
    pub async fn preview(
        &self,
        path: &Path,
        table: &PlaceholderTable,
    ) -> Result<SubstitutionReport, TemplateError> {
        let mut contents = self.read(path).await?;
        let mut report = SubstitutionReport::default();

        for row in table.rows() {
            let count = contents.matches(row.token).count();
            if count > 0 {
                contents = contents.replace(row.token, &row.value);
                report.replaced.push((row.token, count));
            }
        }

        report.leftovers = find_leftovers(&contents);
        Ok(report)
    }

    async fn read(&self, path: &Path) -> Result<String, TemplateError> {
        self.fs
            .read_to_string(path)
            .await
            .map_err(|source| TemplateError::Read {
                path: PathBuf::from(path),
                source,
            })
    }
}

fn leftover_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{[A-Z][A-Z0-9_]*\}").expect("static regex"))
}

/// Distinct `{UPPER_SNAKE}` markers in order of first appearance.
pub fn find_leftovers(text: &str) -> Vec<String> {
    let mut found: Vec<String> = vec![];
    for m in leftover_pattern().find_iter(text) {
        if !found.iter().any(|f| f == m.as_str()) {
            found.push(m.as_str().to_string());
        }
    }
    found
}
