use crate::error::Result;
use crate::index::IndexManager;
use crate::parser;
use crate::resolver::{self, LineSource, ResolvedLocation};
use std::path::Path;
use std::sync::Arc;

/// Per-request façade over the tag database: builds the query argv,
/// runs it, parses the cscope-format output and resolves every
/// occurrence to an exact location. Query failures degrade to empty
/// results with a diagnostic; they never take the session down.
pub struct NavigationService {
    index: Arc<IndexManager>,
}

impl NavigationService {
    pub fn new(index: Arc<IndexManager>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &Arc<IndexManager> {
        &self.index
    }

    /// Definition sites of `word` (exact match). Empty word means the
    /// cursor sat on whitespace or punctuation: no subprocess is run.
    pub async fn find_definition(
        &self,
        word: &str,
        lines: &dyn LineSource,
    ) -> Vec<ResolvedLocation> {
        if word.is_empty() {
            return Vec::new();
        }
        self.locations(&["--result=cscope", "-a", word], lines).await
    }

    /// Reference sites of `word` (exact match).
    pub async fn find_references(
        &self,
        word: &str,
        lines: &dyn LineSource,
    ) -> Vec<ResolvedLocation> {
        if word.is_empty() {
            return Vec::new();
        }
        self.locations(&["--result=cscope", "-a", "-r", word], lines)
            .await
    }

    /// Substring search across the whole index. The user's text is
    /// regex-escaped before being wrapped in `.*` on both sides, so
    /// metacharacters in the query match literally.
    pub async fn workspace_symbols(
        &self,
        query: &str,
        lines: &dyn LineSource,
    ) -> Vec<(String, ResolvedLocation)> {
        let pattern = format!(".*{}.*", regex::escape(query));
        self.symbols(&["--result=cscope", "-a", &pattern], lines).await
    }

    /// All symbols of one file.
    pub async fn document_symbols(
        &self,
        file: &Path,
        lines: &dyn LineSource,
    ) -> Vec<(String, ResolvedLocation)> {
        let file = file.to_string_lossy();
        self.symbols(&["--result=cscope", "-a", "-f", file.as_ref()], lines)
            .await
    }

    /// Save hook: incremental reindex of the saved file.
    pub async fn on_save(&self, file: &Path) -> Result<()> {
        self.index.update_file(file).await
    }

    async fn locations(&self, args: &[&str], lines: &dyn LineSource) -> Vec<ResolvedLocation> {
        self.symbols(args, lines)
            .await
            .into_iter()
            .map(|(_, location)| location)
            .collect()
    }

    async fn symbols(
        &self,
        args: &[&str],
        lines: &dyn LineSource,
    ) -> Vec<(String, ResolvedLocation)> {
        let output = match self.index.run_global(args, true).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(error = %e, "query failed, returning no results");
                return Vec::new();
            }
        };
        let occurrences = match parser::parse_cscope_output(&output.stdout) {
            Ok(occurrences) => occurrences,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable query output, returning no results");
                return Vec::new();
            }
        };
        occurrences
            .into_iter()
            .filter_map(|occ| {
                resolver::resolve_occurrence(&occ, lines).map(|loc| (occ.symbol, loc))
            })
            .collect()
    }
}
