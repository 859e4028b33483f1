//! Bridge from the async extraction loop to the blocking oracle

use std::fmt::Display;
use std::sync::Arc;
use trialmine_domain::traits::FieldOracle;

/// Ask the oracle on the blocking pool
///
/// Any failure, including a panicked task, comes back as a message so the
/// caller can record it against the field.
pub(crate) async fn ask<O>(oracle: &Arc<O>, prompt: String) -> Result<String, String>
where
    O: FieldOracle + Send + Sync + 'static,
    O::Error: Display,
{
    let oracle = Arc::clone(oracle);
    tokio::task::spawn_blocking(move || oracle.ask(&prompt).map_err(|e| e.to_string()))
        .await
        .map_err(|e| format!("Task join error: {}", e))?
}
