//! Outcome-measure strategies

use crate::chunking::truncate;
use crate::oracle::ask;
use crate::parser::{parse_count, parse_outcome_items};
use crate::prompt::{outcome_count_prompt, outcome_item_prompt, outcome_prompt, outcome_timeframe_prompt};
use crate::strategy::{Attempt, Lookup};
use crate::types::OutcomeItem;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trialmine_domain::traits::FieldOracle;
use trialmine_domain::{normalize_answer, FieldName};

fn joined(items: Vec<String>) -> Lookup {
    if items.is_empty() {
        Lookup::Failed(Attempt::NotFound)
    } else {
        Lookup::Value(items.join("; "))
    }
}

/// One JSON query for every outcome of the field's kind
pub(crate) async fn structured<O>(oracle: &Arc<O>, field: FieldName, text: &str, budget: usize) -> Lookup
where
    O: FieldOracle + Send + Sync + 'static,
    O::Error: Display,
{
    let answer = match ask(oracle, outcome_prompt(field, truncate(text, budget))).await {
        Ok(answer) => answer,
        Err(e) => return Lookup::Failed(Attempt::OracleError(e)),
    };

    match parse_outcome_items(&answer) {
        Ok(items) => {
            info!("Structured query found {} {} item(s)", items.len(), field);
            joined(items.iter().map(OutcomeItem::to_string).collect())
        }
        Err(e) => {
            warn!("Structured {} answer could not be parsed: {}", field, e);
            Lookup::Failed(Attempt::Unparseable(e))
        }
    }
}

/// Count the outcomes, then ask for each name and time frame separately
///
/// Trades oracle calls for robustness against malformed batch answers.
pub(crate) async fn count_then_itemize<O>(
    oracle: &Arc<O>,
    field: FieldName,
    text: &str,
    budget: usize,
    max_items: usize,
) -> Lookup
where
    O: FieldOracle + Send + Sync + 'static,
    O::Error: Display,
{
    let text = truncate(text, budget);
    let count = match ask(oracle, outcome_count_prompt(field, text)).await {
        Ok(answer) => parse_count(&answer).unwrap_or(0),
        Err(e) => return Lookup::Failed(Attempt::OracleError(e)),
    };
    if count == 0 {
        return Lookup::Failed(Attempt::NotFound);
    }
    if count > max_items {
        debug!("Capping {} {} outcomes at {}", count, field, max_items);
    }

    let mut items = Vec::new();
    for index in 1..=count.min(max_items) {
        let measure = match ask(oracle, outcome_item_prompt(field, index, text)).await {
            Ok(answer) => match normalize_answer(&answer) {
                Some(measure) => measure,
                None => continue,
            },
            Err(e) => {
                warn!("Could not fetch {} item #{}: {}", field, index, e);
                continue;
            }
        };

        let time_frame = match ask(oracle, outcome_timeframe_prompt(field, &measure, text)).await {
            Ok(answer) => normalize_answer(&answer),
            Err(e) => {
                debug!("No time frame for {} item #{}: {}", field, index, e);
                None
            }
        };

        items.push(
            OutcomeItem {
                outcome_measure: measure,
                outcome_time_frame: time_frame,
                outcome_description: None,
            }
            .to_string(),
        );
    }

    info!("Itemized {} {} outcome(s)", items.len(), field);
    joined(items)
}
