//! Oracle prompts for mapping, field extraction and outcome extraction
//!
//! Every prompt opens with a fixed marker line (`FIELD TO EXTRACT:`,
//! `CHUNK ANALYSIS`, `OUTCOME COUNT`, ...) so answers can be scripted and
//! prompts told apart in logs.

use trialmine_domain::FieldName;

const GROUNDING_RULES: &str = "\
Rules:
- Use ONLY the text between the markers below. Do not use prior knowledge of this or any other trial.
- Copy identifiers, names, dates and numbers exactly as they are written.
- If the information is not present in the text, answer NOT_FOUND.";

/// Prompt asking for one or more fields from a span of text
pub fn field_prompt(fields: &[FieldName], text: &str) -> String {
    let mut prompt = String::new();

    match fields {
        [field] => {
            prompt.push_str(&format!("FIELD TO EXTRACT: {}\n", field));
            prompt.push_str(&format!("Description: {}\n\n", field.description()));
        }
        _ => {
            prompt.push_str("FIELDS TO EXTRACT:\n");
            for field in fields {
                prompt.push_str(&format!("- {}: {}\n", field, field.description()));
            }
            prompt.push('\n');
        }
    }

    prompt.push_str("You are reading a clinical trial document.\n");
    prompt.push_str(GROUNDING_RULES);
    prompt.push_str("\n\nDocument text:\n---\n");
    prompt.push_str(text);
    prompt.push_str("\n---\n\n");

    prompt.push_str("Answer with one line per field in the form `field_name: value`.\n");
    if fields.iter().any(|f| f.is_multi_value()) {
        prompt.push_str("Separate multiple values for one field with semicolons.\n");
    }
    prompt
}

/// Prompt asking which target fields a chunk contains
pub fn chunk_analysis_prompt(targets: &[FieldName], chunk_text: &str) -> String {
    let names: Vec<&str> = targets.iter().map(|f| f.as_str()).collect();
    format!(
        "CHUNK ANALYSIS\n\
         Identify which of these clinical trial fields are substantively present in the text chunk:\n\
         {fields}\n\n\
         Chunk text:\n---\n{text}\n---\n\n\
         Only include fields whose actual content appears in this chunk, not passing mentions.\n\
         Respond with a JSON object only:\n\
         {{\"fields\": [\"enrollment\"], \"confidence\": {{\"enrollment\": 0.8}}, \"sections\": [\"Study Design\"]}}",
        fields = names.join(", "),
        text = chunk_text,
    )
}

fn outcome_kind(field: FieldName) -> &'static str {
    match field {
        FieldName::PrimaryOutcomeMeasures => "primary",
        FieldName::SecondaryOutcomeMeasures => "secondary",
        _ => "other",
    }
}

/// Prompt asking for every outcome of one kind as a JSON array
pub fn outcome_prompt(field: FieldName, text: &str) -> String {
    let kind = outcome_kind(field);
    format!(
        "OUTCOME EXTRACTION\n\
         Extract all {kind} outcome measures or {kind} endpoints defined in this clinical trial document.\n\
         Outcome measures and endpoints are used interchangeably.\n\n\
         {rules}\n\n\
         Respond with a JSON array only. Each element must be an object with:\n\
         - outcome_measure: name of the outcome or endpoint\n\
         - outcome_time_frame: when it is measured\n\
         - outcome_description: any additional detail\n\
         If there are no {kind} outcomes, respond with [].\n\n\
         Document text:\n---\n{text}\n---",
        kind = kind,
        rules = GROUNDING_RULES,
        text = text,
    )
}

/// Prompt asking how many outcomes of one kind exist
pub fn outcome_count_prompt(field: FieldName, text: &str) -> String {
    format!(
        "OUTCOME COUNT\n\
         How many distinct {kind} outcome measures are explicitly defined in this clinical trial document?\n\
         Respond with a single number only, 0 if there are none.\n\n\
         Document text:\n---\n{text}\n---",
        kind = outcome_kind(field),
        text = text,
    )
}

/// Prompt asking for the name of the n-th outcome (1-based)
pub fn outcome_item_prompt(field: FieldName, index: usize, text: &str) -> String {
    format!(
        "OUTCOME ITEM #{index}\n\
         What is the exact name of {kind} outcome measure #{index} in this document?\n\
         Respond with the name only, or NOT_FOUND.\n\n\
         Document text:\n---\n{text}\n---",
        index = index,
        kind = outcome_kind(field),
        text = text,
    )
}

/// Prompt asking for the time frame of a named outcome
pub fn outcome_timeframe_prompt(field: FieldName, measure: &str, text: &str) -> String {
    format!(
        "OUTCOME TIMEFRAME\n\
         What is the time frame of the {kind} outcome \"{measure}\" in this document?\n\
         Respond with the time frame only (e.g. \"Week 12\"), or NOT_FOUND.\n\n\
         Document text:\n---\n{text}\n---",
        kind = outcome_kind(field),
        measure = measure,
        text = text,
    )
}
