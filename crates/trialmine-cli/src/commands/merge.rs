//! Merge command implementation.

use crate::cli::MergeArgs;
use crate::error::Result;
use crate::output::Formatter;
use crate::Service;
use std::fs;

/// Execute the merge command.
pub fn execute_merge(args: MergeArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    let record = service.merge(&args.case_id)?;

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(&record)?)?;
            println!(
                "{}",
                formatter.success(&format!(
                    "Merged {} document(s) for {} into {}",
                    record.source_documents.len(),
                    record.case_id,
                    path.display()
                ))
            );
        }
        None => println!("{}", formatter.format_record(&record)?),
    }
    Ok(())
}
