//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::Service;
use trialmine_domain::DocumentType;
use trialmine_extractor::FilenameMetadata;

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    let (case_id, document_type) = resolve_target(&args)?;

    let outcome = service
        .extract(
            &case_id,
            &args.document,
            document_type,
            args.reference.as_deref(),
        )
        .await?;

    println!("{}", formatter.format_outcome(&outcome)?);
    Ok(())
}

/// Case id and document type from the flags, else from the file name.
pub(crate) fn resolve_target(args: &ExtractArgs) -> Result<(String, DocumentType)> {
    let metadata = FilenameMetadata::from_path(&args.document);

    let case_id = args
        .case_id
        .clone()
        .or(metadata.case_id)
        .ok_or_else(|| {
            CliError::InvalidInput(format!(
                "No case id in '{}'; pass --case-id",
                args.document.display()
            ))
        })?;

    let document_type = args
        .document_type
        .map(Into::into)
        .or(metadata.document_type)
        .ok_or_else(|| {
            CliError::InvalidInput(format!(
                "No document type in '{}'; pass --document-type",
                args.document.display()
            ))
        })?;

    Ok((case_id, document_type))
}
