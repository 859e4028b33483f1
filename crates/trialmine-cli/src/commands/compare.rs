//! Compare command implementation.

use crate::cli::CompareArgs;
use crate::error::Result;
use crate::output::Formatter;
use crate::Service;

/// Execute the compare command.
pub async fn execute_compare(args: CompareArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    let comparison = service
        .compare(&args.case_id, args.document_type.into(), &args.reference)
        .await?;

    println!("{}", formatter.format_comparison(&comparison)?);
    Ok(())
}
