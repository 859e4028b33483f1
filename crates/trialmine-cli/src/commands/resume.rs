//! Resume command implementation.

use crate::cli::ResumeArgs;
use crate::error::Result;
use crate::output::Formatter;
use crate::Service;

/// Execute the resume command.
pub async fn execute_resume(args: ResumeArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    let outcome = service
        .resume(&args.case_id, args.document_type.into())
        .await?;

    println!("{}", formatter.format_outcome(&outcome)?);
    Ok(())
}
