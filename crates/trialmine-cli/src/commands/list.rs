//! List command implementation.

use crate::error::Result;
use crate::output::Formatter;
use crate::Service;

/// Execute the list command.
pub fn execute_list(service: &Service, formatter: &Formatter) -> Result<()> {
    let summaries = service.list_checkpoints()?;
    println!("{}", formatter.format_summaries(&summaries)?);
    Ok(())
}
