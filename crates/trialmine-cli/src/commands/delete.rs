//! Delete command implementation.

use crate::cli::DeleteArgs;
use crate::error::Result;
use crate::output::Formatter;
use crate::Service;
use std::io::{self, Write};
use trialmine_domain::DocumentType;

/// Execute the delete command.
pub fn execute_delete(args: DeleteArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    let document_type: DocumentType = args.document_type.into();

    if !args.yes {
        print!("Delete checkpoint {} {}? [y/N] ", args.case_id, document_type);
        io::stdout().flush()?;

        let mut response = String::new();
        io::stdin().read_line(&mut response)?;

        if !response.trim().eq_ignore_ascii_case("y") {
            println!("{}", formatter.info("Operation cancelled"));
            return Ok(());
        }
    }

    if service.delete(&args.case_id, document_type)? {
        println!(
            "{}",
            formatter.success(&format!("Deleted checkpoint {} {}", args.case_id, document_type))
        );
    } else {
        println!(
            "{}",
            formatter.warning(&format!("No checkpoint for {} {}", args.case_id, document_type))
        );
    }
    Ok(())
}
