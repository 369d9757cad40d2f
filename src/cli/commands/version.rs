//! Version command - print the vapp version

use crate::error::VappResult;

/// Execute the version command
pub async fn execute() -> VappResult<()> {
    println!("{}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
