use std::process::ExitCode;

use anyhow::Result;

fn main() -> Result<ExitCode> {
    compact_cli::main_entry()
}
