//! Example concatenation CLI.
//!
//! Concatenates files inside a working directory. The output is only
//! written when every input was read.
//!
//! # Usage
//!
//! ```bash
//! concat <working_dir> <output> <input>...
//! ```
//!
//! # Example
//!
//! ```bash
//! RUST_LOG=debug concat ./sandbox joined.txt a.txt b.txt
//! ```

use contexter_tracing::{TracingFormat, TracingSetup};
use example::{Concat, Sandbox};
use std::path::PathBuf;
use std::process::ExitCode;

#[expect(clippy::print_stderr, reason = "CLI usage and failure output")]
fn main() -> ExitCode {
    let mut setup = TracingSetup::new().with_format(TracingFormat::Compact);
    if let Ok(filter) = std::env::var("RUST_LOG") {
        setup = setup.with_env_filter(filter);
    }
    setup.init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: <working_dir> <output> <input>...");
        eprintln!("Example: ./sandbox joined.txt a.txt b.txt");
        return ExitCode::FAILURE;
    }

    let working_dir = PathBuf::from(&args[1]);
    if !working_dir.is_dir() {
        eprintln!("Error: {} is not a directory", working_dir.display());
        return ExitCode::FAILURE;
    }

    let working_dir = match working_dir.canonicalize() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!(
                "Error: cannot canonicalize {}: {}",
                working_dir.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    };

    let inputs: Vec<&str> = args[3..].iter().map(String::as_str).collect();
    match Concat::new(Sandbox::new(working_dir)).run(&args[2], &inputs) {
        Ok(written) => {
            tracing::info!(output = %args[2], bytes = written, "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
