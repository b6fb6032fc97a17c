//! Error output for the command line

use std::error::Error;

/// Print an error followed by its chain of causes
pub fn print_error(e: &dyn Error) {
    eprintln!("error: {}", e);
    for cause in causes(e) {
        eprintln!("  caused by: {}", cause);
    }
}

fn causes(e: &dyn Error) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = e.source();
    while let Some(cause) = current {
        out.push(cause.to_string());
        current = cause.source();
    }
    out
}
