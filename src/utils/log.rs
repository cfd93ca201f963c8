//! Logging utilities with colored module prefixes.
//!
//! Provides the `log!` macro for formatted terminal output:
//!
//! ```ignore
//! log!("build"; "processing {} units", count);
//! log!("error"; "{unit}: {err:#}");
//! ```

use colored::{ColoredString, Colorize};
use std::io::{Write, stderr, stdout};

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::utils::log::log($module, &format!($($arg)*))
    }};
}

/// Log a message with a colored module prefix.
///
/// Error messages go to stderr, everything else to stdout.
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    if module_lower == "error" {
        let mut stderr = stderr().lock();
        writeln!(stderr, "{prefix} {message}").ok();
    } else {
        let mut stdout = stdout().lock();
        writeln!(stdout, "{prefix} {message}").ok();
        stdout.flush().ok();
    }
}

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "upload" | "publish" => prefix.bright_blue().bold(),
        "archive" => prefix.bright_magenta().bold(),
        "error" => prefix.bright_red().bold(),
        "warn" => prefix.bright_cyan().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}
