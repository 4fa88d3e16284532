//! Status lines for the person running the scan.
//!
//! Everything here goes to stderr: stdout is reserved for the scan summary
//! so it can be piped into other tools untouched.

/// A problem worth telling the user about, prefixed with a red `[!]`.
#[macro_export]
macro_rules! warning {
    ($name:expr) => {
        eprintln!("{} {}", ::ansi_term::Colour::Red.bold().paint("[!]"), $name);
    };
    ($name:expr, $greppable:expr, $accessible:expr) => {
        // greppable mode keeps stderr quiet too
        if !$greppable {
            if $accessible {
                eprintln!("{}", $name);
            } else {
                eprintln!("{} {}", ::ansi_term::Colour::Red.bold().paint("[!]"), $name);
            }
        }
    };
}

/// Progress and configuration details, prefixed with a blue `[~]`.
#[macro_export]
macro_rules! detail {
    ($name:expr) => {
        eprintln!("{} {}", ::ansi_term::Colour::Blue.bold().paint("[~]"), $name);
    };
    ($name:expr, $greppable:expr, $accessible:expr) => {
        if !$greppable {
            if $accessible {
                eprintln!("{}", $name);
            } else {
                eprintln!("{} {}", ::ansi_term::Colour::Blue.bold().paint("[~]"), $name);
            }
        }
    };
}

/// Findings, prefixed with a green `[>]`.
#[macro_export]
macro_rules! output {
    ($name:expr) => {
        eprintln!(
            "{} {}",
            ::ansi_term::Colour::RGB(0, 255, 9).bold().paint("[>]"),
            $name
        );
    };
    ($name:expr, $greppable:expr, $accessible:expr) => {
        if !$greppable {
            if $accessible {
                eprintln!("{}", $name);
            } else {
                eprintln!(
                    "{} {}",
                    ::ansi_term::Colour::RGB(0, 255, 9).bold().paint("[>]"),
                    $name
                );
            }
        }
    };
}
