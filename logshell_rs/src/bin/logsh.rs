//! The `logsh` binary: thin wrapper over the shared CLI entry point.

use logshell::cli::{self, EntryOptions};

fn main() {
    let opts = EntryOptions {
        binary_name: "logsh",
        usage: cli::USAGE,
    };
    match cli::run(&opts) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("logsh: {err:#}");
            std::process::exit(2);
        }
    }
}
