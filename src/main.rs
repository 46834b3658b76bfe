use clap::Parser;
use silkroad::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
