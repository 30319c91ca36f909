use std::process::ExitCode;

mod app;
mod interactive;
mod logging;

fn main() -> ExitCode {
    let args = lms_move::cli::parse();
    app::run(args)
}
