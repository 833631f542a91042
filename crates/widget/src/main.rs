use std::env;
use std::process::ExitCode;

mod app;

fn main() -> ExitCode {
    let args = env::args().skip(1).collect::<Vec<_>>();
    app::run(&args)
}
