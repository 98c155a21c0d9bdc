use std::process::ExitCode;

fn main() -> ExitCode {
    pulse_lib::run()
}
