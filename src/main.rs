use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Some(path) = std::env::var_os("FERRUM_LOG") {
        if let Err(err) = ferrum::uci::logger::init(Path::new(&path)) {
            eprintln!("could not open log file: {err}");
        }
    }

    ferrum::uci::run()
}
