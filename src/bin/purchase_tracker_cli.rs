use purchase_tracker::cli::{output, run_cli};

fn main() {
    match run_cli() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            output::error(&err);
            std::process::exit(1);
        }
    }
}
