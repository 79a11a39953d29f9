pub mod build_info;

use std::error::Error;

use tracing_subscriber::{filter::Directive, fmt, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "purchase_tracker=info";

/// Builds the filter: `RUST_LOG`, the crate default, then any comma-separated
/// `extra` directives. Unparseable directives are reported and skipped.
pub fn env_filter(extra: Option<&str>) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env();
    for directive in std::iter::once(DEFAULT_DIRECTIVE)
        .chain(extra.into_iter().flat_map(|raw| raw.split(',')))
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
    {
        match directive.parse::<Directive>() {
            Ok(parsed) => filter = filter.add_directive(parsed),
            Err(err) => eprintln!("ignoring log directive `{directive}`: {err}"),
        }
    }
    filter
}

/// Installs the global fmt subscriber. Logs go to stderr so command output stays
/// clean. Fails when another subscriber is already installed.
pub fn init_tracing(extra: Option<&str>) -> Result<(), Box<dyn Error + Send + Sync>> {
    fmt()
        .with_env_filter(env_filter(extra))
        .with_writer(std::io::stderr)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_directives_are_skipped() {
        let filter = env_filter(Some("purchase_core=debug, purchase_config=loud,"));
        let rendered = filter.to_string();
        assert!(rendered.contains("purchase_tracker=info"), "{rendered}");
        assert!(rendered.contains("purchase_core=debug"), "{rendered}");
        assert!(!rendered.contains("loud"), "{rendered}");
    }
}
