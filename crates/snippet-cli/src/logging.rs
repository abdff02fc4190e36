//! Logging initialization.
//!
//! Library crates only emit `tracing` events; the binary decides where they go.

use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding an `EnvFilter` directive string.
pub const LOG_ENV: &str = "SNIPPETC_LOG";

/// Installs the global subscriber writing to stderr.
///
/// `verbosity` 0 keeps the `SNIPPETC_LOG` filter (default `warn`), 1 enables
/// debug output for the snippet crates, 2 or more enables trace.
pub fn init(verbosity: u8, json: bool) {
    let filter = filter(verbosity, std::env::var(LOG_ENV).ok().as_deref());
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(error) = result {
        eprintln!("Warning: logging already initialized: {error}");
    }
}

fn filter(verbosity: u8, directives: Option<&str>) -> EnvFilter {
    let base = directives
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new("warn"));
    let level = match verbosity {
        0 => return base,
        1 => "debug",
        _ => "trace",
    };
    ["snippet_cli", "snippet_transformer", "snippet_diagnostics", "snippet_runner", "snippetc"]
        .iter()
        .filter_map(|target| format!("{target}={level}").parse::<Directive>().ok())
        .fold(base, EnvFilter::add_directive)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(verbosity: u8, directives: Option<&str>) -> String {
        filter(verbosity, directives).to_string().to_lowercase()
    }

    #[test]
    fn test_default_filter_is_warn() {
        assert_eq!(rendered(0, None), "warn");
    }

    #[test]
    fn test_env_directives_are_kept() {
        assert_eq!(rendered(0, Some("snippet_runner=debug")), "snippet_runner=debug");
    }

    #[test]
    fn test_verbosity_raises_snippet_crates() {
        let debug = rendered(1, None);
        assert!(debug.contains("snippet_transformer=debug"));
        assert!(debug.contains("warn"));
        assert!(rendered(2, None).contains("snippet_runner=trace"));
    }
}
