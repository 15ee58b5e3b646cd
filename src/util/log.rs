//! Logging setup and the native-context message convention.

use tracing_subscriber::fmt::time::Uptime;
use tracing_subscriber::EnvFilter;

use crate::core::language::Language;

/// Format a log message, marking messages that come from native tooling.
///
/// Native-context messages are prefixed with the language in parentheses,
/// e.g. `(C++) threept.cpp: warning: unused variable`.
pub fn native_message(message: &str, native: bool, lang: Language) -> String {
    if native {
        format!("({}) {}", lang.display_name(), message)
    } else {
        message.to_string()
    }
}

/// Install the global subscriber.
///
/// Timestamps are the elapsed time since start-up.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("extforge=debug")
    } else {
        EnvFilter::new("extforge=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(Uptime::default())
        .with_writer(std::io::stderr)
        .init();
}
