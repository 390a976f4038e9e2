use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directives derived from LOG_LEVEL.
/// sqlx logs every statement at info, which is noise for table scans.
fn directives(log_level: &str) -> String {
    format!("{log_level},sqlx=warn")
}

/// Initialize tracing subscriber with the specified format and level.
/// RUST_LOG, when set, replaces the LOG_LEVEL based filter entirely.
pub fn init(log_format: &str, log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(log_level)));

    let registry = tracing_subscriber::registry().with(env_filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .init();
    }
}
