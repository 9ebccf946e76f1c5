//! `tracing` setup driven by [`Settings`](crate::settings::Settings).

use crate::settings::Settings;

/// Installs the global tracing subscriber.
///
/// The filter comes from `settings.log_level` and falls back to `info` when
/// it does not parse. Debug mode prints pretty, human-readable events; any
/// other mode emits one JSON object per line. A subscriber that is already
/// installed is left in place, so tests may call this repeatedly.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a span grouping the statements issued by one exercise function.
///
/// # Examples
///
/// ```
/// use query_lab_core::logging::exercise_span;
///
/// let span = exercise_span("get_top_director");
/// let _guard = span.enter();
/// tracing::info!("running");
/// ```
pub fn exercise_span(name: &str) -> tracing::Span {
    tracing::info_span!("exercise", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_twice_is_harmless() {
        let mut settings = Settings::default();
        settings.log_level = "not a [valid filter".to_string();
        setup_logging(&settings);
        settings.debug = false;
        setup_logging(&settings);
    }

    #[test]
    fn test_exercise_span_enters() {
        let span = exercise_span("increase_rating");
        let _guard = span.enter();
        tracing::debug!("inside span");
    }
}
