use std::path::Path;
use tracing::{subscriber::set_global_default, Subscriber};
use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

/// Overrides the command line log level when set, using `EnvFilter` directive syntax
const LOG_ENV: &str = "TRANSPORTER_LOG";
/// The JSON log of a run, written next to `transport.json`
const LOG_FILE: &str = "transport.log";

/// Filter directives showing the solver crates at `level` and everything else at warnings only
fn directives(level: super::LogLevel) -> String {
    format!("warn,transporter_bte={level},transporter_mesher={level}")
}

/// Creates a subscriber which writes condition and carrier progress to `console::Term::stdout`
/// and a JSON record of every event, with its enclosing spans, to `transport.log` in the
/// results directory.
pub(crate) fn get_subscriber(
    level: super::LogLevel,
    results: &Path,
) -> (
    impl Subscriber + Send + Sync,
    tracing_appender::non_blocking::WorkerGuard,
) {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(directives(level)));

    let terminal_layer = tracing_subscriber::fmt::Layer::new()
        .with_writer(console::Term::stdout)
        .with_target(false)
        .without_time();

    let appender = tracing_appender::rolling::never(results, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let file_layer = tracing_subscriber::fmt::Layer::new()
        .with_writer(non_blocking)
        .json()
        .with_current_span(true)
        .with_span_list(true);

    (
        Registry::default()
            .with(env_filter)
            .with(terminal_layer)
            .with(file_layer),
        guard,
    )
}

pub(crate) fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> color_eyre::Result<()> {
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::directives;
    use crate::app::LogLevel;
    use tracing_subscriber::EnvFilter;

    #[test]
    fn dependencies_are_limited_to_warnings() {
        let filter = directives(LogLevel::Debug);
        assert_eq!(filter, "warn,transporter_bte=debug,transporter_mesher=debug");
        assert!(EnvFilter::try_new(&filter).is_ok());
        assert!(directives(LogLevel::Trace).contains("transporter_bte=trace"));
    }
}
