use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt as _,
    util::SubscriberInitExt as _,
};

/// Stdout logging, plus a rolling JSON file when LOG_DIR is set. The returned
/// guard must stay alive for the file writer to flush.
pub fn init() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = fmt::Layer::new()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_span_events(FmtSpan::CLOSE);

    let registry = tracing_subscriber::registry().with(filter).with(stdout_layer);

    match std::env::var("LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "stage_controller.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);

            registry
                .with(fmt::Layer::new().json().with_ansi(false).with_writer(writer))
                .init();

            Some(guard)
        }
        Err(_) => {
            registry.init();
            None
        }
    }
}
