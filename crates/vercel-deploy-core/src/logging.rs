//! Logging configuration
//!
//! Events are written to stdout as GitHub Actions workflow commands so
//! warnings and errors show up as annotations on the run.

use crate::error::{Error, Result};
use crate::output::format::escape_data;
use std::fmt::Write as _;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Event formatter producing `::debug::`, `::warning::` and `::error::` lines
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowCommandFormat;

impl<S, N> FormatEvent<S, N> for WorkflowCommandFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut message = String::new();
        ctx.format_fields(Writer::new(&mut message), event)?;

        match *event.metadata().level() {
            Level::ERROR => writeln!(writer, "::error::{}", escape_data(&message)),
            Level::WARN => writeln!(writer, "::warning::{}", escape_data(&message)),
            Level::INFO => writeln!(writer, "{}", message),
            _ => writeln!(writer, "::debug::{}", escape_data(&message)),
        }
    }
}

/// Pick the default filter: explicit level, else `debug` when the
/// runner has step debugging on, else `info`
pub fn default_directive(level: Option<&str>) -> String {
    if let Some(level) = level.filter(|l| !l.is_empty()) {
        return level.to_string();
    }
    match std::env::var("RUNNER_DEBUG").as_deref() {
        Ok("1") => "debug".to_string(),
        _ => "info".to_string(),
    }
}

/// Initialize the global subscriber
///
/// `RUST_LOG` wins over `level` when set.
pub fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(WorkflowCommandFormat)
                .with_writer(std::io::stdout),
        )
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

/// Render an error as the run's failure annotation
pub fn failure_line(message: &str) -> String {
    format!("::error::{}", escape_data(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let buf = Buffer::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::new("trace"))
            .with(
                tracing_subscriber::fmt::layer()
                    .event_format(WorkflowCommandFormat)
                    .with_writer(move || writer.clone()),
            );
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_levels_map_to_workflow_commands() {
        let out = capture(|| {
            tracing::info!("Creating deployment with Vercel CLI");
            tracing::warn!("PR is from fork");
            tracing::error!("Failed to add labels");
            tracing::debug!("EXEC: vercel");
        });
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Creating deployment with Vercel CLI",
                "::warning::PR is from fork",
                "::error::Failed to add labels",
                "::debug::EXEC: vercel",
            ]
        );
    }

    #[test]
    fn test_multiline_warning_escaped() {
        let out = capture(|| tracing::warn!("line one\nline two"));
        assert_eq!(out, "::warning::line one%0Aline two\n");
    }

    #[test]
    fn test_failure_line() {
        assert_eq!(failure_line("100% broken\n"), "::error::100%25 broken%0A");
    }

    #[test]
    fn test_explicit_level_wins() {
        assert_eq!(default_directive(Some("warn")), "warn");
    }
}
