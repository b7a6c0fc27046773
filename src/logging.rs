//! Log initialization and request-scoped log context.
//!
//! Every log line carries two contextual fields, client IP and session user
//! id, via a per-request [`tracing`] span opened by the dispatch pipeline.
//! Background tasks with no active request use [`worker_span`] so their
//! lines are still attributable.

use tracing::{Event, Level, Span, Subscriber};
use tracing_subscriber::fmt::format::{Format, Full, Writer};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::config::Config;

const TIME_FORMAT: &str = "%m%d%y-%H:%M:%S";

/// Initializes global log formatting: INFO level, compact timestamps, and a
/// `PROD ` line prefix when running a production configuration.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init(config: &Config) {
    let timer = ChronoLocal::new(TIME_FORMAT.to_owned());
    if config.is_production {
        let inner = Format::default().with_timer(timer);
        let _ = tracing_subscriber::fmt()
            .event_format(ProdFormat { inner })
            .with_max_level(Level::INFO)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_timer(timer)
            .with_max_level(Level::INFO)
            .try_init();
    }
}

/// The span the dispatch pipeline opens for one request. `ip` is the
/// literal `local` in local-dev mode; `uid` is the session's user id or
/// `anon`.
pub(crate) fn request_span(ip: &str, uid: &str) -> Span {
    tracing::info_span!("request", ip = %ip, uid = %uid)
}

/// A sentinel span for background workers, where no request context exists.
///
/// ```rust,no_run
/// use tracing::Instrument;
///
/// # async fn sweep() {}
/// # async fn demo() {
/// tokio::spawn(sweep().instrument(plinth::logging::worker_span()));
/// # }
/// ```
pub fn worker_span() -> Span {
    tracing::info_span!("worker", ip = "", uid = "-WORKER")
}

/// Prefixes every formatted event with `PROD `.
struct ProdFormat {
    inner: Format<Full, ChronoLocal>,
}

impl<S, N> FormatEvent<S, N> for ProdFormat
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
        use std::fmt::Write;

        writer.write_str("PROD ")?;
        self.inner.format_event(ctx, writer, event)
    }
}
