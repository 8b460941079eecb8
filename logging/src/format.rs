//! The gblibx log line format and duration rendering.
//!
//! Every event renders as `<L>-<ddmmmyy-HH:MM:SS>: <message> [fields]`,
//! e.g. `W-17sep19-10:02:35: disk almost full free_mb=12`.

use std::fmt;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::LogLevel;

/// Timestamp as it appears in log lines: `17sep19-10:02:35`.
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format("%d%b%y-%H:%M:%S").to_string().to_lowercase()
}

/// A complete log line, without the trailing newline.
pub fn format_line(level: LogLevel, at: NaiveDateTime, message: &str) -> String {
    format!("{}-{}: {message}", level.letter(), format_timestamp(at))
}

/// `H:MM:SS`; hours are not capped.
///
/// ```
/// use std::time::Duration;
/// use gblibx_logging::format_hhmmss;
///
/// assert_eq!(format_hhmmss(Duration::from_secs(3 * 3600 + 62)), "3:01:02");
/// assert_eq!(format_hhmmss(Duration::from_secs(100 * 3600)), "100:00:00");
/// ```
pub fn format_hhmmss(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

/// `Dd:HH:MM:SS` once the duration reaches a day, else [`format_hhmmss`].
pub fn format_ddhhmmss(duration: Duration) -> String {
    const DAY: u64 = 24 * 3600;
    let secs = duration.as_secs();
    if secs < DAY {
        return format_hhmmss(duration);
    }
    format!(
        "{}d:{:02}:{:02}:{:02}",
        secs / DAY,
        secs % DAY / 3600,
        secs / 60 % 60,
        secs % 60
    )
}

/// [`FormatEvent`] producing the gblibx line format with local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct GbxFormat;

impl<S, N> FormatEvent<S, N> for GbxFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let level = LogLevel::from(*event.metadata().level());
        write!(
            writer,
            "{}-{}: ",
            level.letter(),
            format_timestamp(Local::now().naive_local())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
