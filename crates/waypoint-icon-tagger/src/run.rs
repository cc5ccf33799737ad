use crate::{metadata::log_version_info, settings::Settings};
use std::fmt::{self, Write as _};
use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use waypoint_icon_lib::{BatchDriver, Relabeler, Result};

/// Formats events as `thread::time::message`
pub struct ThreadTimeMessage;

impl<S, N> FormatEvent<S, N> for ThreadTimeMessage
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
        let thread = std::thread::current();
        write!(writer, "{}::", thread.name().unwrap_or("unnamed"))?;
        SystemTime.format_time(&mut writer)?;
        write!(writer, "::")?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Logging is fixed at debug level; `--verbose` does not change it
pub fn logging_dispatch() -> Dispatch {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .event_format(ThreadTimeMessage)
        .finish();
    Dispatch::new(subscriber)
}

/// Native entry point
pub fn native_main(settings: Settings, dispatch: Dispatch) -> Result<()> {
    let driver = BatchDriver::new(Relabeler::new(settings.catalog()), dispatch.clone());

    tracing::dispatcher::with_default(&dispatch, || {
        log_version_info();

        if settings.overwrite_symbol {
            tracing::debug!("--overwrite-symbol has no effect, all symbols are renumbered when any is missing");
        }
        if settings.verbose {
            tracing::debug!("--verbose has no effect, logging already runs at debug level");
        }

        match settings.target() {
            Some(target) => driver.run(&target).map(|_| ()),
            None => {
                tracing::debug!("Neither --working-directory nor --gpx-file given, nothing to do");
                Ok(())
            }
        }
    })
}
