use cap_std::fs_utf8::Dir;
use miette::{Context, IntoDiagnostic, Result};

pub const LOG_FILE_NAME: &str = "followme.log";

/// Installs the global subscriber. Logs go to `followme.log` inside the data dir.
/// The filter is read from `FOLLOWME_LOG`, using the usual `EnvFilter` syntax.
/// Keep the returned guard alive for as long as logs should be flushed.
pub fn install_tracing(followme_dir: &Dir) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};
    // get the log level
    let filter_layer = EnvFilter::try_from_env("FOLLOWME_LOG")
        .or_else(|_| EnvFilter::try_new("info"))
        .into_diagnostic()
        .wrap_err("failed to create log filter")?;
    // create log file in the data dir. This will also serve as a check that the directory is "writeable" by us
    let writer = std::io::BufWriter::new(
        followme_dir
            .create(LOG_FILE_NAME)
            .into_diagnostic()
            .wrap_err("failed to create followme.log file")?,
    );
    let (nb, guard) = tracing_appender::non_blocking(writer);
    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(nb);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
    Ok(guard)
}

/// Routes miette reports and panics into the log, so that a crash leaves a trace in `followme.log`.
pub fn install_miette_panic_hooks() -> Result<()> {
    miette::set_hook(Box::new(
        |_: &(dyn miette::Diagnostic + 'static)| -> Box<dyn miette::ReportHandler> {
            Box::new(miette::NarratableReportHandler::new())
        },
    ))
    .wrap_err("failed to install miette hook")?;

    #[derive(Debug, thiserror::Error, miette::Diagnostic)]
    #[error("{0}")]
    #[diagnostic(help("set the `RUST_BACKTRACE=1` environment variable to display a backtrace."))]
    struct Panic(String);

    std::panic::set_hook(Box::new(|panic_info| {
        let mut message = "Something went wrong".to_string();
        let payload = panic_info.payload();
        if let Some(msg) = payload.downcast_ref::<&str>() {
            message = msg.to_string();
        }
        if let Some(msg) = payload.downcast_ref::<String>() {
            message = msg.clone();
        }
        let mut report: Result<()> = Err(Panic(message).into());
        if let Some(loc) = panic_info.location() {
            report = report
                .with_context(|| format!("at {}:{}:{}", loc.file(), loc.line(), loc.column()));
        }
        let thread = std::thread::current()
            .name()
            .unwrap_or("<unnamed>")
            .to_string();
        if let Err(err) = report.with_context(|| format!("thread '{thread}' panicked.")) {
            eprintln!("Error: {:?}", err);
            tracing::error!("crashing: {:?}", &err);
        }
    }));
    Ok(())
}
