use std::time::Instant;

use cap_std::fs_utf8::Dir;
use followme_api::HttpPositionSource;
use followme_map::HeadlessRenderer;
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing::{error, info};

pub(crate) mod history;
pub(crate) mod init;
pub(crate) mod scheduler;
mod trace;

use init::{get_followme_dir, FollowMeConfig};
use scheduler::PollScheduler;

/// Ties the position feed to the map.
pub struct FollowMe {
    config: FollowMeConfig,
    scheduler: PollScheduler<HttpPositionSource, HeadlessRenderer>,
}

impl FollowMe {
    fn new(fdir: &Dir) -> Result<Self> {
        let config = FollowMeConfig::load(fdir).wrap_err("failed to load followme config")?;
        let source =
            HttpPositionSource::new(&config.server, config.request_timeout(), config.retry)
                .into_diagnostic()
                .wrap_err_with(|| format!("invalid server url: {}", config.server))?;
        info!(url = %source.url(), ?config, "created position source");
        let scheduler =
            PollScheduler::new(source, HeadlessRenderer::new(), config.scheduler_config());
        Ok(Self { config, scheduler })
    }

    /// Runs the poll loop. Markers live until the process exits, so this never returns.
    fn run(&mut self) -> ! {
        let epoch = Instant::now();
        let frame_interval = self.config.frame_interval();
        self.scheduler.start(0.0);
        loop {
            self.scheduler.tick(epoch.elapsed().as_secs_f64());
            std::thread::sleep(frame_interval);
        }
    }
}

pub fn start_followme() {
    let fdir = match get_followme_dir() {
        Ok(fdir) => fdir,
        Err(e) => {
            eprintln!("failed to create followme dir: {e:#?}");
            panic!("failed to create followme_dir: {e:#?}");
        }
    };
    let log_file_flush_guard = match trace::install_tracing(&fdir) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("failed to install tracing: {e:#?}");
            panic!("failed to install tracing: {e:#?}");
        }
    };
    if let Err(e) = trace::install_miette_panic_hooks() {
        error!(?e, "failed to install panic hooks");
    }
    info!(
        "Application Name: {} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    match FollowMe::new(&fdir) {
        Ok(mut followme) => followme.run(),
        Err(e) => {
            error!(?e, "failed to create FollowMe app");
        }
    };
    std::mem::drop(log_file_flush_guard);
}
