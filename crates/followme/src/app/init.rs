use std::time::Duration;

use cap_std::{ambient_authority, fs_utf8::camino::Utf8PathBuf, fs_utf8::Dir};
use followme_api::RetryPolicy;
use miette::{Context, IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use super::scheduler::SchedulerConfig;

/// FollowMe data directory
/// We will read a path from env `FOLLOWME_DATA_DIR` or create a folder at data_local_dir/followme, where data_local_dir is platform specific
/// Inside this directory, we store the configuration file and logs.
pub fn get_followme_dir() -> Result<Dir> {
    let authoratah = ambient_authority();
    let fdir = if let Ok(env_dir) = std::env::var("FOLLOWME_DATA_DIR") {
        let fm_path = Utf8PathBuf::try_from(std::path::PathBuf::from(&env_dir))
            .into_diagnostic()
            .wrap_err(env_dir)
            .wrap_err("failed to parse FOLLOWME_DATA_DIR")?;

        Dir::create_ambient_dir_all(&fm_path, authoratah)
            .into_diagnostic()
            .wrap_err(fm_path.clone())
            .wrap_err("failed to create followme directory")?;
        Dir::open_ambient_dir(&fm_path, authoratah)
            .into_diagnostic()
            .wrap_err(fm_path)
            .wrap_err("failed to open followme data dir")?
    } else {
        let dir = cap_directories::ProjectDirs::from("com.followme", "", "followme", authoratah)
            .ok_or(miette::miette!(
                "getting project dirs failed for some reason"
            ))?
            .data_local_dir()
            .into_diagnostic()
            .wrap_err("failed to get data local dir using capstd")?;
        Dir::from_cap_std(dir)
    };
    Ok(fdir)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowMeConfig {
    /// base url of the followme server. `position` is resolved against it
    pub server: Url,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub retry: RetryPolicy,
    pub discard_stale_responses: bool,
    /// how long the main loop sleeps between scheduler ticks
    pub frame_interval_ms: u64,
}

impl Default for FollowMeConfig {
    fn default() -> Self {
        Self {
            server: Url::parse(Self::DEFAULT_SERVER).expect("default server url must be valid"),
            poll_interval_ms: 100,
            request_timeout_ms: 5000,
            retry: RetryPolicy::default(),
            discard_stale_responses: false,
            frame_interval_ms: 10,
        }
    }
}

impl FollowMeConfig {
    pub const CONFIG_FILE_NAME: &'static str = "followme_config.json";
    const DEFAULT_SERVER: &'static str = "http://localhost:5000/";
    /// env var that points to a config file to use instead of the one in the data dir
    pub const SETTINGS_ENV: &'static str = "FOLLOWME_SETTINGS";

    /// Loads the config from `FOLLOWME_SETTINGS` if set.
    /// Otherwise from the data dir, writing the defaults there on first run.
    pub fn load(fdir: &Dir) -> Result<Self> {
        let json = if let Ok(path) = std::env::var(Self::SETTINGS_ENV) {
            info!(%path, "loading config from {}", Self::SETTINGS_ENV);
            std::fs::read_to_string(&path)
                .into_diagnostic()
                .wrap_err(path)
                .wrap_err("failed to read settings file")?
        } else {
            if !fdir.exists(Self::CONFIG_FILE_NAME) {
                fdir.write(
                    Self::CONFIG_FILE_NAME,
                    serde_json::to_string_pretty(&Self::default())
                        .into_diagnostic()
                        .wrap_err("failed to serialize default config")?
                        .as_bytes(),
                )
                .into_diagnostic()
                .wrap_err("failed to write default config file")?;
            }
            fdir.read_to_string(Self::CONFIG_FILE_NAME)
                .into_diagnostic()
                .wrap_err("failed to read config file")?
        };
        serde_json::from_str(&json)
            .into_diagnostic()
            .wrap_err("failed to deserialize config")
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            discard_stale_responses: self.discard_stale_responses,
        }
    }
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}
