/*
 * This file is part of asus-ec-sensors.
 *
 * Copyright (C) 2025 asus-ec-sensors contributors
 *
 * asus-ec-sensors is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * asus-ec-sensors is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with asus-ec-sensors. If not, see <https://www.gnu.org/licenses/>.
 */

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ec_error::{EcError, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{paths, timing};
use crate::driver::DriverOptions;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "ASUS_EC_SENSORS_CONFIG";

fn default_update_interval_ms() -> u64 { timing::DEFAULT_TTL.as_millis() as u64 }
fn default_mutex_timeout_ms() -> u64 { timing::DEFAULT_MUTEX_TIMEOUT.as_millis() as u64 }
fn default_lock_timeout_ms() -> u64 { timing::DEFAULT_LOCK_TIMEOUT.as_millis() as u64 }
fn default_ec_io_path() -> PathBuf { PathBuf::from(paths::EC_SYS_IO) }
fn default_log_level() -> String { "info".to_string() }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// How long cached readings are served before the EC is read again
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
    #[serde(default = "default_mutex_timeout_ms")]
    pub mutex_timeout_ms: u64,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    #[serde(default = "default_ec_io_path")]
    pub ec_io_path: PathBuf,
    /// Board name to use instead of DMI identification
    #[serde(default)]
    pub board: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            update_interval_ms: default_update_interval_ms(),
            mutex_timeout_ms: default_mutex_timeout_ms(),
            lock_timeout_ms: default_lock_timeout_ms(),
            ec_io_path: default_ec_io_path(),
            board: None,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    pub fn driver_options(&self) -> DriverOptions {
        DriverOptions {
            ttl: Duration::from_millis(self.update_interval_ms),
            mutex_timeout: Duration::from_millis(self.mutex_timeout_ms),
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
        }
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(explicit) = env::var(CONFIG_ENV) {
        if !explicit.is_empty() {
            return PathBuf::from(explicit);
        }
    }
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join(paths::CONFIG_DIR_NAME).join(paths::CONFIG_FILE);
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join(paths::CONFIG_DIR_NAME).join(paths::CONFIG_FILE);
    }
    PathBuf::from(paths::SYSTEM_CONFIG)
}

/// Load and validate settings. A missing file yields the defaults.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Settings::default()),
        Err(source) => {
            return Err(EcError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let settings: Settings = serde_json::from_str(&data)?;
    validate_settings(&settings)?;
    Ok(settings)
}

pub fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.update_interval_ms == 0 {
        return Err(EcError::invalid_config("update_interval_ms", "must be greater than 0"));
    }
    if settings.mutex_timeout_ms == 0 {
        return Err(EcError::invalid_config("mutex_timeout_ms", "must be greater than 0"));
    }
    if settings.lock_timeout_ms < settings.mutex_timeout_ms {
        return Err(EcError::invalid_config(
            "lock_timeout_ms",
            format!(
                "must be at least mutex_timeout_ms ({}), got {}",
                settings.mutex_timeout_ms, settings.lock_timeout_ms
            ),
        ));
    }
    if settings.ec_io_path.as_os_str().is_empty() {
        return Err(EcError::invalid_config("ec_io_path", "must not be empty"));
    }
    if let Some(board) = &settings.board {
        if board.trim().is_empty() {
            return Err(EcError::invalid_config("board", "must not be blank"));
        }
    }
    Ok(())
}
