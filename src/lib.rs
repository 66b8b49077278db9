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

//! asus-ec-sensors - sensor readings from ASUS motherboard embedded controllers
//!
//! Several ASUS boards keep temperatures, fan speeds and CPU current in
//! banked EC registers that platform firmware reads too. This library knows
//! which sensors each board has and where they live, reads them in one
//! guarded sweep per refresh, and serves cached, scaled values through an
//! hwmon-shaped interface.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use asus_ec_sensors::{BoardId, DriverOptions, EcSensors, EcSysIo, NoAcpiMutex, SensorKind};
//!
//! let board = BoardId::identify("ASUSTeK COMPUTER INC.", "ROG CROSSHAIR VIII HERO").unwrap();
//! let io = EcSysIo::open("/sys/kernel/debug/ec/ec0/io").unwrap();
//! let driver = EcSensors::new(board, Box::new(io), Arc::new(NoAcpiMutex), DriverOptions::default()).unwrap();
//! let cpu_millidegrees = driver.read(SensorKind::Temperature, 1).unwrap();
//! ```

pub mod block_read;
pub mod boards;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod driver;
pub mod hwmon;
pub mod io;
pub mod logger;
pub mod sensor_map;
pub mod system;

pub use block_read::{block_read, AccessGuard, BlockReadStats};
pub use boards::{board_profiles, validate_builtin_tables, validate_tables, BoardId, BoardProfile, SensorSet};
pub use cache::{decode_value, Clock, SensorCache, SystemClock};
pub use catalog::{SensorAddress, SensorDefinition, SensorId, SensorKind, CATALOG};
pub use driver::{DriverOptions, EcSensors, Reading};
pub use hwmon::{Attribute, ChannelInfo, HwmonType};
pub use io::{EcIo, EcSysIo, HwAccessMutex, NoAcpiMutex};
pub use sensor_map::{MappedSensor, SensorMap};

pub use ec_error::{EcError, Result};
