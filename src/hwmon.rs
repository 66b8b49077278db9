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

//! hwmon-style reporting surface
//!
//! Channel enumeration, visibility, numeric reads and labels in the shape
//! the Linux hwmon core expects. A `chip` channel carrying the
//! register-thermal-zone flag is added whenever the board has at least one
//! temperature sensor.

use ec_error::{EcError, Result};
use serde::Serialize;

use crate::catalog::SensorKind;
use crate::driver::EcSensors;

/// hwmon channel types used by this driver, in hwmon core order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HwmonType {
    Chip,
    Temp,
    In,
    Curr,
    Fan,
}

impl HwmonType {
    pub const ALL: [HwmonType; 5] = [
        HwmonType::Chip,
        HwmonType::Temp,
        HwmonType::In,
        HwmonType::Curr,
        HwmonType::Fan,
    ];

    pub fn from_kind(kind: SensorKind) -> Self {
        match kind {
            SensorKind::Temperature => HwmonType::Temp,
            SensorKind::Voltage => HwmonType::In,
            SensorKind::Current => HwmonType::Curr,
            SensorKind::Fan => HwmonType::Fan,
        }
    }

    /// The sensor kind behind this channel type; `None` for `chip`.
    pub fn kind(self) -> Option<SensorKind> {
        match self {
            HwmonType::Chip => None,
            HwmonType::Temp => Some(SensorKind::Temperature),
            HwmonType::In => Some(SensorKind::Voltage),
            HwmonType::Curr => Some(SensorKind::Current),
            HwmonType::Fan => Some(SensorKind::Fan),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HwmonType::Chip => "chip",
            HwmonType::Temp => "temp",
            HwmonType::In => "in",
            HwmonType::Curr => "curr",
            HwmonType::Fan => "fan",
        }
    }

    /// Attribute flags every channel of this type carries
    pub fn config(self) -> u32 {
        match self {
            HwmonType::Chip => Attribute::RegisterTz.flag(),
            _ => Attribute::Input.flag() | Attribute::Label.flag(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Input,
    Label,
    RegisterTz,
}

impl Attribute {
    pub fn flag(self) -> u32 {
        match self {
            Attribute::Input => 1 << 0,
            Attribute::Label => 1 << 1,
            Attribute::RegisterTz => 1 << 2,
        }
    }
}

/// Channels of one type and their attribute flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelInfo {
    pub ty: HwmonType,
    pub config: Vec<u32>,
}

impl ChannelInfo {
    pub fn count(&self) -> usize {
        self.config.len()
    }
}

impl EcSensors {
    fn channel_count(&self, ty: HwmonType) -> usize {
        match ty.kind() {
            Some(kind) => self.sensor_map().count_of(kind),
            None => usize::from(self.sensor_map().count_of(SensorKind::Temperature) > 0),
        }
    }

    /// Present channel types with one config word per channel. Types with no
    /// channels are left out.
    pub fn channel_info(&self) -> Vec<ChannelInfo> {
        HwmonType::ALL
            .iter()
            .filter_map(|&ty| {
                let count = self.channel_count(ty);
                (count > 0).then(|| ChannelInfo {
                    ty,
                    config: vec![ty.config(); count],
                })
            })
            .collect()
    }

    /// Whether `attr` of channel `channel` exists (read-only when it does).
    pub fn is_visible(&self, ty: HwmonType, attr: Attribute, channel: usize) -> bool {
        if ty.config() & attr.flag() == 0 {
            return false;
        }
        channel < self.channel_count(ty)
    }

    /// Numeric attribute read, scaled for hwmon.
    pub fn hwmon_read(&self, ty: HwmonType, attr: Attribute, channel: usize) -> Result<i64> {
        match (ty.kind(), attr) {
            (Some(kind), Attribute::Input) => self.read(kind, channel),
            _ => Err(EcError::SensorNotFound {
                kind: ty.name(),
                channel,
            }),
        }
    }

    /// String attribute read (labels).
    pub fn hwmon_read_string(&self, ty: HwmonType, attr: Attribute, channel: usize) -> Result<&'static str> {
        match (ty.kind(), attr) {
            (Some(kind), Attribute::Label) => self.label(kind, channel),
            _ => Err(EcError::SensorNotFound {
                kind: ty.name(),
                channel,
            }),
        }
    }
}
