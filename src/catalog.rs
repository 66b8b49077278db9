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

//! Sensor catalog
//!
//! Every sensor known to live in an ASUS EC, with its label, kind and
//! register address. Entries are laid out in ascending (bank, index) order
//! and [`SensorId`] discriminants index into [`CATALOG`].

use serde::Serialize;

use crate::constants::units;

/// What a sensor measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Temperature,
    Fan,
    Current,
    Voltage,
}

impl SensorKind {
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Temperature,
        SensorKind::Fan,
        SensorKind::Current,
        SensorKind::Voltage,
    ];

    /// Unit of the raw register value
    pub const fn unit(self) -> &'static str {
        match self {
            SensorKind::Temperature => "°C",
            SensorKind::Fan => "RPM",
            SensorKind::Current => "A",
            SensorKind::Voltage => "V",
        }
    }

    /// hwmon attribute prefix (`temp1_input`, `fan2_label`, ...)
    pub const fn hwmon_prefix(self) -> &'static str {
        match self {
            SensorKind::Temperature => "temp",
            SensorKind::Fan => "fan",
            SensorKind::Current => "curr",
            SensorKind::Voltage => "in",
        }
    }

    /// Convert a raw reading into what the reporting interface expects:
    /// milli-units for temperature, current and voltage, plain RPM for fans.
    pub fn scale(self, raw: u32) -> i64 {
        match self {
            SensorKind::Temperature | SensorKind::Current | SensorKind::Voltage => {
                i64::from(raw) * units::MILLI
            }
            SensorKind::Fan => i64::from(raw),
        }
    }
}

/// Absolute register number: `bank << 8 | index`.
pub type Register = u16;

pub const fn make_register(bank: u8, index: u8) -> Register {
    ((bank as u16) << 8) | index as u16
}

pub const fn register_bank(reg: Register) -> u8 {
    (reg >> 8) as u8
}

pub const fn register_index(reg: Register) -> u8 {
    (reg & 0x00ff) as u8
}

/// Where a sensor value starts in the EC register space. `size` consecutive
/// registers from `index` within `bank` hold the value, big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorAddress {
    size: u8,
    bank: u8,
    index: u8,
}

impl SensorAddress {
    pub const fn new(size: u8, bank: u8, index: u8) -> Self {
        Self { size, bank, index }
    }

    pub const fn size(&self) -> usize {
        self.size as usize
    }

    pub const fn bank(&self) -> u8 {
        self.bank
    }

    pub const fn index(&self) -> u8 {
        self.index
    }

    /// The absolute registers holding this value, most significant first.
    pub fn registers(&self) -> impl Iterator<Item = Register> + '_ {
        (0..self.size).map(move |offset| make_register(self.bank, self.index.wrapping_add(offset)))
    }
}

/// One entry of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorDefinition {
    pub label: &'static str,
    pub kind: SensorKind,
    pub address: SensorAddress,
}

impl SensorDefinition {
    pub const fn new(label: &'static str, kind: SensorKind, size: u8, bank: u8, index: u8) -> Self {
        Self {
            label,
            kind,
            address: SensorAddress::new(size, bank, index),
        }
    }
}

/// Stable catalog ids. The discriminant is the catalog index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum SensorId {
    TempChipset = 0,
    TempCpu,
    TempMotherboard,
    TempTSensor,
    TempVrm,
    FanCpuOpt,
    FanVrmHs,
    FanChipset,
    FanWaterFlow,
    CurrCpu,
    TempWaterIn,
    TempWaterOut,
}

impl SensorId {
    pub const ALL: [SensorId; 12] = [
        SensorId::TempChipset,
        SensorId::TempCpu,
        SensorId::TempMotherboard,
        SensorId::TempTSensor,
        SensorId::TempVrm,
        SensorId::FanCpuOpt,
        SensorId::FanVrmHs,
        SensorId::FanChipset,
        SensorId::FanWaterFlow,
        SensorId::CurrCpu,
        SensorId::TempWaterIn,
        SensorId::TempWaterOut,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn definition(self) -> &'static SensorDefinition {
        &CATALOG[self.index()]
    }
}

/// All sensors known for ASUS EC controllers.
pub static CATALOG: [SensorDefinition; 12] = [
    SensorDefinition::new("Chipset", SensorKind::Temperature, 1, 0x00, 0x3a),
    SensorDefinition::new("CPU", SensorKind::Temperature, 1, 0x00, 0x3b),
    SensorDefinition::new("Motherboard", SensorKind::Temperature, 1, 0x00, 0x3c),
    SensorDefinition::new("T_Sensor", SensorKind::Temperature, 1, 0x00, 0x3d),
    SensorDefinition::new("VRM", SensorKind::Temperature, 1, 0x00, 0x3e),
    SensorDefinition::new("CPU_Opt", SensorKind::Fan, 2, 0x00, 0xb0),
    SensorDefinition::new("VRM HS", SensorKind::Fan, 2, 0x00, 0xb2),
    SensorDefinition::new("Chipset", SensorKind::Fan, 2, 0x00, 0xb4),
    SensorDefinition::new("Water_Flow", SensorKind::Fan, 2, 0x00, 0xbc),
    SensorDefinition::new("CPU", SensorKind::Current, 1, 0x00, 0xf4),
    SensorDefinition::new("Water_In", SensorKind::Temperature, 1, 0x01, 0x00),
    SensorDefinition::new("Water_Out", SensorKind::Temperature, 1, 0x01, 0x01),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_index_catalog() {
        assert_eq!(SensorId::ALL.len(), CATALOG.len());
        for (i, id) in SensorId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
        assert_eq!(SensorId::TempCpu.definition().address.index(), 0x3b);
        assert_eq!(SensorId::TempWaterOut.definition().address.bank(), 1);
    }

    #[test]
    fn test_scale() {
        assert_eq!(SensorKind::Temperature.scale(42), 42_000);
        assert_eq!(SensorKind::Current.scale(7), 7_000);
        assert_eq!(SensorKind::Voltage.scale(1), 1_000);
        assert_eq!(SensorKind::Fan.scale(1450), 1450);
        assert_eq!(SensorKind::Fan.scale(u32::MAX), i64::from(u32::MAX));
    }

    #[test]
    fn test_address_registers() {
        let addr = SensorAddress::new(2, 0x00, 0xb0);
        let regs: Vec<Register> = addr.registers().collect();
        assert_eq!(regs, vec![0x00b0, 0x00b1]);

        let addr = SensorAddress::new(1, 0x01, 0x01);
        let regs: Vec<Register> = addr.registers().collect();
        assert_eq!(regs, vec![0x0101]);
    }

    #[test]
    fn test_register_split() {
        let reg = make_register(0x02, 0x3c);
        assert_eq!(reg, 0x023c);
        assert_eq!(register_bank(reg), 0x02);
        assert_eq!(register_index(reg), 0x3c);
    }
}
