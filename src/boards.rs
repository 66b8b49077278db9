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

//! Board profiles
//!
//! Which catalog sensors each supported board exposes, the hardware access
//! mutex its firmware uses, and DMI based identification.

use std::collections::HashMap;
use std::fmt;

use ec_error::{EcError, Result};
use lazy_static::lazy_static;

use crate::catalog::{SensorDefinition, SensorId, CATALOG};
use crate::constants::{acpi, dmi, ec};

/// Fixed-size set of catalog indices. Iteration is ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorSet(u32);

impl SensorSet {
    /// Largest catalog a set can address
    pub const CAPACITY: usize = 32;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn of(ids: &[SensorId]) -> Self {
        let mut set = Self::empty();
        let mut i = 0;
        while i < ids.len() {
            set = set.with_index(ids[i] as usize);
            i += 1;
        }
        set
    }

    /// # Panics
    ///
    /// If `index` is not below [`Self::CAPACITY`]. In a `static` initializer
    /// that is a compile error.
    pub const fn with_index(self, index: usize) -> Self {
        assert!(index < Self::CAPACITY, "sensor index beyond set capacity");
        Self(self.0 | (1u32 << index))
    }

    /// Build a set from runtime indices, rejecting any the set cannot hold.
    pub fn from_indices(indices: &[usize]) -> Result<Self> {
        indices.iter().try_fold(Self::empty(), |set, &i| {
            if i < Self::CAPACITY {
                Ok(set.with_index(i))
            } else {
                Err(EcError::TableIntegrity(format!(
                    "sensor index {} exceeds set capacity {}",
                    i,
                    Self::CAPACITY
                )))
            }
        })
    }

    pub fn insert(&mut self, id: SensorId) {
        *self = self.with_index(id.index());
    }

    pub const fn contains_index(&self, index: usize) -> bool {
        index < Self::CAPACITY && self.0 & (1u32 << index) != 0
    }

    pub const fn contains(&self, id: SensorId) -> bool {
        self.contains_index(id as usize)
    }

    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..Self::CAPACITY).filter(move |&i| self.contains_index(i))
    }
}

/// Supported boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardId {
    ProWsX570Ace,
    RogCrosshairViiiDarkHero,
    RogCrosshairViiiFormula,
    RogCrosshairViiiHero,
    RogCrosshairViiiImpact,
    RogStrixB550EGaming,
    RogStrixB550IGaming,
    RogStrixX570EGaming,
}

/// Static description of one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardProfile {
    /// Exact DMI board name
    pub name: &'static str,
    pub supported: SensorSet,
    pub mutex_name: &'static str,
}

use SensorId::*;

// Hero and its derivatives share most of the layout.
const C8_COMMON: [SensorId; 9] = [
    TempChipset, TempCpu, TempMotherboard, TempTSensor, TempVrm,
    TempWaterIn, TempWaterOut, FanCpuOpt, CurrCpu,
];

static BOARD_PROFILES: [BoardProfile; 8] = [
    BoardProfile {
        name: "Pro WS X570-ACE",
        supported: SensorSet::of(&[
            TempChipset, TempCpu, TempMotherboard, TempVrm, FanChipset, CurrCpu,
        ]),
        mutex_name: acpi::HW_ACCESS_MUTEX,
    },
    BoardProfile {
        // Hero without the chipset fan
        name: "ROG CROSSHAIR VIII DARK HERO",
        supported: SensorSet::of(&C8_COMMON).with_index(FanWaterFlow as usize),
        mutex_name: acpi::HW_ACCESS_MUTEX,
    },
    BoardProfile {
        // Hero without water cooling
        name: "ROG CROSSHAIR VIII FORMULA",
        supported: SensorSet::of(&[
            TempChipset, TempCpu, TempMotherboard, TempTSensor, TempVrm,
            FanCpuOpt, FanChipset, CurrCpu,
        ]),
        mutex_name: acpi::HW_ACCESS_MUTEX,
    },
    BoardProfile {
        name: "ROG CROSSHAIR VIII HERO",
        supported: SensorSet::of(&C8_COMMON).with_index(FanChipset as usize).with_index(FanWaterFlow as usize),
        mutex_name: acpi::HW_ACCESS_MUTEX,
    },
    BoardProfile {
        name: "ROG CROSSHAIR VIII IMPACT",
        supported: SensorSet::of(&[
            TempChipset, TempCpu, TempMotherboard, TempTSensor, TempVrm, FanChipset, CurrCpu,
        ]),
        mutex_name: acpi::HW_ACCESS_MUTEX,
    },
    BoardProfile {
        name: "ROG STRIX B550-E GAMING",
        supported: SensorSet::of(&[
            TempChipset, TempCpu, TempMotherboard, TempTSensor, TempVrm, FanCpuOpt, CurrCpu,
        ]),
        mutex_name: acpi::HW_ACCESS_MUTEX,
    },
    BoardProfile {
        name: "ROG STRIX B550-I GAMING",
        supported: SensorSet::of(&[
            TempChipset, TempCpu, TempMotherboard, TempTSensor, TempVrm, FanVrmHs, CurrCpu,
        ]),
        mutex_name: acpi::HW_ACCESS_MUTEX,
    },
    BoardProfile {
        name: "ROG STRIX X570-E GAMING",
        supported: SensorSet::of(&[
            TempChipset, TempCpu, TempMotherboard, TempTSensor, TempVrm, FanChipset, CurrCpu,
        ]),
        mutex_name: acpi::HW_ACCESS_MUTEX,
    },
];

lazy_static! {
    static ref BOARDS_BY_NAME: HashMap<&'static str, BoardId> =
        BoardId::ALL.iter().map(|&b| (b.profile().name, b)).collect();
}

impl BoardId {
    pub const ALL: [BoardId; 8] = [
        BoardId::ProWsX570Ace,
        BoardId::RogCrosshairViiiDarkHero,
        BoardId::RogCrosshairViiiFormula,
        BoardId::RogCrosshairViiiHero,
        BoardId::RogCrosshairViiiImpact,
        BoardId::RogStrixB550EGaming,
        BoardId::RogStrixB550IGaming,
        BoardId::RogStrixX570EGaming,
    ];

    pub fn profile(self) -> &'static BoardProfile {
        &BOARD_PROFILES[self as usize]
    }

    /// Match DMI board vendor and name exactly.
    pub fn identify(vendor: &str, name: &str) -> Option<BoardId> {
        if vendor != dmi::ASUS_VENDOR {
            return None;
        }
        BOARDS_BY_NAME.get(name).copied()
    }

    /// Like [`identify`](Self::identify) but reports the strings on failure.
    pub fn identify_or_err(vendor: &str, name: &str) -> Result<BoardId> {
        Self::identify(vendor, name).ok_or_else(|| EcError::unsupported(vendor, name))
    }

    /// Case-insensitive lookup by board name, for user overrides.
    pub fn from_name(name: &str) -> Option<BoardId> {
        let name = name.trim();
        BoardId::ALL
            .iter()
            .copied()
            .find(|b| b.profile().name.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name)
    }
}

/// Built-in boards as profiles
pub fn board_profiles() -> &'static [BoardProfile] {
    &BOARD_PROFILES
}

/// Check the catalog and profile tables for internal consistency.
///
/// Catalog entries must be in strictly ascending, non-overlapping register
/// order within valid banks and labels must fit the label buffer. Profiles
/// must be sorted by board name (ASCII case-insensitive, no duplicates) and
/// reference existing sensors within the bank limit.
pub fn validate_tables(catalog: &[SensorDefinition], profiles: &[BoardProfile]) -> Result<()> {
    if catalog.len() > SensorSet::CAPACITY {
        return Err(EcError::TableIntegrity(format!(
            "catalog has {} entries, sets hold {}",
            catalog.len(),
            SensorSet::CAPACITY
        )));
    }

    let mut prev_end: Option<u32> = None;
    for (i, def) in catalog.iter().enumerate() {
        let addr = def.address;
        if def.label.is_empty() || def.label.len() > ec::MAX_LABEL_LEN {
            return Err(EcError::TableIntegrity(format!(
                "sensor {} label {:?} must be 1..={} bytes",
                i,
                def.label,
                ec::MAX_LABEL_LEN
            )));
        }
        if !matches!(addr.size(), 1 | 2 | 4) {
            return Err(EcError::TableIntegrity(format!(
                "sensor {} ({}) has unsupported size {}",
                i,
                def.label,
                addr.size()
            )));
        }
        if usize::from(addr.bank()) >= ec::MAX_BANKS {
            return Err(EcError::TableIntegrity(format!(
                "sensor {} ({}) uses bank {} beyond the limit of {}",
                i,
                def.label,
                addr.bank(),
                ec::MAX_BANKS
            )));
        }
        let last_index = usize::from(addr.index()) + addr.size() - 1;
        if last_index >= usize::from(ec::BANK_REGISTER) {
            return Err(EcError::TableIntegrity(format!(
                "sensor {} ({}) runs into the bank select register",
                i, def.label
            )));
        }
        let start = (u32::from(addr.bank()) << 8) | u32::from(addr.index());
        if let Some(end) = prev_end {
            if start < end {
                return Err(EcError::TableIntegrity(format!(
                    "sensor {} ({}) at {:#06x} is out of address order",
                    i, def.label, start
                )));
            }
        }
        prev_end = Some(start + addr.size() as u32);
    }

    for pair in profiles.windows(2) {
        let (a, b) = (pair[0].name, pair[1].name);
        if a.to_ascii_lowercase() >= b.to_ascii_lowercase() {
            return Err(EcError::TableIntegrity(format!(
                "board {} must sort before {}",
                b, a
            )));
        }
    }

    for profile in profiles {

        if profile.supported.is_empty() {
            return Err(EcError::TableIntegrity(format!("board {} has no sensors", profile.name)));
        }
        if profile.mutex_name.is_empty() {
            return Err(EcError::TableIntegrity(format!("board {} has no mutex name", profile.name)));
        }
        let mut banks: Vec<u8> = Vec::with_capacity(ec::MAX_BANKS);
        for idx in profile.supported.iter() {
            let def = catalog.get(idx).ok_or_else(|| {
                EcError::TableIntegrity(format!(
                    "board {} references unknown sensor {}",
                    profile.name, idx
                ))
            })?;
            if !banks.contains(&def.address.bank()) {
                banks.push(def.address.bank());
            }
        }
        if banks.len() > ec::MAX_BANKS {
            return Err(EcError::TableIntegrity(format!(
                "board {} touches {} banks",
                profile.name,
                banks.len()
            )));
        }
    }
    Ok(())
}

/// Validate the tables compiled into the driver.
pub fn validate_builtin_tables() -> Result<()> {
    validate_tables(&CATALOG, &BOARD_PROFILES)
}
