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

//! Sensor-map compiler
//!
//! Expands a board's sensor set into the ordered sensor list, the flat
//! register list the block read fills, and the sorted set of banks it has
//! to visit. Built once per driver instance and never changed afterwards.

use crate::boards::{BoardId, SensorSet};
use crate::catalog::{Register, SensorDefinition, SensorKind, CATALOG};

/// A catalog entry selected for a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedSensor {
    pub catalog_index: usize,
    pub definition: SensorDefinition,
}

impl MappedSensor {
    pub fn kind(&self) -> SensorKind {
        self.definition.kind
    }

    pub fn label(&self) -> &'static str {
        self.definition.label
    }

    pub fn size(&self) -> usize {
        self.definition.address.size()
    }
}

/// Read plan for one board.
///
/// `registers` is partitioned by sensor in `sensors` order, so the bytes a
/// block read produces can be consumed sequentially. `banks` is ascending and
/// free of duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorMap {
    sensors: Vec<MappedSensor>,
    registers: Vec<Register>,
    banks: Vec<u8>,
}

impl SensorMap {
    /// Build the plan for `supported` over `catalog`.
    ///
    /// Indices outside the catalog are ignored; [`crate::boards::validate_tables`]
    /// rejects tables that would produce them.
    pub fn compile(supported: SensorSet, catalog: &[SensorDefinition]) -> Self {
        let mut sensors = Vec::with_capacity(supported.len());
        let mut registers = Vec::new();
        let mut banks: Vec<u8> = Vec::new();

        for catalog_index in supported.iter() {
            let Some(definition) = catalog.get(catalog_index) else {
                continue;
            };
            registers.extend(definition.address.registers());
            let bank = definition.address.bank();
            if !banks.contains(&bank) {
                banks.push(bank);
            }
            sensors.push(MappedSensor {
                catalog_index,
                definition: *definition,
            });
        }
        banks.sort_unstable();

        Self { sensors, registers, banks }
    }

    /// Plan for a built-in board.
    pub fn for_board(board: BoardId) -> Self {
        Self::compile(board.profile().supported, &CATALOG)
    }

    pub fn sensors(&self) -> &[MappedSensor] {
        &self.sensors
    }

    pub fn sensor(&self, index: usize) -> Option<&MappedSensor> {
        self.sensors.get(index)
    }

    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    pub fn banks(&self) -> &[u8] {
        &self.banks
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    /// Index of the `channel`-th sensor of `kind`, counting in map order.
    pub fn find(&self, kind: SensorKind, channel: usize) -> Option<usize> {
        self.sensors
            .iter()
            .enumerate()
            .filter(|(_, s)| s.kind() == kind)
            .nth(channel)
            .map(|(i, _)| i)
    }

    /// Number of sensors of `kind`
    pub fn count_of(&self, kind: SensorKind) -> usize {
        self.sensors.iter().filter(|s| s.kind() == kind).count()
    }
}
