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

//! Driver instance for one board
//!
//! Owns the compiled read plan, the cache and the register primitive.
//! The "check TTL, maybe refresh, read cache" sequence runs under one
//! per-board lock so concurrent callers never interleave two sweeps.

use std::sync::Arc;
use std::time::Duration;

use ec_error::{EcError, Result};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::block_read::{block_read, AccessGuard};
use crate::boards::{validate_tables, BoardId, BoardProfile};
use crate::cache::{Clock, SensorCache, SystemClock};
use crate::catalog::{SensorDefinition, SensorKind, CATALOG};
use crate::constants::timing;
use crate::io::{EcIo, HwAccessMutex};
use crate::sensor_map::SensorMap;

/// Timing knobs for one driver instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverOptions {
    /// Cache time-to-live
    pub ttl: Duration,
    /// Bound on waiting for the firmware mutex
    pub mutex_timeout: Duration,
    /// Bound on waiting for another caller holding this board
    pub lock_timeout: Duration,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            ttl: timing::DEFAULT_TTL,
            mutex_timeout: timing::DEFAULT_MUTEX_TIMEOUT,
            lock_timeout: timing::DEFAULT_LOCK_TIMEOUT,
        }
    }
}

/// One scaled reading, as handed to the reporting side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reading {
    pub kind: SensorKind,
    /// 0-based channel within `kind`
    pub channel: usize,
    pub label: &'static str,
    pub raw: u32,
    pub value: i64,
    pub unit: &'static str,
}

impl Reading {
    /// hwmon style name: `temp1`, `fan2`, ...
    pub fn name(&self) -> String {
        format!("{}{}", self.kind.hwmon_prefix(), self.channel + 1)
    }
}

struct State {
    io: Box<dyn EcIo>,
    cache: SensorCache,
    read_buffer: Vec<u8>,
    refreshes: u64,
}

/// Sensor driver bound to one board.
pub struct EcSensors {
    board_name: &'static str,
    map: SensorMap,
    guard: Option<AccessGuard>,
    clock: Arc<dyn Clock>,
    lock_timeout: Duration,
    state: Mutex<State>,
}

impl std::fmt::Debug for EcSensors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcSensors")
            .field("board", &self.board_name)
            .field("sensors", &self.map.len())
            .field("registers", &self.map.register_count())
            .field("guard", &self.guard)
            .finish()
    }
}

impl EcSensors {
    /// Set up the driver for a built-in board.
    pub fn new(
        board: BoardId,
        io: Box<dyn EcIo>,
        mutex: Arc<dyn HwAccessMutex>,
        options: DriverOptions,
    ) -> Result<Self> {
        Self::with_profile(*board.profile(), &CATALOG, io, mutex, Arc::new(SystemClock), options)
    }

    /// Set up the driver from an explicit profile, catalog and clock.
    ///
    /// The profile and catalog are checked with [`validate_tables`] first,
    /// so a mismatched pair fails with `TableIntegrity`. An unresolvable
    /// mutex is not fatal: the driver logs the weaker guarantee and reads
    /// without it.
    pub fn with_profile(
        profile: BoardProfile,
        catalog: &[SensorDefinition],
        io: Box<dyn EcIo>,
        mutex: Arc<dyn HwAccessMutex>,
        clock: Arc<dyn Clock>,
        options: DriverOptions,
    ) -> Result<Self> {
        validate_tables(catalog, std::slice::from_ref(&profile))?;
        let map = SensorMap::compile(profile.supported, catalog);

        let mut read_buffer = Vec::new();
        read_buffer
            .try_reserve_exact(map.register_count())
            .map_err(|_| EcError::AllocationFailure { what: "EC read buffer" })?;
        read_buffer.resize(map.register_count(), 0);
        let cache = SensorCache::new(map.len(), options.ttl)?;

        let guard = match AccessGuard::resolve(mutex, profile.mutex_name, options.mutex_timeout) {
            Ok(guard) => Some(guard),
            Err(e) => {
                warn!(error = %e, "Reading the EC without a hardware access guard");
                None
            }
        };

        info!(
            board = profile.name,
            "board has {} EC sensors that span {} registers",
            map.len(),
            map.register_count()
        );

        Ok(Self {
            board_name: profile.name,
            map,
            guard,
            clock,
            lock_timeout: options.lock_timeout,
            state: Mutex::new(State {
                io,
                cache,
                read_buffer,
                refreshes: 0,
            }),
        })
    }

    pub fn board_name(&self) -> &'static str {
        self.board_name
    }

    pub fn sensor_map(&self) -> &SensorMap {
        &self.map
    }

    /// Whether reads are serialized with firmware through the named mutex.
    pub fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }

    fn lock_state(&self) -> Result<parking_lot::MutexGuard<'_, State>> {
        self.state.try_lock_for(self.lock_timeout).ok_or(EcError::Busy {
            waited_ms: self.lock_timeout.as_millis() as u64,
        })
    }

    /// Refresh every sensor when the cache is stale. Caller holds the lock.
    fn refresh_if_stale(&self, state: &mut State) -> Result<()> {
        if !state.cache.is_stale(self.clock.now()) {
            return Ok(());
        }
        let State {
            io,
            cache,
            read_buffer,
            refreshes,
        } = state;
        if let Err(e) = block_read(io.as_mut(), self.guard.as_ref(), &self.map, read_buffer) {
            error!(board = self.board_name, error = %e, "EC sensor update failed");
            return Err(e);
        }
        cache.update(&self.map, read_buffer, self.clock.now());
        *refreshes += 1;
        Ok(())
    }

    /// Unscaled value of sensor `index` (map order), refreshing first if stale.
    pub fn raw_value(&self, index: usize) -> Result<u32> {
        let sensor = self.map.sensor(index).ok_or(EcError::SensorNotFound {
            kind: "sensor",
            channel: index,
        })?;
        let mut state = self.lock_state()?;
        self.refresh_if_stale(&mut state)?;
        state.cache.value(index).ok_or(EcError::SensorNotFound {
            kind: sensor.kind().hwmon_prefix(),
            channel: index,
        })
    }

    /// Scaled value of the `channel`-th sensor of `kind`.
    pub fn read(&self, kind: SensorKind, channel: usize) -> Result<i64> {
        let index = self.find(kind, channel)?;
        Ok(kind.scale(self.raw_value(index)?))
    }

    /// Label of the `channel`-th sensor of `kind`.
    pub fn label(&self, kind: SensorKind, channel: usize) -> Result<&'static str> {
        let index = self.find(kind, channel)?;
        Ok(self.map.sensors()[index].label())
    }

    pub fn find(&self, kind: SensorKind, channel: usize) -> Result<usize> {
        self.map.find(kind, channel).ok_or(EcError::SensorNotFound {
            kind: kind.hwmon_prefix(),
            channel,
        })
    }

    /// Every sensor from one consistent cache state.
    pub fn readings(&self) -> Result<Vec<Reading>> {
        let mut state = self.lock_state()?;
        self.refresh_if_stale(&mut state)?;

        let mut per_kind = [0usize; SensorKind::ALL.len()];
        let readings = self
            .map
            .sensors()
            .iter()
            .zip(state.cache.values())
            .map(|(sensor, &raw)| {
                let kind = sensor.kind();
                let slot = &mut per_kind[kind as usize];
                let channel = *slot;
                *slot += 1;
                Reading {
                    kind,
                    channel,
                    label: sensor.label(),
                    raw,
                    value: kind.scale(raw),
                    unit: kind.unit(),
                }
            })
            .collect();
        Ok(readings)
    }

    /// Cached values without touching hardware.
    pub fn cached_values(&self) -> Result<Vec<u32>> {
        Ok(self.lock_state()?.cache.values().to_vec())
    }

    /// Number of successful block reads so far.
    pub fn refresh_count(&self) -> Result<u64> {
        Ok(self.lock_state()?.refreshes)
    }
}
