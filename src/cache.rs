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

//! Cache and decode layer
//!
//! Raw bytes from a block read become one integer per sensor. A single
//! board-wide timestamp gates the next hardware refresh.

use std::time::{Duration, Instant};

use ec_error::{EcError, Result};

use crate::sensor_map::SensorMap;

/// Time source, replaceable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Big-endian unsigned value of a 1, 2 or 4 byte register run.
/// Any other length decodes to 0.
pub fn decode_value(bytes: &[u8]) -> u32 {
    match *bytes {
        [b] => u32::from(b),
        [hi, lo] => u32::from(u16::from_be_bytes([hi, lo])),
        [b0, b1, b2, b3] => u32::from_be_bytes([b0, b1, b2, b3]),
        _ => 0,
    }
}

/// Decode `raw` (laid out like `map.registers()`) into one value per sensor.
pub fn decode_all(map: &SensorMap, raw: &[u8], out: &mut [u32]) {
    let mut offset = 0;
    for (sensor, slot) in map.sensors().iter().zip(out.iter_mut()) {
        let size = sensor.size();
        *slot = raw.get(offset..offset + size).map(decode_value).unwrap_or(0);
        offset += size;
    }
}

/// Last decoded value of every sensor on a board.
#[derive(Debug, Clone)]
pub struct SensorCache {
    values: Vec<u32>,
    last_updated: Option<Instant>,
    ttl: Duration,
}

impl SensorCache {
    /// Zeroed cache with one entry per sensor, stale until first update.
    pub fn new(sensors: usize, ttl: Duration) -> Result<Self> {
        let mut values = Vec::new();
        values
            .try_reserve_exact(sensors)
            .map_err(|_| EcError::AllocationFailure { what: "sensor cache" })?;
        values.resize(sensors, 0);
        Ok(Self {
            values,
            last_updated: None,
            ttl,
        })
    }

    /// True when never filled or at least one TTL has passed since the last fill.
    pub fn is_stale(&self, now: Instant) -> bool {
        match self.last_updated {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= self.ttl,
        }
    }

    /// Replace every value from a successful block read.
    pub fn update(&mut self, map: &SensorMap, raw: &[u8], now: Instant) {
        decode_all(map, raw, &mut self.values);
        self.last_updated = Some(now);
    }

    pub fn value(&self, index: usize) -> Option<u32> {
        self.values.get(index).copied()
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn last_updated(&self) -> Option<Instant> {
        self.last_updated
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
