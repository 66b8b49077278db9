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

//! Block-read engine
//!
//! One guarded sweep over every register of a [`SensorMap`]. Banks are
//! visited in ascending order with at most one switch each, and the bank
//! that was active before the sweep is always written back, even when the
//! sweep fails part-way.
//!
//! Platform firmware reads the same EC without coordinating with us beyond
//! the optional named mutex. A nonzero bank at sweep start means it may be
//! mid-transaction; that is logged and tolerated rather than retried.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ec_error::{EcError, Result};
use tracing::{debug, error, warn};

use crate::catalog::{register_bank, register_index};
use crate::constants::ec;
use crate::io::{EcIo, HwAccessMutex};
use crate::sensor_map::SensorMap;

/// A resolved firmware mutex plus the bound on waiting for it.
#[derive(Clone)]
pub struct AccessGuard {
    mutex: Arc<dyn HwAccessMutex>,
    name: String,
    timeout: Duration,
}

impl std::fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGuard")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AccessGuard {
    /// Fails with `MutexUnavailable` when `name` does not resolve.
    pub fn resolve(mutex: Arc<dyn HwAccessMutex>, name: &str, timeout: Duration) -> Result<Self> {
        if !mutex.resolve(name) {
            return Err(EcError::MutexUnavailable { name: name.to_string() });
        }
        Ok(Self {
            mutex,
            name: name.to_string(),
            timeout,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn acquire(&self) -> Result<()> {
        if self.mutex.acquire(&self.name, self.timeout) {
            Ok(())
        } else {
            error!(mutex = %self.name, "Failed to acquire hardware access mutex");
            Err(EcError::MutexBusy {
                name: self.name.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            })
        }
    }

    fn release(&self) {
        if !self.mutex.release(&self.name) {
            error!(mutex = %self.name, "Failed to release hardware access mutex");
        }
    }
}

/// What one sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockReadStats {
    /// Bank active before the sweep, restored afterwards
    pub prev_bank: u8,
    /// Bank select writes that succeeded, the restore included
    pub bank_switches: usize,
    pub registers_read: usize,
    /// The sweep started with a nonzero bank selected
    pub race_detected: bool,
}

/// Fill `buf` with one byte per register of `map`, in register-list order.
///
/// When `guard` is present it is held for the whole sweep. On error the
/// contents of `buf` are unspecified and must not be decoded.
pub fn block_read(
    io: &mut dyn EcIo,
    guard: Option<&AccessGuard>,
    map: &SensorMap,
    buf: &mut [u8],
) -> Result<BlockReadStats> {
    if buf.len() != map.register_count() {
        return Err(EcError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "read buffer holds {} bytes, plan has {} registers",
                buf.len(),
                map.register_count()
            ),
        )));
    }

    if let Some(guard) = guard {
        guard.acquire()?;
    }

    let started = Instant::now();
    let result = sweep(io, map, buf);

    if let Some(guard) = guard {
        guard.release();
    }

    if let Ok(stats) = &result {
        debug!(
            registers = stats.registers_read,
            switches = stats.bank_switches,
            elapsed_us = started.elapsed().as_micros() as u64,
            "EC block read complete"
        );
    }
    result
}

fn sweep(io: &mut dyn EcIo, map: &SensorMap, buf: &mut [u8]) -> Result<BlockReadStats> {
    // Nothing has been switched yet, so a failure here needs no restore.
    let prev_bank = io.read_register(ec::BANK_REGISTER)?;

    let mut stats = BlockReadStats {
        prev_bank,
        race_detected: prev_bank != 0,
        ..Default::default()
    };
    if stats.race_detected {
        warn!(prev_bank, "Concurrent access to the EC detected, race condition possible");
    }

    let outcome = read_banks(io, map, buf, &mut stats);

    let restored = io
        .write_register(ec::BANK_REGISTER, prev_bank)
        .map_err(|source| EcError::BankSwitch { bank: prev_bank, source });
    if restored.is_ok() {
        stats.bank_switches += 1;
    }

    match (outcome, restored) {
        (Ok(()), Ok(())) => Ok(stats),
        (Ok(()), Err(e)) => {
            warn!(bank = prev_bank, "EC bank restore failed");
            Err(e)
        }
        (Err(e), restored) => {
            if restored.is_err() {
                warn!(bank = prev_bank, "EC bank restore failed after aborted read");
            }
            Err(e)
        }
    }
}

fn read_banks(
    io: &mut dyn EcIo,
    map: &SensorMap,
    buf: &mut [u8],
    stats: &mut BlockReadStats,
) -> Result<()> {
    let mut active = stats.prev_bank;

    for &bank in map.banks() {
        if bank != active {
            if let Err(source) = io.write_register(ec::BANK_REGISTER, bank) {
                warn!(bank, "EC bank switch failed");
                return Err(EcError::BankSwitch { bank, source });
            }
            active = bank;
            stats.bank_switches += 1;
        }

        for (slot, &reg) in buf.iter_mut().zip(map.registers()) {
            if register_bank(reg) != bank {
                continue;
            }
            *slot = io.read_register(register_index(reg))?;
            stats.registers_read += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boards::SensorSet;
    use crate::catalog::{SensorDefinition, SensorKind};
    use crate::io::{MockEcIo, MockHwAccessMutex};
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn two_bank_map() -> SensorMap {
        let catalog = [
            SensorDefinition::new("CPU", SensorKind::Temperature, 1, 0, 0x3b),
            SensorDefinition::new("Water_In", SensorKind::Temperature, 1, 1, 0x00),
        ];
        SensorMap::compile(SensorSet::from_indices(&[0, 1]).unwrap(), &catalog)
    }

    #[test]
    fn test_sweep_order_and_restore() {
        let map = two_bank_map();
        let mut io = MockEcIo::new();
        let mut seq = Sequence::new();

        io.expect_read_register().with(eq(0xff)).times(1).in_sequence(&mut seq).returning(|_| Ok(0));
        io.expect_read_register().with(eq(0x3b)).times(1).in_sequence(&mut seq).returning(|_| Ok(40));
        io.expect_write_register().with(eq(0xff), eq(1)).times(1).in_sequence(&mut seq).returning(|_, _| Ok(()));
        io.expect_read_register().with(eq(0x00)).times(1).in_sequence(&mut seq).returning(|_| Ok(31));
        io.expect_write_register().with(eq(0xff), eq(0)).times(1).in_sequence(&mut seq).returning(|_, _| Ok(()));

        let mut buf = vec![0u8; map.register_count()];
        let stats = block_read(&mut io, None, &map, &mut buf).unwrap();
        assert_eq!(buf, vec![40, 31]);
        assert_eq!(stats.bank_switches, 2);
        assert_eq!(stats.registers_read, 2);
        assert!(!stats.race_detected);
    }

    #[test]
    fn test_nonzero_prev_bank_is_tolerated() {
        let map = two_bank_map();
        let mut io = MockEcIo::new();
        io.expect_read_register().with(eq(0xff)).returning(|_| Ok(1));
        io.expect_read_register().with(eq(0x3b)).returning(|_| Ok(50));
        io.expect_read_register().with(eq(0x00)).returning(|_| Ok(20));
        io.expect_write_register().with(eq(0xff), eq(0)).times(1).returning(|_, _| Ok(()));
        io.expect_write_register().with(eq(0xff), eq(1)).times(2).returning(|_, _| Ok(()));

        let mut buf = vec![0u8; 2];
        let stats = block_read(&mut io, None, &map, &mut buf).unwrap();
        assert!(stats.race_detected);
        assert_eq!(stats.prev_bank, 1);
        assert_eq!(stats.bank_switches, 3);
        assert_eq!(buf, vec![50, 20]);
    }

    #[test]
    fn test_single_bank_counts_only_restore() {
        let catalog = [SensorDefinition::new("CPU", SensorKind::Temperature, 1, 0, 0x3b)];
        let map = SensorMap::compile(SensorSet::from_indices(&[0]).unwrap(), &catalog);
        let mut io = MockEcIo::new();
        io.expect_read_register().returning(|_| Ok(0));
        io.expect_write_register().with(eq(0xff), eq(0)).times(1).returning(|_, _| Ok(()));

        let mut buf = vec![0u8; 1];
        let stats = block_read(&mut io, None, &map, &mut buf).unwrap();
        assert_eq!(stats.bank_switches, 1);
    }

    #[test]
    fn test_restore_failure_after_clean_sweep() {
        let map = two_bank_map();
        let mut io = MockEcIo::new();
        let mut seq = Sequence::new();

        io.expect_read_register().with(eq(0xff)).times(1).in_sequence(&mut seq).returning(|_| Ok(0));
        io.expect_read_register().with(eq(0x3b)).times(1).in_sequence(&mut seq).returning(|_| Ok(40));
        io.expect_write_register().with(eq(0xff), eq(1)).times(1).in_sequence(&mut seq).returning(|_, _| Ok(()));
        io.expect_read_register().with(eq(0x00)).times(1).in_sequence(&mut seq).returning(|_| Ok(31));
        io.expect_write_register()
            .with(eq(0xff), eq(0))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(io::Error::new(io::ErrorKind::TimedOut, "ibf timeout")));

        let mut buf = vec![0u8; 2];
        let err = block_read(&mut io, None, &map, &mut buf).unwrap_err();
        assert!(matches!(err, EcError::BankSwitch { bank: 0, .. }));
    }

    #[test]
    fn test_register_read_failure_still_restores() {
        let map = two_bank_map();
        let mut io = MockEcIo::new();
        let mut seq = Sequence::new();

        io.expect_read_register().with(eq(0xff)).times(1).in_sequence(&mut seq).returning(|_| Ok(0));
        io.expect_read_register().with(eq(0x3b)).times(1).in_sequence(&mut seq).returning(|_| Ok(40));
        io.expect_write_register().with(eq(0xff), eq(1)).times(1).in_sequence(&mut seq).returning(|_, _| Ok(()));
        io.expect_read_register()
            .with(eq(0x00))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(io::Error::new(io::ErrorKind::TimedOut, "obf timeout")));
        io.expect_write_register().with(eq(0xff), eq(0)).times(1).in_sequence(&mut seq).returning(|_, _| Ok(()));

        let mut buf = vec![0u8; 2];
        let err = block_read(&mut io, None, &map, &mut buf).unwrap_err();
        assert!(matches!(err, EcError::Io(_)));
    }

    #[test]
    fn test_bank_register_read_failure_skips_restore() {
        let map = two_bank_map();
        let mut io = MockEcIo::new();
        io.expect_read_register()
            .with(eq(0xff))
            .returning(|_| Err(io::Error::new(io::ErrorKind::TimedOut, "ibf timeout")));
        io.expect_write_register().never();

        let mut buf = vec![0u8; 2];
        let err = block_read(&mut io, None, &map, &mut buf).unwrap_err();
        assert!(matches!(err, EcError::Io(_)));
    }

    #[test]
    fn test_switch_failure_still_restores() {
        let map = two_bank_map();
        let mut io = MockEcIo::new();
        io.expect_read_register().with(eq(0xff)).returning(|_| Ok(0));
        io.expect_read_register().with(eq(0x3b)).returning(|_| Ok(40));
        io.expect_write_register()
            .with(eq(0xff), eq(1))
            .times(1)
            .returning(|_, _| Err(io::Error::new(io::ErrorKind::Other, "obf timeout")));
        io.expect_write_register().with(eq(0xff), eq(0)).times(1).returning(|_, _| Ok(()));

        let mut buf = vec![0u8; 2];
        let err = block_read(&mut io, None, &map, &mut buf).unwrap_err();
        assert!(matches!(err, EcError::BankSwitch { bank: 1, .. }));
    }

    #[test]
    fn test_guard_held_around_sweep() {
        let map = two_bank_map();
        let mut seq = Sequence::new();
        let mut mutex = MockHwAccessMutex::new();
        mutex.expect_resolve().returning(|_| true);
        mutex
            .expect_acquire()
            .withf(|name, timeout| name == "\\AMW0.ASMX" && *timeout == Duration::from_millis(500))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| true);
        mutex.expect_release().times(1).in_sequence(&mut seq).returning(|_| true);

        let guard = AccessGuard::resolve(Arc::new(mutex), "\\AMW0.ASMX", Duration::from_millis(500)).unwrap();

        let mut io = MockEcIo::new();
        io.expect_read_register().returning(|_| Ok(0));
        io.expect_write_register().returning(|_, _| Ok(()));

        let mut buf = vec![0u8; 2];
        block_read(&mut io, Some(&guard), &map, &mut buf).unwrap();
    }

    #[test]
    fn test_busy_mutex_aborts_before_io() {
        let map = two_bank_map();
        let mut mutex = MockHwAccessMutex::new();
        mutex.expect_resolve().returning(|_| true);
        mutex.expect_acquire().returning(|_, _| false);
        mutex.expect_release().never();
        let guard = AccessGuard::resolve(Arc::new(mutex), "\\AMW0.ASMX", Duration::from_millis(500)).unwrap();

        let mut io = MockEcIo::new();
        io.expect_read_register().never();
        io.expect_write_register().never();

        let mut buf = vec![7u8; 2];
        let err = block_read(&mut io, Some(&guard), &map, &mut buf).unwrap_err();
        assert!(matches!(err, EcError::MutexBusy { timeout_ms: 500, .. }));
        assert_eq!(buf, vec![7, 7]);
    }

    #[test]
    fn test_release_failure_is_not_an_error() {
        let map = two_bank_map();
        let mut mutex = MockHwAccessMutex::new();
        mutex.expect_resolve().returning(|_| true);
        mutex.expect_acquire().returning(|_, _| true);
        mutex.expect_release().times(1).returning(|_| false);
        let guard = AccessGuard::resolve(Arc::new(mutex), "\\AMW0.ASMX", Duration::from_millis(500)).unwrap();

        let mut io = MockEcIo::new();
        io.expect_read_register().returning(|_| Ok(3));
        io.expect_write_register().returning(|_, _| Ok(()));

        let mut buf = vec![0u8; 2];
        assert!(block_read(&mut io, Some(&guard), &map, &mut buf).is_ok());
        assert_eq!(buf, vec![3, 3]);
    }

    #[test]
    fn test_unresolvable_mutex() {
        let mut mutex = MockHwAccessMutex::new();
        mutex.expect_resolve().returning(|_| false);
        let err = AccessGuard::resolve(Arc::new(mutex), "\\AMW0.ASMX", Duration::from_millis(500)).unwrap_err();
        assert!(matches!(err, EcError::MutexUnavailable { .. }));
    }

    #[test]
    fn test_buffer_size_mismatch() {
        let map = two_bank_map();
        let mut io = MockEcIo::new();
        io.expect_read_register().never();
        let mut buf = vec![0u8; 1];
        assert!(block_read(&mut io, None, &map, &mut buf).is_err());
    }
}
