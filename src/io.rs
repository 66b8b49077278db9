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

//! Hardware collaborators
//!
//! The register primitive and the named mutex primitive the core is built
//! on, plus the Linux implementations the command-line tool uses.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Single-register access to the EC's 8-bit address space. Address
/// [`crate::constants::ec::BANK_REGISTER`] selects the active bank.
#[cfg_attr(test, mockall::automock)]
pub trait EcIo: Send {
    fn read_register(&mut self, address: u8) -> io::Result<u8>;
    fn write_register(&mut self, address: u8, value: u8) -> io::Result<()>;
}

/// Named mutex shared with platform firmware.
#[cfg_attr(test, mockall::automock)]
pub trait HwAccessMutex: Send + Sync {
    /// Whether `name` refers to an existing mutex object.
    fn resolve(&self, name: &str) -> bool;
    /// Wait at most `timeout`. Returns false when the wait expired.
    fn acquire(&self, name: &str, timeout: Duration) -> bool;
    /// Returns false when the release was rejected.
    fn release(&self, name: &str) -> bool;
}

/// EC registers through the `ec_sys` debugfs file (needs `ec_sys.write_support=1`
/// for bank selection).
#[derive(Debug)]
pub struct EcSysIo {
    path: PathBuf,
    file: File,
}

impl EcSysIo {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EcIo for EcSysIo {
    fn read_register(&mut self, address: u8) -> io::Result<u8> {
        self.file.seek(SeekFrom::Start(u64::from(address)))?;
        let mut buf = [0u8; 1];
        self.file.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn write_register(&mut self, address: u8, value: u8) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(u64::from(address)))?;
        self.file.write_all(&[value])?;
        self.file.flush()
    }
}

/// ACPI mutexes are not reachable from user space; this never resolves and
/// the driver falls back to unguarded access.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAcpiMutex;

impl HwAccessMutex for NoAcpiMutex {
    fn resolve(&self, _name: &str) -> bool {
        false
    }

    fn acquire(&self, _name: &str, _timeout: Duration) -> bool {
        false
    }

    fn release(&self, _name: &str) -> bool {
        false
    }
}
