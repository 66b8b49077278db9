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

use std::fs;
use std::io;
use std::path::Path;

use crate::constants::paths;

/// Board vendor and name as reported by DMI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardIdentity {
    pub vendor: String,
    pub name: String,
}

fn read_trim(path: &Path) -> io::Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_string())
}

/// Read `board_vendor` and `board_name` from a DMI id directory.
pub fn read_board_identity_from(dir: &Path) -> io::Result<BoardIdentity> {
    Ok(BoardIdentity {
        vendor: read_trim(&dir.join("board_vendor"))?,
        name: read_trim(&dir.join("board_name"))?,
    })
}

pub fn read_board_identity() -> io::Result<BoardIdentity> {
    read_board_identity_from(Path::new(paths::DMI_ID_DIR))
}

pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_board_identity_trims() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("board_vendor"), "ASUSTeK COMPUTER INC.\n").unwrap();
        fs::write(dir.path().join("board_name"), "ROG STRIX B550-E GAMING\n").unwrap();
        let id = read_board_identity_from(dir.path()).unwrap();
        assert_eq!(id.vendor, "ASUSTeK COMPUTER INC.");
        assert_eq!(id.name, "ROG STRIX B550-E GAMING");
    }

    #[test]
    fn test_read_board_identity_missing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("board_vendor"), "ASUSTeK COMPUTER INC.\n").unwrap();
        assert!(read_board_identity_from(dir.path()).is_err());
    }
}
