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

//! Constants for the EC sensor driver
//!
//! Register layout, timing bounds and system paths in one place.

use std::time::Duration;

/// EC register layout
pub mod ec {
    /// Register that selects the active bank
    pub const BANK_REGISTER: u8 = 0xff;

    /// Upper bound on distinct banks one board may touch
    pub const MAX_BANKS: usize = 4;

    /// Longest sensor label, matching the hwmon label buffer minus the terminator
    pub const MAX_LABEL_LEN: usize = 15;
}

/// ACPI names
pub mod acpi {
    /// AML mutex the firmware takes around its own EC accesses
    pub const HW_ACCESS_MUTEX: &str = "\\AMW0.ASMX";
}

/// Timing defaults
pub mod timing {
    use super::Duration;

    /// Cached readings stay valid this long
    pub const DEFAULT_TTL: Duration = Duration::from_secs(1);

    /// Bound on waiting for the hardware access mutex
    pub const DEFAULT_MUTEX_TIMEOUT: Duration = Duration::from_millis(500);

    /// Bound on waiting for another caller's refresh of the same board
    pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(2000);
}

/// Scaling applied before values reach the reporting interface
pub mod units {
    /// Whole units (°C, A, V) to milli-units
    pub const MILLI: i64 = 1000;
}

/// System paths
pub mod paths {
    /// DMI identification directory
    pub const DMI_ID_DIR: &str = "/sys/class/dmi/id";

    /// Register file exposed by the `ec_sys` module
    pub const EC_SYS_IO: &str = "/sys/kernel/debug/ec/ec0/io";

    /// System-wide configuration fallback
    pub const SYSTEM_CONFIG: &str = "/etc/asus-ec-sensors/config.json";

    /// Directory name under the user's config dir
    pub const CONFIG_DIR_NAME: &str = "asus-ec-sensors";

    /// Config file name
    pub const CONFIG_FILE: &str = "config.json";
}

/// Board identification
pub mod dmi {
    /// Board vendor string every supported board reports
    pub const ASUS_VENDOR: &str = "ASUSTeK COMPUTER INC.";
}
