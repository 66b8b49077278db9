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

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{bail, Context};
use tracing::warn;

use asus_ec_sensors::config::{config_path, load_settings};
use asus_ec_sensors::system::{is_root, read_board_identity};
use asus_ec_sensors::{
    board_profiles, logger, BoardId, EcSensors, EcSysIo, NoAcpiMutex, Reading, SensorKind,
};

const USAGE: &str = "\
Usage: asus-ec-sensors [OPTIONS]

Options:
  --json             Print readings as JSON
  --watch            Keep printing at the configured update interval
  --board <NAME>     Skip DMI detection and use this board
  --config <PATH>    Read settings from PATH
  --list-boards      List supported boards and exit
  -h, --help         Show this help";

#[derive(Debug, Default)]
struct Args {
    json: bool,
    watch: bool,
    list_boards: bool,
    board: Option<String>,
    config: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--json" => args.json = true,
            "--watch" => args.watch = true,
            "--list-boards" => args.list_boards = true,
            "--board" => args.board = Some(it.next().context("--board needs a value")?),
            "--config" => args.config = Some(PathBuf::from(it.next().context("--config needs a value")?)),
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other => bail!("unknown argument: {other}\n\n{USAGE}"),
        }
    }
    Ok(args)
}

fn resolve_board(override_name: Option<&str>) -> anyhow::Result<BoardId> {
    if let Some(name) = override_name {
        return BoardId::from_name(name).with_context(|| format!("unknown board {name:?}, see --list-boards"));
    }
    let id = read_board_identity().context("failed to read DMI board identity")?;
    Ok(BoardId::identify_or_err(&id.vendor, &id.name)?)
}

fn format_value(r: &Reading) -> String {
    match r.kind {
        SensorKind::Fan => format!("{} {}", r.value, r.unit),
        _ => format!("{:.1} {}", r.value as f64 / 1000.0, r.unit),
    }
}

fn print_readings(driver: &EcSensors, json: bool) -> anyhow::Result<()> {
    let readings = driver.readings()?;
    if json {
        let out = serde_json::json!({
            "board": driver.board_name(),
            "guarded": driver.is_guarded(),
            "sensors": readings,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    println!("{}", driver.board_name());
    for r in &readings {
        println!("  {:<8} {:<12} {:>12}", r.name(), format!("{}:", r.label), format_value(r));
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = parse_args()?;

    let settings_path = args.config.clone().unwrap_or_else(config_path);
    let settings = load_settings(&settings_path)
        .with_context(|| format!("failed to load settings from {}", settings_path.display()))?;
    logger::init_logging(&settings.log_level);

    if args.list_boards {
        for profile in board_profiles() {
            println!("{} ({} sensors)", profile.name, profile.supported.len());
        }
        return Ok(());
    }

    if !is_root() {
        eprintln!("Error: asus-ec-sensors needs root to access EC registers.");
        eprintln!(
            "Please run with: sudo {}",
            std::env::args().next().unwrap_or_else(|| "asus-ec-sensors".to_string())
        );
        std::process::exit(1);
    }

    let board = resolve_board(args.board.as_deref().or(settings.board.as_deref()))?;
    let io = EcSysIo::open(&settings.ec_io_path).with_context(|| {
        format!(
            "failed to open {} (load ec_sys with write_support=1)",
            settings.ec_io_path.display()
        )
    })?;
    let options = settings.driver_options();
    let driver = EcSensors::new(board, Box::new(io), Arc::new(NoAcpiMutex), options)?;

    if !args.watch {
        return print_readings(&driver, args.json);
    }
    loop {
        if let Err(e) = print_readings(&driver, args.json) {
            // Transient contention; the next tick retries.
            warn!("read failed: {e:#}");
        }
        thread::sleep(options.ttl);
    }
}
