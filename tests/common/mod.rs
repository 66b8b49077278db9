/*
 * Shared fakes for the integration tests: a scripted EC register file, a
 * controllable firmware mutex and a manual clock.
 */

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use asus_ec_sensors::{Clock, EcIo, HwAccessMutex};
use parking_lot::Mutex;

pub const BANK_REGISTER: u8 = 0xff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// (active bank, index)
    Read(u8, u8),
    /// (address, value)
    Write(u8, u8),
}

#[derive(Debug, Default)]
pub struct EcState {
    pub registers: HashMap<u16, u8>,
    pub active_bank: u8,
    pub ops: Vec<Op>,
    pub fail_switch_to: Option<u8>,
    pub bank_read_delay: Option<Duration>,
}

/// In-memory EC. Clones share state so tests can inspect it after handing
/// one copy to the driver.
#[derive(Debug, Clone, Default)]
pub struct FakeEc {
    pub state: Arc<Mutex<EcState>>,
}

impl FakeEc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, bank: u8, index: u8, value: u8) {
        self.state.lock().registers.insert(((bank as u16) << 8) | index as u16, value);
    }

    pub fn set_be16(&self, bank: u8, index: u8, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.set(bank, index, hi);
        self.set(bank, index + 1, lo);
    }

    pub fn set_active_bank(&self, bank: u8) {
        self.state.lock().active_bank = bank;
    }

    pub fn fail_switch_to(&self, bank: Option<u8>) {
        self.state.lock().fail_switch_to = bank;
    }

    pub fn delay_bank_reads(&self, delay: Duration) {
        self.state.lock().bank_read_delay = Some(delay);
    }

    pub fn ops(&self) -> Vec<Op> {
        self.state.lock().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.state.lock().ops.clear();
    }

    /// Every sweep starts by reading the bank select register.
    pub fn sweeps(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, Op::Read(_, BANK_REGISTER)))
            .count()
    }

    pub fn bank_writes(&self) -> Vec<u8> {
        self.ops()
            .iter()
            .filter_map(|op| match op {
                Op::Write(BANK_REGISTER, v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    pub fn active_bank(&self) -> u8 {
        self.state.lock().active_bank
    }
}

impl EcIo for FakeEc {
    fn read_register(&mut self, address: u8) -> io::Result<u8> {
        let delay = {
            let mut st = self.state.lock();
            let bank = st.active_bank;
            st.ops.push(Op::Read(bank, address));
            if address == BANK_REGISTER {
                st.bank_read_delay
            } else {
                return Ok(*st.registers.get(&(((bank as u16) << 8) | address as u16)).unwrap_or(&0));
            }
        };
        if let Some(d) = delay {
            std::thread::sleep(d);
        }
        Ok(self.state.lock().active_bank)
    }

    fn write_register(&mut self, address: u8, value: u8) -> io::Result<()> {
        let mut st = self.state.lock();
        st.ops.push(Op::Write(address, value));
        if address == BANK_REGISTER {
            if st.fail_switch_to == Some(value) {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "EC write timeout"));
            }
            st.active_bank = value;
        }
        Ok(())
    }
}

/// Firmware mutex whose availability the test controls.
#[derive(Debug)]
pub struct ScriptedMutex {
    pub available: AtomicBool,
    pub acquires: AtomicUsize,
    pub releases: AtomicUsize,
}

impl ScriptedMutex {
    pub fn new(available: bool) -> Arc<Self> {
        Arc::new(Self {
            available: AtomicBool::new(available),
            acquires: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        })
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl HwAccessMutex for ScriptedMutex {
    fn resolve(&self, _name: &str) -> bool {
        true
    }

    fn acquire(&self, _name: &str, _timeout: Duration) -> bool {
        if self.available.load(Ordering::SeqCst) {
            self.acquires.fetch_add(1, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    fn release(&self, _name: &str) -> bool {
        self.releases.fetch_add(1, Ordering::SeqCst);
        true
    }
}

#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Instant::now()),
        })
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}
