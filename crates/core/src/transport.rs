//! Sensor bus abstraction.
//!
//! The protocol engine is written against this capability set only: drive
//! chip-select, exchange one byte full-duplex, and block for at least a given
//! time. `crate::hal::HalBus` is the hardware implementation and
//! [`recording::RecordingBus`] records every call for inspection.

use crate::error::Result;

/// Chip-select, byte transfer and blocking delays for one sensor.
///
/// Delays are lower bounds: implementations may sleep longer, never shorter.
pub trait SensorBus {
    /// Assert chip-select (NCS low).
    fn select(&mut self) -> Result<()>;

    /// Deassert chip-select (NCS high).
    fn deselect(&mut self) -> Result<()>;

    /// Send `out` and return the byte clocked in at the same time.
    fn transfer_byte(&mut self, out: u8) -> Result<u8>;

    /// Block for at least `us` microseconds.
    fn delay_us(&mut self, us: u32);

    /// Block for at least `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

impl<B: SensorBus + ?Sized> SensorBus for &mut B {
    fn select(&mut self) -> Result<()> {
        (**self).select()
    }

    fn deselect(&mut self) -> Result<()> {
        (**self).deselect()
    }

    fn transfer_byte(&mut self, out: u8) -> Result<u8> {
        (**self).transfer_byte(out)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

/// An in-memory bus that logs every call.
///
/// Reads are answered from a per-register table so a whole startup can run
/// without hardware. Delays advance a virtual clock instead of sleeping.
pub mod recording {
    use super::*;
    use crate::error::SensorError;
    use crate::registers::{Register, READ_MASK, WRITE_FLAG};
    use std::collections::{HashMap, VecDeque};
    use std::fmt;

    /// One call on the bus, in the order it happened.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum BusEvent {
        Select,
        Deselect,
        Transfer { out: u8, input: u8 },
        DelayUs(u32),
        DelayMs(u32),
    }

    impl fmt::Display for BusEvent {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Select => write!(f, "NCS low"),
                Self::Deselect => write!(f, "NCS high"),
                Self::Transfer { out, input } => write!(f, "tx 0x{out:02X} rx 0x{input:02X}"),
                Self::DelayUs(us) => write!(f, "wait {us}us"),
                Self::DelayMs(ms) => write!(f, "wait {ms}ms"),
            }
        }
    }

    /// Where the simulated device is within the current NCS assertion.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Phase {
        Address,
        ReadData(u8),
        WriteData(u8),
        Done,
    }

    /// Recording test double for [`SensorBus`].
    #[derive(Debug)]
    pub struct RecordingBus {
        events: Vec<BusEvent>,
        registers: HashMap<u8, u8>,
        queued: HashMap<u8, VecDeque<u8>>,
        written: Vec<(u8, u8)>,
        burst: Vec<u8>,
        phase: Option<Phase>,
        elapsed_us: u64,
        transfers: usize,
        fail_after: Option<usize>,
    }

    impl Default for RecordingBus {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RecordingBus {
        pub fn new() -> Self {
            Self {
                events: Vec::new(),
                registers: HashMap::new(),
                queued: HashMap::new(),
                written: Vec::new(),
                burst: Vec::new(),
                phase: None,
                elapsed_us: 0,
                transfers: 0,
                fail_after: None,
            }
        }

        /// Value returned by every read of `reg` once its queue is empty.
        pub fn set_register(&mut self, reg: Register, value: u8) -> &mut Self {
            self.registers.insert(reg.addr(), value);
            self
        }

        /// Values returned by the next reads of `reg`, oldest first.
        pub fn queue_register(&mut self, reg: Register, values: &[u8]) -> &mut Self {
            self.queued
                .entry(reg.addr())
                .or_default()
                .extend(values.iter().copied());
            self
        }

        /// Make every transfer after the first `count` fail.
        pub fn fail_transfers_after(&mut self, count: usize) -> &mut Self {
            self.fail_after = Some(count);
            self
        }

        /// Stop injecting failures.
        pub fn clear_failure(&mut self) -> &mut Self {
            self.fail_after = None;
            self
        }

        pub fn events(&self) -> &[BusEvent] {
            &self.events
        }

        pub fn take_events(&mut self) -> Vec<BusEvent> {
            std::mem::take(&mut self.events)
        }

        pub fn clear(&mut self) {
            self.events.clear();
            self.written.clear();
            self.burst.clear();
            self.elapsed_us = 0;
        }

        /// Bytes sent on MOSI, in order.
        pub fn sent_bytes(&self) -> Vec<u8> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    BusEvent::Transfer { out, .. } => Some(*out),
                    _ => None,
                })
                .collect()
        }

        /// Single-register writes seen by the device, as (address, value).
        pub fn register_writes(&self) -> &[(u8, u8)] {
            &self.written
        }

        /// Payload bytes received by the SROM burst destination.
        pub fn burst_bytes(&self) -> &[u8] {
            &self.burst
        }

        /// Total requested delay.
        pub fn elapsed_us(&self) -> u64 {
            self.elapsed_us
        }

        pub fn is_selected(&self) -> bool {
            self.phase.is_some()
        }

        /// Group the raw log into register-level transactions.
        pub fn transactions(&self) -> Vec<Transaction> {
            summarize(&self.events)
        }

        fn read_value(&mut self, addr: u8) -> u8 {
            if let Some(value) = self.queued.get_mut(&addr).and_then(VecDeque::pop_front) {
                return value;
            }
            self.registers.get(&addr).copied().unwrap_or(0)
        }
    }

    impl SensorBus for RecordingBus {
        fn select(&mut self) -> Result<()> {
            self.events.push(BusEvent::Select);
            self.phase = Some(Phase::Address);
            Ok(())
        }

        fn deselect(&mut self) -> Result<()> {
            self.events.push(BusEvent::Deselect);
            self.phase = None;
            Ok(())
        }

        fn transfer_byte(&mut self, out: u8) -> Result<u8> {
            if self.fail_after.is_some_and(|n| self.transfers >= n) {
                return Err(SensorError::Bus(format!(
                    "injected failure on transfer {}",
                    self.transfers
                )));
            }
            self.transfers += 1;

            let input = match self.phase {
                Some(Phase::Address) => {
                    let addr = out & READ_MASK;
                    self.phase = Some(if out & WRITE_FLAG != 0 {
                        Phase::WriteData(addr)
                    } else {
                        Phase::ReadData(addr)
                    });
                    0
                }
                Some(Phase::ReadData(addr)) => {
                    self.phase = Some(Phase::Done);
                    self.read_value(addr)
                }
                Some(Phase::WriteData(addr)) => {
                    if addr == Register::SromLoadBurst.addr() {
                        self.burst.push(out);
                    } else {
                        self.written.push((addr, out));
                        self.phase = Some(Phase::Done);
                    }
                    0
                }
                // Clocked without NCS, or after the transaction completed.
                Some(Phase::Done) | None => 0,
            };

            self.events.push(BusEvent::Transfer { out, input });
            Ok(input)
        }

        fn delay_us(&mut self, us: u32) {
            self.events.push(BusEvent::DelayUs(us));
            self.elapsed_us += u64::from(us);
        }

        fn delay_ms(&mut self, ms: u32) {
            self.events.push(BusEvent::DelayMs(ms));
            self.elapsed_us += u64::from(ms) * 1000;
        }
    }

    /// A register-level view of one NCS assertion, or a delay between them.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Transaction {
        Read { addr: u8, value: u8 },
        Write { addr: u8, value: u8 },
        Burst { addr: u8, len: usize },
        /// NCS toggled with nothing clocked.
        Toggle,
        DelayUs(u32),
        DelayMs(u32),
    }

    fn reg_name(addr: u8) -> String {
        match Register::from_addr(addr) {
            Some(reg) => reg.name().to_string(),
            None => format!("0x{addr:02X}"),
        }
    }

    impl fmt::Display for Transaction {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Read { addr, value } => {
                    write!(f, "read  {:<18} -> 0x{value:02X}", reg_name(*addr))
                }
                Self::Write { addr, value } => {
                    write!(f, "write {:<18} <- 0x{value:02X}", reg_name(*addr))
                }
                Self::Burst { addr, len } => {
                    write!(f, "burst {:<18} <- {len} bytes", reg_name(*addr))
                }
                Self::Toggle => write!(f, "toggle NCS"),
                Self::DelayUs(us) => write!(f, "wait  {us}us"),
                Self::DelayMs(ms) => write!(f, "wait  {ms}ms"),
            }
        }
    }

    /// Group raw bus events into transactions. Delays inside an NCS
    /// assertion belong to that transaction and are not listed.
    pub fn summarize(events: &[BusEvent]) -> Vec<Transaction> {
        let mut out = Vec::new();
        let mut current: Option<Vec<(u8, u8)>> = None;

        for event in events {
            match *event {
                BusEvent::Select => current = Some(Vec::new()),
                BusEvent::Deselect => {
                    if let Some(bytes) = current.take() {
                        out.push(classify(&bytes));
                    }
                }
                BusEvent::Transfer { out: tx, input } => {
                    if let Some(bytes) = current.as_mut() {
                        bytes.push((tx, input));
                    }
                }
                BusEvent::DelayUs(us) if current.is_none() => out.push(Transaction::DelayUs(us)),
                BusEvent::DelayMs(ms) if current.is_none() => out.push(Transaction::DelayMs(ms)),
                BusEvent::DelayUs(_) | BusEvent::DelayMs(_) => {}
            }
        }
        out
    }

    fn classify(bytes: &[(u8, u8)]) -> Transaction {
        let Some(&(first, _)) = bytes.first() else {
            return Transaction::Toggle;
        };
        let addr = first & READ_MASK;
        if first & WRITE_FLAG == 0 {
            let value = bytes.get(1).map(|&(_, input)| input).unwrap_or(0);
            return Transaction::Read { addr, value };
        }
        if addr == Register::SromLoadBurst.addr() {
            return Transaction::Burst {
                addr,
                len: bytes.len() - 1,
            };
        }
        let value = bytes.get(1).map(|&(tx, _)| tx).unwrap_or(0);
        Transaction::Write { addr, value }
    }
}
