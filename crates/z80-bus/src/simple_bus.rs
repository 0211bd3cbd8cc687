//! Flat 64 KiB RAM bus with a port table.

use std::collections::HashMap;

use crate::{Bus, IoBus};

/// A flat 64 KiB RAM bus for tests and simple hosts.
///
/// Port reads return the value registered for the full 16-bit port address,
/// or 0xFF (floating bus) when none is registered. Port writes are logged in
/// order.
pub struct SimpleBus {
    ram: Box<[u8]>,
    ports: HashMap<u16, u8>,
    port_writes: Vec<(u16, u8)>,
    vector: Option<u8>,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ram: vec![0; 0x10000].into_boxed_slice(),
            ports: HashMap::new(),
            port_writes: Vec::new(),
            vector: None,
        }
    }

    /// Copy `data` into RAM starting at `address`, wrapping at 0xFFFF.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.ram[usize::from(addr)] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Read RAM without going through the CPU-facing trait.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.ram[usize::from(address)]
    }

    /// Read a little-endian word from RAM.
    #[must_use]
    pub fn peek16(&self, address: u16) -> u16 {
        u16::from(self.peek(address)) | (u16::from(self.peek(address.wrapping_add(1))) << 8)
    }

    /// Register the value returned when `port` is read.
    pub fn set_port(&mut self, port: u16, value: u8) {
        self.ports.insert(port, value);
    }

    /// All port writes so far, oldest first.
    #[must_use]
    pub fn port_writes(&self) -> &[(u16, u8)] {
        &self.port_writes
    }

    /// Set the byte a device places on the bus when an interrupt is
    /// acknowledged.
    pub fn set_interrupt_vector(&mut self, vector: Option<u8>) {
        self.vector = vector;
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[usize::from(address)] = value;
    }
}

impl IoBus for SimpleBus {
    fn read_io(&mut self, port: u16) -> u8 {
        self.ports.get(&port).copied().unwrap_or(0xFF)
    }

    fn write_io(&mut self, port: u16, value: u8) {
        self.port_writes.push((port, value));
    }

    fn interrupt_vector(&mut self) -> Option<u8> {
        self.vector
    }
}
