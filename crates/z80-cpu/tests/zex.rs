//! Minimal CP/M harness for ZEXDOC/ZEXALL.
//!
//! CP/M memory layout:
//! - 0x0000: Warm boot (HALT here ends the run)
//! - 0x0005: BDOS entry (intercepted before it executes)
//! - 0x0006-0x0007: Top of TPA (programs read this for stack init)
//! - 0x0100: Program load address (TPA start)

use std::io::Write;
use z80_cpu::{Cpu, SimpleBus, Z80};

fn run_zex(binary: &[u8]) -> bool {
    let mut bus = SimpleBus::new();
    bus.load(0x0100, binary);
    bus.load(0x0000, &[0x76]); // HALT
    bus.load(0x0005, &[0xC9]); // RET
    bus.load(0x0006, &[0x00, 0xFE]);

    let mut cpu = Z80::new();
    cpu.regs_mut().pc = 0x0100;

    let mut output = String::new();
    let mut instructions: u64 = 0;

    loop {
        let pc = cpu.pc();

        if pc == 0x0000 || cpu.is_halted() {
            eprintln!("Warm boot at instruction {instructions}");
            break;
        }

        // BDOS call: print, then let the RET at 0x0005 return to the caller
        if pc == 0x0005 {
            let regs = cpu.regs();
            match regs.c() {
                2 => {
                    let ch = regs.e() as char;
                    eprint!("{ch}");
                    output.push(ch);
                }
                9 => {
                    let mut address = regs.de;
                    while bus.peek(address) != b'$' {
                        let ch = bus.peek(address) as char;
                        eprint!("{ch}");
                        output.push(ch);
                        address = address.wrapping_add(1);
                    }
                }
                func => eprintln!("\nUnknown BDOS function: {func}"),
            }
            let _ = std::io::stderr().flush();
        }

        cpu.run_instruction(&mut bus);
        instructions += 1;
        if instructions % 10_000_000 == 0 {
            eprintln!("[{instructions} instructions]");
        }
    }

    eprintln!("\nTotal: {instructions} instructions, {} T-states", cpu.clock());
    !output.contains("ERROR")
}

#[test]
#[ignore = "requires tests/data/zexdoc.com"]
fn zexdoc() {
    let binary = std::fs::read("tests/data/zexdoc.com").expect("tests/data/zexdoc.com not found");
    assert!(run_zex(&binary), "ZEXDOC failed");
}

#[test]
#[ignore = "requires tests/data/zexall.com"]
fn zexall() {
    let binary = std::fs::read("tests/data/zexall.com").expect("tests/data/zexall.com not found");
    assert!(run_zex(&binary), "ZEXALL failed");
}
