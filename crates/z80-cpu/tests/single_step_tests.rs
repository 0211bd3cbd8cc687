//! Integration tests using Tom Harte's `SingleStepTests` for the Z80.
//!
//! Each JSON file holds 1,000 cases for one opcode, comparing register,
//! memory and T-state totals after a single instruction.
//!
//! Test data lives in `test-data/z80/v1/`.

use serde::Deserialize;
use std::fs;
use std::panic;
use std::path::Path;
use z80_cpu::{InterruptMode, SimpleBus, Z80};

/// JSON test case format.
#[derive(Deserialize)]
struct TestCase {
    name: String,
    initial: CpuState,
    #[serde(rename = "final")]
    final_state: CpuState,
    cycles: Vec<serde_json::Value>,
    #[serde(default)]
    ports: Vec<(u16, u8, String)>,
}

/// JSON CPU state format.
#[derive(Deserialize)]
struct CpuState {
    pc: u16,
    sp: u16,
    a: u8,
    b: u8,
    c: u8,
    d: u8,
    e: u8,
    f: u8,
    h: u8,
    l: u8,
    i: u8,
    r: u8,
    ix: u16,
    iy: u16,
    wz: u16,
    #[serde(rename = "af_")]
    af_alt: u16,
    #[serde(rename = "bc_")]
    bc_alt: u16,
    #[serde(rename = "de_")]
    de_alt: u16,
    #[serde(rename = "hl_")]
    hl_alt: u16,
    iff1: u8,
    iff2: u8,
    im: u8,
    ei: u8,
    q: u8,
    ram: Vec<(u16, u8)>,
}

fn pair(hi: u8, lo: u8) -> u16 {
    u16::from_le_bytes([lo, hi])
}

/// Set up the CPU and bus from the initial test state.
fn setup(cpu: &mut Z80, bus: &mut SimpleBus, state: &CpuState, ports: &[(u16, u8, String)]) {
    for &(address, value) in &state.ram {
        bus.load(address, &[value]);
    }

    for (port, value, dir) in ports {
        if dir == "r" {
            bus.set_port(*port, *value);
        }
    }

    let regs = cpu.regs_mut();
    regs.af = pair(state.a, state.f);
    regs.bc = pair(state.b, state.c);
    regs.de = pair(state.d, state.e);
    regs.hl = pair(state.h, state.l);
    regs.af_alt = state.af_alt;
    regs.bc_alt = state.bc_alt;
    regs.de_alt = state.de_alt;
    regs.hl_alt = state.hl_alt;
    regs.ix = state.ix;
    regs.iy = state.iy;
    regs.sp = state.sp;
    regs.pc = state.pc;
    regs.ir = pair(state.i, state.r);
    regs.wz = state.wz;

    cpu.set_iff(state.iff1 != 0, state.iff2 != 0);
    cpu.set_interrupt_mode(InterruptMode::try_from(state.im).unwrap_or_default());
    cpu.set_interrupt_blocked(state.ei != 0);
    cpu.set_q(state.q);
}

/// Compare the CPU/bus state against expected, returning a list of mismatches.
fn compare(cpu: &Z80, bus: &SimpleBus, expected: &CpuState) -> Vec<String> {
    let mut errors = Vec::new();
    let regs = cpu.regs();

    check_u16(&mut errors, "AF", regs.af, pair(expected.a, expected.f));
    check_u16(&mut errors, "BC", regs.bc, pair(expected.b, expected.c));
    check_u16(&mut errors, "DE", regs.de, pair(expected.d, expected.e));
    check_u16(&mut errors, "HL", regs.hl, pair(expected.h, expected.l));
    check_u16(&mut errors, "AF'", regs.af_alt, expected.af_alt);
    check_u16(&mut errors, "BC'", regs.bc_alt, expected.bc_alt);
    check_u16(&mut errors, "DE'", regs.de_alt, expected.de_alt);
    check_u16(&mut errors, "HL'", regs.hl_alt, expected.hl_alt);
    check_u16(&mut errors, "IX", regs.ix, expected.ix);
    check_u16(&mut errors, "IY", regs.iy, expected.iy);
    check_u16(&mut errors, "SP", regs.sp, expected.sp);
    check_u16(&mut errors, "PC", regs.pc, expected.pc);
    check_u8(&mut errors, "I", regs.i(), expected.i);
    check_u8(&mut errors, "R", regs.r(), expected.r);
    check_u16(&mut errors, "WZ", regs.wz, expected.wz);

    if u8::from(cpu.iff1()) != expected.iff1 {
        errors.push(format!("IFF1: got {}, want {}", cpu.iff1(), expected.iff1));
    }
    if u8::from(cpu.iff2()) != expected.iff2 {
        errors.push(format!("IFF2: got {}, want {}", cpu.iff2(), expected.iff2));
    }
    check_u8(&mut errors, "IM", u8::from(cpu.interrupt_mode()), expected.im);
    if u8::from(cpu.interrupt_blocked()) != expected.ei {
        errors.push(format!("EI: got {}, want {}", cpu.interrupt_blocked(), expected.ei));
    }
    check_u8(&mut errors, "Q", cpu.q(), expected.q);

    for &(address, want) in &expected.ram {
        check_u8(&mut errors, &format!("RAM[${address:04X}]"), bus.peek(address), want);
    }

    errors
}

fn check_u8(errors: &mut Vec<String>, name: &str, actual: u8, expected: u8) {
    if actual != expected {
        errors.push(format!("{name}: got ${actual:02X}, want ${expected:02X}"));
    }
}

fn check_u16(errors: &mut Vec<String>, name: &str, actual: u16, expected: u16) {
    if actual != expected {
        errors.push(format!("{name}: got ${actual:04X}, want ${expected:04X}"));
    }
}

/// Opcode files whose expectations assume HALT advances PC. Here PC stays on
/// the HALT opcode until a signal is taken.
const HALT_FILES: &[&str] = &["76.json", "dd 76.json", "fd 76.json"];

/// Run all Z80 SingleStepTests.
#[test]
#[ignore = "requires test-data/z80, run with --ignored"]
fn run_all() {
    let test_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("parent of crate dir")
        .parent()
        .expect("workspace root")
        .join("test-data/z80/v1");

    if !test_dir.exists() {
        eprintln!("Test data not found at {}", test_dir.display());
        eprintln!("Skipping SingleStepTests.");
        return;
    }

    let mut filenames: Vec<String> = Vec::new();
    for opcode in 0..=0xFFu8 {
        if !matches!(opcode, 0xCB | 0xDD | 0xED | 0xFD) {
            filenames.push(format!("{opcode:02x}.json"));
        }
    }
    for prefix in ["cb", "dd", "ed", "fd", "dd cb __", "fd cb __"] {
        for opcode in 0..=0xFFu8 {
            filenames.push(format!("{prefix} {opcode:02x}.json"));
        }
    }

    let mut total_pass = 0u64;
    let mut total_fail = 0u64;
    let mut total_files = 0u32;

    for filename in &filenames {
        let path = test_dir.join(filename);
        if !path.exists() || HALT_FILES.contains(&filename.as_str()) {
            continue;
        }

        let data = fs::read_to_string(&path).unwrap_or_else(|e| {
            panic!("Failed to read {}: {e}", path.display());
        });
        let tests: Vec<TestCase> = serde_json::from_str(&data).unwrap_or_else(|e| {
            panic!("Failed to parse {}: {e}", path.display());
        });

        let mut file_pass = 0u32;
        let mut file_fail = 0u32;
        let mut first_failures: Vec<String> = Vec::new();

        for test in &tests {
            let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
                let mut cpu = Z80::new();
                let mut bus = SimpleBus::new();

                setup(&mut cpu, &mut bus, &test.initial, &test.ports);
                let cycles = cpu.run_instruction(&mut bus);

                let mut errors = compare(&cpu, &bus, &test.final_state);
                if cycles as usize != test.cycles.len() {
                    errors.push(format!("cycles: got {cycles}, want {}", test.cycles.len()));
                }
                errors
            }));

            match result {
                Ok(errors) if errors.is_empty() => file_pass += 1,
                Ok(errors) => {
                    file_fail += 1;
                    if first_failures.len() < 5 {
                        first_failures.push(format!("  FAIL [{}]: {}", test.name, errors.join(", ")));
                    }
                }
                Err(_) => {
                    file_fail += 1;
                    if first_failures.len() < 5 {
                        first_failures.push(format!("  PANIC [{}]", test.name));
                    }
                }
            }
        }

        let status = if file_fail == 0 { "PASS" } else { "FAIL" };
        println!("{filename}: {status}: {file_pass}/{} passed", file_pass + file_fail);
        for msg in &first_failures {
            println!("{msg}");
        }

        total_pass += u64::from(file_pass);
        total_fail += u64::from(file_fail);
        total_files += 1;
    }

    println!();
    println!("=== Z80 SingleStepTests Summary ===");
    println!(
        "Files: {total_files}, Total: {}, Pass: {total_pass}, Fail: {total_fail}",
        total_pass + total_fail
    );

    assert_eq!(total_fail, 0, "{total_fail} tests failed");
}
