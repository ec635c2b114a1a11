//! Compiles emitted C with the host toolchain and drives the loaded shared
//! object through the FFI surface. Skipped silently when no C compiler is
//! present.

use shdl_conformance::{compile, host_cc_available};
use shdl_driver::{Circuit, Toolchain};

const HALF_ADDER: &str = "component HA(A, B) -> (Sum, Carry) {
    x: XOR;
    a: AND;
    connect {
        A -> x.A;
        B -> x.B;
        A -> a.A;
        B -> a.B;
        x.O -> Sum;
        a.O -> Carry;
    }
}";

fn build_circuit(source: &str) -> Option<Circuit> {
    if !host_cc_available() {
        return None;
    }
    let compiled = compile(source).expect_clean();
    let dir = tempfile::tempdir().unwrap();
    let c_path = dir.path().join("sim.c");
    let lib_path = dir.path().join(format!("sim.{}", std::env::consts::DLL_EXTENSION));
    std::fs::write(&c_path, compiled.c_source()).unwrap();
    Toolchain::new("cc", 1).compile(&c_path, &lib_path).unwrap();
    Some(Circuit::load(&lib_path).unwrap())
}

#[test]
fn native_half_adder_truth_table() {
    let Some(circuit) = build_circuit(HALF_ADDER) else {
        return;
    };
    for (a, b) in [(0u64, 0u64), (0, 1), (1, 0), (1, 1)] {
        circuit.reset();
        circuit.poke("A", a).unwrap();
        circuit.poke("B", b).unwrap();
        circuit.step(1);
        assert_eq!(circuit.peek("Sum").unwrap(), a ^ b);
        assert_eq!(circuit.peek("Carry").unwrap(), a & b);
    }
}

#[test]
fn native_matches_interpreter() {
    let source = "component Mix(A[2], B[2]) -> (Y[2]) {
        x1: XOR; x2: XOR;
        connect {
            A[1] -> x1.A; B[1] -> x1.B; x1.O -> Y[1];
            A[2] -> x2.A; B[2] -> x2.B; x2.O -> Y[2];
        }
    }";
    let Some(circuit) = build_circuit(source) else {
        return;
    };
    let compiled = compile(source).expect_clean();
    let mut sim = compiled.simulator();

    for a in 0u64..4 {
        for b in 0u64..4 {
            circuit.reset();
            circuit.poke("A", a).unwrap();
            circuit.poke("B", b).unwrap();
            circuit.step(2);

            sim.reset();
            sim.poke("A", a);
            sim.poke("B", b);
            sim.step(2);

            assert_eq!(
                circuit.peek("Y").unwrap(),
                sim.peek("Y").unwrap(),
                "A={a} B={b}"
            );
        }
    }
}

#[test]
fn native_masking_and_unknown_names() {
    let Some(circuit) = build_circuit(HALF_ADDER) else {
        return;
    };
    circuit.reset();
    circuit.poke("A", 0xFF).unwrap();
    circuit.step(0);
    assert_eq!(circuit.peek("A").unwrap(), 1, "width-1 poke masks to 1 bit");
    // Unknown names read as 0 by contract.
    assert_eq!(circuit.peek("NoSuchSignal").unwrap(), 0);
}

#[test]
fn native_internal_words_visible() {
    let Some(circuit) = build_circuit(HALF_ADDER) else {
        return;
    };
    circuit.reset();
    circuit.poke("A", 1).unwrap();
    circuit.poke("B", 1).unwrap();
    circuit.step(1);
    assert_eq!(circuit.peek("AND_O_0").unwrap(), 1);
    assert_eq!(circuit.peek("XOR_O_0").unwrap(), 0);
}
