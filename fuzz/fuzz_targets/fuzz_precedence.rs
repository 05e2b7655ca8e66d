#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use qsol::{Configuration, OperatorKind};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    rotation: u8,
    swap: bool,
    hide_and: bool,
    hide_prox: bool,
    query: &'a str,
}

fuzz_target!(|input: Input| {
    let mut order = OperatorKind::ALL;
    order.rotate_left(input.rotation as usize % order.len());
    if input.swap {
        order.swap(0, 1);
    }

    let mut config = Configuration::default();
    config
        .set_precedence(order)
        .hide_operators(false, input.hide_and, false, input.hide_prox)
        .add_operator(OperatorKind::And, "AND")
        .add_operator(OperatorKind::Proximity, "/");
    let _ = qsol::compile_query("body", input.query, &config);
});
