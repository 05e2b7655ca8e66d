#![no_main]

use libfuzzer_sys::fuzz_target;
use qsol::Configuration;

fuzz_target!(|data: &str| {
    // Arbitrary query text must compile or fail with a typed error, never panic
    let _ = qsol::compile_query("body", data, &Configuration::default());
});
