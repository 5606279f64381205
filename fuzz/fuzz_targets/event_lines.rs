#![no_main]

use libfuzzer_sys::fuzz_target;
use timed::{aggregate, Report};

fuzz_target!(|data: &[u8]| {
    // Arbitrary buffer contents must either aggregate or fail cleanly
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(entries) = aggregate(input.lines()) {
            let _ = Report::from_entries(entries).render();
        }
    }
});
