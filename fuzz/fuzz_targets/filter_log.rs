#![no_main]

use blox_core::EventRegistry;
use blox_core::engine::filter;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let registry = EventRegistry::with_builtins();
    let text = String::from_utf8_lossy(data);
    let events: Vec<_> = text
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .filter_map(|record| registry.decode(&record, "fuzz").ok())
        .collect();
    let input = events.len();

    for forward in [true, false] {
        let merged = filter(events.clone(), forward);
        assert!(merged.len() <= input);
        assert!(merged.iter().all(|event| !event.is_null()));
    }
});
