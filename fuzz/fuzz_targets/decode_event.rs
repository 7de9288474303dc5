#![no_main]

use blox_core::EventRegistry;
use libfuzzer_sys::fuzz_target;

// Decoding arbitrary records must never panic, and whatever decodes must
// encode to a record that decodes again with the same envelope.
fuzz_target!(|data: &[u8]| {
    let Ok(record) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let registry = EventRegistry::with_builtins();
    let Ok(event) = registry.decode(&record, "fuzz") else {
        return;
    };
    let Ok(encoded) = event.to_json() else {
        return;
    };
    let again = registry.decode(&encoded, "fuzz").expect("re-decode");
    assert_eq!(again.kind_str(), event.kind_str());
    assert_eq!(again.entity_id(), event.entity_id());
    assert_eq!(again.group, event.group);
    assert_eq!(again.record_undo, event.record_undo);
});
