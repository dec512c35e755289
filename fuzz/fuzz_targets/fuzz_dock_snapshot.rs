#![no_main]

use anydock::{DockTree, DockTreeSnapshot};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    if json.len() > 8192 {
        return;
    }
    let Ok(snapshot) = DockTreeSnapshot::from_json(json) else {
        return;
    };
    // Anything that restores must already satisfy every tree invariant.
    let Ok(tree) = DockTree::from_snapshot(snapshot) else {
        return;
    };
    tree.validate().expect("restored tree validates");

    let again = DockTree::from_snapshot(tree.to_snapshot()).expect("re-restore");
    assert_eq!(again.to_snapshot(), tree.to_snapshot());
});
