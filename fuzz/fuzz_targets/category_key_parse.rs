#![no_main]

use libfuzzer_sys::fuzz_target;
use vocsort::index::CategoryKey;

fuzz_target!(|data: &str| {
    if let Ok(key) = data.parse::<CategoryKey>() {
        let again: CategoryKey = key.to_string().parse().expect("displayed key must parse");
        assert_eq!(key, again);
    }
});
