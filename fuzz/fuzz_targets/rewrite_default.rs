#![no_main]

use libfuzzer_sys::fuzz_target;
use stubfix_edit::rewrite_content;
use stubfix_types::rule::default_rules;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else { return };
    let rules = default_rules();

    let Ok(once) = rewrite_content(s, &rules) else { return };
    let twice = rewrite_content(&once.text, &rules).expect("default rules are valid");

    assert_eq!(once.text, twice.text);
    assert_eq!(twice.replacements(), 0);
});
