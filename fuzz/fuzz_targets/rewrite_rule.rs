#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use stubfix_edit::rewrite_content;
use stubfix_types::rule::ImportRule;

#[derive(Debug, Arbitrary)]
struct Input {
    pattern: String,
    replacement: String,
    contents: String,
    /// `None` stands for a line that is exactly the pattern.
    lines: Vec<Option<String>>,
}

fuzz_target!(|input: Input| {
    let rule = ImportRule::new(input.pattern, input.replacement);
    let rules = std::slice::from_ref(&rule);

    // Arbitrary rules over multi-byte text must never panic on slicing.
    let _ = rewrite_content(&input.contents, rules);

    // Whole-line imports: a second pass must leave the first pass alone.
    if rule.pattern.is_empty() || rule.pattern.contains('\n') || rule.replacement.contains('\n')
    {
        return;
    }
    let mut lines = Vec::with_capacity(input.lines.len());
    for line in &input.lines {
        match line {
            None => lines.push(rule.pattern.as_str()),
            Some(l) if l.contains('\n') || l.contains(rule.pattern.as_str()) => return,
            Some(l) => lines.push(l.as_str()),
        }
    }
    let stub = lines.join("\n");

    let once = rewrite_content(&stub, rules).expect("non-empty pattern");
    let twice = rewrite_content(&once.text, rules).expect("non-empty pattern");
    assert_eq!(once.text, twice.text);
    assert_eq!(twice.replacements(), 0);
});
