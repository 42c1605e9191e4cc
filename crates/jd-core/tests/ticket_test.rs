use jd_core::ticket::{parse, parse_or_degraded, DecodeError, UNASSIGNED_LABEL};

#[test]
fn parse_full_encoding() {
    let record = parse("PROJ-1: Fix login page [Alice Martin] [Bug] [High]").unwrap();
    assert_eq!(record.key, "PROJ-1");
    assert_eq!(record.summary, "Fix login page");
    assert_eq!(record.assignee, "Alice Martin");
    assert_eq!(record.issue_type, "Bug");
    assert_eq!(record.priority, "High");
    assert!(record.is_assigned());
}

#[test]
fn parse_maps_unassigned_sentinel() {
    let record = parse("PROJ-2: Write docs [Unassigned] [Task] [Low]").unwrap();
    assert_eq!(record.assignee, UNASSIGNED_LABEL);
    assert!(!record.is_assigned());
}

#[test]
fn two_brackets_default_priority() {
    let record = parse("PROJ-3: Legacy entry [Bob] [Story]").unwrap();
    assert_eq!(record.issue_type, "Story");
    assert_eq!(record.priority, "Medium");
}

#[test]
fn extra_brackets_are_ignored() {
    let record = parse("PROJ-4: Odd [Bob] [Bug] [High] [extra]").unwrap();
    assert_eq!(record.priority, "High");
}

#[test]
fn summary_may_contain_colon_separator() {
    let record = parse("PROJ-5: Error: null pointer [Bob] [Bug] [High]").unwrap();
    assert_eq!(record.key, "PROJ-5");
    assert_eq!(record.summary, "Error: null pointer");
}

#[test]
fn missing_separator_fails() {
    assert_eq!(
        parse("PROJ-6 no separator [Bob] [Bug]"),
        Err(DecodeError::MissingSeparator)
    );
}

#[test]
fn one_bracket_fails() {
    assert_eq!(
        parse("PROJ-7: Only assignee [Bob]"),
        Err(DecodeError::TooFewBrackets { found: 1 })
    );
}

#[test]
fn degraded_keeps_key_and_assignee() {
    let record = parse_or_degraded("PROJ-8: Half encoded [Carol]");
    assert_eq!(record.key, "PROJ-8");
    assert_eq!(record.summary, "Half encoded");
    assert_eq!(record.assignee, "Carol");
    assert_eq!(record.issue_type, "");
    assert_eq!(record.priority, "Medium");
}

#[test]
fn degraded_without_separator_still_has_key() {
    let record = parse_or_degraded("PROJ-9");
    assert_eq!(record.key, "PROJ-9");
    assert_eq!(record.summary, "");
    assert_eq!(record.assignee, UNASSIGNED_LABEL);
}

#[test]
fn degraded_passes_valid_input_through() {
    let raw = "PROJ-10: Fine [Dan] [Task] [Highest]";
    assert_eq!(parse_or_degraded(raw), parse(raw).unwrap());
}
