// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    one = { "1", Some(true) },
    true_upper = { "TRUE", Some(true) },
    yes = { " yes ", Some(true) },
    on = { "on", Some(true) },
    zero = { "0", Some(false) },
    false_word = { "false", Some(false) },
    no = { "no", Some(false) },
    off = { "Off", Some(false) },
    garbage = { "maybe", None },
    empty = { "", None },
)]
fn parse_bool_values(input: &str, expected: Option<bool>) {
    assert_eq!(parse_bool(input), expected);
}

#[test]
fn split_pathext_drops_empty_segments() {
    assert_eq!(
        split_pathext(".COM;.EXE;;.BAT; "),
        vec![".COM".to_string(), ".EXE".to_string(), ".BAT".to_string()]
    );
    assert!(split_pathext("").is_empty());
}

#[test]
fn name_constants_match_variables() {
    assert_eq!(FAKEPROC_ALLOW_UNREGISTERED, "FAKEPROC_ALLOW_UNREGISTERED");
    assert_eq!(FAKEPROC_KEEP_LAST_PROCESS, "FAKEPROC_KEEP_LAST_PROCESS");
    assert_eq!(PATHEXT, "PATHEXT");
}
