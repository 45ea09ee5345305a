// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    plain = { "encode" },
    with_dots = { "encode.fast" },
    almost_qualified = { "handbrake.encode" },
)]
fn bare_references(raw: &str) {
    assert_eq!(ActionRef::parse(raw), ActionRef::Bare(raw.to_string()));
}

#[test]
fn qualified_reference_splits_on_last_dot() {
    let parsed = ActionRef::parse("compressarr-handbrake.encode");
    assert_eq!(
        parsed,
        ActionRef::Qualified {
            plugin: PluginId::parse("compressarr-handbrake").unwrap(),
            name: "encode".to_string(),
        }
    );
    assert_eq!(parsed.name(), "encode");
}

#[test]
fn qualified_reference_with_scoped_plugin() {
    let parsed = ActionRef::parse("@acme/compressarr-enc.h265");
    match parsed {
        ActionRef::Qualified { plugin, name } => {
            assert_eq!(plugin.as_str(), "@acme/compressarr-enc");
            assert_eq!(name, "h265");
        }
        other => panic!("expected qualified, got {other:?}"),
    }
}

#[test]
fn qualified_reference_with_dotted_slug() {
    let parsed = ActionRef::parse("compressarr-x.y.encode");
    match parsed {
        ActionRef::Qualified { plugin, name } => {
            assert_eq!(plugin.as_str(), "compressarr-x.y");
            assert_eq!(name, "encode");
        }
        other => panic!("expected qualified, got {other:?}"),
    }
}

#[test]
fn trailing_dot_is_bare() {
    assert_eq!(
        ActionRef::parse("compressarr-x."),
        ActionRef::Bare("compressarr-x.".to_string())
    );
}

#[test]
fn display_round_trips() {
    for raw in ["encode", "compressarr-handbrake.encode", "@acme/compressarr-enc.h265"] {
        assert_eq!(ActionRef::parse(raw).to_string(), raw);
    }
}

#[test]
fn killed_is_not_a_failure() {
    assert!(ActionError::Killed.is_killed());
    assert!(!ActionError::failed("boom").is_killed());
}
