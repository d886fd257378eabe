//! Property-based tests for the streaming parser.
//!
//! Uses `proptest` to generate value trees and adversarial fragmentations:
//!
//! - Dumped text must parse back to the generated tree.
//! - Splitting the same text into arbitrary fragments must not change the
//!   result, as long as splits stay off bare scalar tokens (fragment
//!   boundaries legitimately terminate those — fragments are lines). Trees
//!   whose leaves are all quoted strings exercise this: every split point,
//!   including ones inside string bodies, escapes, and `""` prefixes, must
//!   be invisible.
//! - Arbitrary printable input must never panic, only error.

use proptest::prelude::*;
use simpleon_core::{dump, ParseOptions, Parser, Value};

fn options() -> ParseOptions {
    ParseOptions {
        convert: true,
        multi: false,
    }
}

/// Feed the fragments in order, seal, and drain the queue.
fn parse_fragments(fragments: &[&str]) -> Vec<Value> {
    let mut parser = Parser::new(options());
    for fragment in fragments {
        parser.feed(fragment).expect("fragment should parse");
    }
    parser.seal().expect("seal should succeed");
    let mut values = Vec::new();
    while let Some(value) = parser.extract() {
        values.push(value);
    }
    values
}

// ============================================================================
// Strategies
// ============================================================================

/// String contents with the interesting cases: empties, escapables, words
/// that look like other scalar types, unicode, and raw control bytes.
fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,16}",
        Just(String::new()),
        Just("line1\nline2".to_string()),
        Just("col\tsep".to_string()),
        Just("quote \" slash \\".to_string()),
        Just("null".to_string()),
        Just("12.5".to_string()),
        Just("caf\u{e9}".to_string()),
        Just("bell\u{7}bell".to_string()),
    ]
}

/// Trees whose only leaves are quoted strings: their dumped text contains no
/// bare tokens, so any fragmentation of it must parse identically.
fn arb_string_tree() -> impl Strategy<Value = Value> {
    let leaf = arb_text().prop_map(Value::quoted);
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::btree_map("[a-z_][a-z0-9_]{0,8}", inner, 0..4)
                .prop_map(Value::Dict),
        ]
    })
}

/// Floats that survive dump/parse exactly: finite and non-integral (an
/// integral float dumps without a fraction and would come back as an int).
fn arb_clean_float() -> impl Strategy<Value = f64> {
    (-100_000_000i64..100_000_000i64, 1u32..5u32).prop_filter_map(
        "must be finite and non-integral",
        |(mantissa, decimals)| {
            let f = mantissa as f64 / 10f64.powi(decimals as i32);
            (f.is_finite() && f.fract() != 0.0).then_some(f)
        },
    )
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1_000_000i64..1_000_000i64).prop_map(Value::Int),
        arb_clean_float().prop_map(Value::Float),
        arb_text().prop_map(Value::quoted),
    ]
}

/// Full value trees for the dump/parse round-trip. Unquoted strings are
/// excluded: the dumper canonicalizes them to quoted form by design.
fn arb_value_tree() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::btree_map("[a-z_][a-z0-9_]{0,8}", inner, 0..4)
                .prop_map(Value::Dict),
        ]
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn dump_then_parse_restores_tree(tree in arb_value_tree()) {
        let text = dump(&tree);
        let parsed = parse_fragments(&[&text]);
        prop_assert_eq!(parsed.len(), 1, "text: {:?}", text);
        prop_assert_eq!(&parsed[0], &tree, "text: {:?}", text);
    }

    #[test]
    fn fragment_partition_is_invariant(
        tree in arb_string_tree(),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..5),
    ) {
        let text = dump(&tree);
        let whole = parse_fragments(&[&text]);
        prop_assert_eq!(whole.len(), 1, "text: {:?}", text);
        prop_assert_eq!(&whole[0], &tree, "text: {:?}", text);

        let mut points: Vec<usize> = cuts
            .iter()
            .map(|ix| {
                let mut p = ix.index(text.len() + 1);
                while !text.is_char_boundary(p) {
                    p -= 1;
                }
                p
            })
            .collect();
        points.sort_unstable();
        points.dedup();

        let mut fragments = Vec::new();
        let mut prev = 0;
        for p in points {
            fragments.push(&text[prev..p]);
            prev = p;
        }
        fragments.push(&text[prev..]);

        let split = parse_fragments(&fragments);
        prop_assert_eq!(&split, &whole, "fragments: {:?}", fragments);
    }

    #[test]
    fn arbitrary_input_never_panics(
        junk in "[ -~]{0,64}",
        split in any::<prop::sample::Index>(),
    ) {
        let mut parser = Parser::new(ParseOptions { convert: true, multi: true });
        // junk is ASCII, so any index is a valid split point.
        let at = split.index(junk.len() + 1).min(junk.len());
        let _ = parser.feed(&junk[..at]);
        let _ = parser.feed(&junk[at..]);
        let _ = parser.seal();
        while parser.extract().is_some() {}
    }
}
