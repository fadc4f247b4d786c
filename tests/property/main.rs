use proptest::prelude::*;

use muddle::label::Label;
use muddle::tags::{MemoryTagStore, TagStore};

fn part() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,8}"
}

/// Names may not start with `_` outside muddle itself.
fn name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9_-]{0,7}"
}

fn label_text() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("checkout"), Just("package"), Just("deployment")],
        name(),
        proptest::option::of(part()),
        part(),
    )
        .prop_map(|(kind, name, role, tag)| match role {
            Some(role) => format!("{kind}:{name}{{{role}}}/{tag}"),
            None => format!("{kind}:{name}/{tag}"),
        })
}

proptest! {
    #[test]
    fn printed_labels_parse_back_to_themselves(text in label_text()) {
        let label = Label::parse(&text).unwrap();
        prop_assert_eq!(label.to_string(), text.clone());
        prop_assert_eq!(Label::parse(&label.to_string()).unwrap(), label);
    }

    #[test]
    fn full_wildcard_matches_every_label(text in label_text()) {
        let label = Label::parse(&text).unwrap();
        let everything = Label::parse("*:*{*}/*").unwrap();
        prop_assert!(label.matches(&everything));
        prop_assert!(label.matches(&label));
    }

    #[test]
    fn assert_and_retract_are_idempotent(
        texts in proptest::collection::vec(label_text(), 1..10),
        repeats in 1..4usize,
    ) {
        let labels: Vec<Label> = texts.iter().map(|t| Label::parse(t).unwrap()).collect();
        let mut store = MemoryTagStore::new();

        for _ in 0..repeats {
            for l in &labels {
                store.assert(l).unwrap();
            }
        }
        for l in &labels {
            prop_assert!(store.is_asserted(l));
        }
        let mut distinct = labels.clone();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(store.asserted_labels().unwrap().len(), distinct.len());

        for _ in 0..repeats {
            for l in &labels {
                store.retract(l).unwrap();
            }
        }
        prop_assert!(store.asserted_labels().unwrap().is_empty());
    }
}
