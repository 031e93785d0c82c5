//! Property tests for content hashing and artifact key computation.
//!
//! Version deduplication depends on the hasher being deterministic and blind
//! to formatting; artifact lookups depend on keys being pure functions of
//! their inputs. Both are checked here over generated inputs.

use procdoc_artifact::{
    doc_storage_path, feature_goal_doc_key, node_doc_key, sanitize_element_id, ContentHasher,
    GenerationMode, NamingScheme, Provider,
};
use proptest::prelude::*;

fn mode_strategy() -> impl Strategy<Value = Option<GenerationMode>> {
    prop_oneof![
        Just(None),
        Just(Some(GenerationMode::Local)),
        Just(Some(GenerationMode::Slow)),
    ]
}

fn provider_strategy() -> impl Strategy<Value = Option<Provider>> {
    prop_oneof![
        Just(None),
        Just(Some(Provider::Cloud)),
        Just(Some(Provider::Local)),
        Just(Some(Provider::Fallback)),
    ]
}

proptest! {
    #[test]
    fn prop_hash_is_deterministic(content in ".*") {
        prop_assert_eq!(ContentHasher::hash(&content), ContentHasher::hash(&content));
    }

    #[test]
    fn prop_hash_ignores_normalization(content in ".*") {
        let normalized = ContentHasher::normalize(&content);
        prop_assert_eq!(ContentHasher::hash(&content), ContentHasher::hash(&normalized));
    }

    #[test]
    fn prop_whitespace_variants_hash_identically(
        words in proptest::collection::vec("[a-z<>=\"/]{1,8}", 1..12),
        separators in proptest::collection::vec(prop_oneof![
            Just(" "), Just("  "), Just("\t"), Just("\n"), Just("\r\n"), Just(" \t\r\n ")
        ], 12),
    ) {
        let single = words.join(" ");
        let mut messy = String::from("\n\t ");
        for (i, word) in words.iter().enumerate() {
            if i > 0 {
                messy.push_str(separators[i]);
            }
            messy.push_str(word);
        }
        messy.push_str("\r\n\r\n");
        prop_assert_eq!(ContentHasher::hash(&single), ContentHasher::hash(&messy));
    }

    #[test]
    fn prop_sanitized_ids_are_path_safe(id in ".*") {
        let sanitized = sanitize_element_id(&id);
        prop_assert_eq!(sanitized.chars().count(), id.chars().count());
        prop_assert!(sanitized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
    }

    #[test]
    fn prop_paths_are_deterministic(
        file in "[a-z-]{1,12}\\.bpmn",
        id in "[A-Za-z0-9 _#]{1,12}",
        mode in mode_strategy(),
        provider in provider_strategy(),
    ) {
        let key = node_doc_key(&file, &id);
        prop_assert_eq!(&key, &node_doc_key(&file, &id));
        prop_assert_eq!(
            doc_storage_path(&key, mode, provider),
            doc_storage_path(&key, mode, provider)
        );
    }

    #[test]
    fn prop_provider_only_matters_for_slow_mode(
        key in "nodes/[a-z]{1,8}/[A-Za-z0-9_]{1,8}\\.html",
        provider in provider_strategy(),
    ) {
        for mode in [None, Some(GenerationMode::Local)] {
            prop_assert_eq!(
                doc_storage_path(&key, mode, provider).mode_path,
                doc_storage_path(&key, mode, None).mode_path
            );
        }
    }

    #[test]
    fn prop_distinct_parents_never_collide(
        subprocess in "[a-z-]{1,10}\\.bpmn",
        id in "[A-Za-z0-9_]{1,10}",
        parent_a in "[a-z]{1,10}",
        parent_b in "[a-z]{1,10}",
    ) {
        prop_assume!(parent_a != parent_b);
        let a = feature_goal_doc_key(&subprocess, &id, &NamingScheme::hierarchical(format!("{parent_a}.bpmn")));
        let b = feature_goal_doc_key(&subprocess, &id, &NamingScheme::hierarchical(format!("{parent_b}.bpmn")));
        prop_assert_ne!(a, b);
    }
}

#[test]
fn node_doc_storage_for_cloud_llm() {
    let key = node_doc_key("mortgage-se-household.bpmn", "Task_1");
    assert_eq!(key, "nodes/mortgage-se-household/Task_1.html");

    let paths = doc_storage_path(&key, Some(GenerationMode::Slow), Some(Provider::Cloud));
    assert_eq!(
        paths.mode_path,
        "docs/slow/chatgpt/nodes/mortgage-se-household/Task_1.html"
    );
    assert_eq!(
        paths.legacy_path,
        "docs/nodes/mortgage-se-household/Task_1.html"
    );
}

#[test]
fn element_ids_with_spaces_and_symbols() {
    assert_eq!(sanitize_element_id("Sub Process#7"), "Sub-Process-7");
}

#[test]
fn hash_is_64_hex_chars_and_stable() {
    let hash = ContentHasher::hash("<bpmn:definitions id=\"d\"/>");
    assert_eq!(hash.to_string().len(), 64);
    assert_eq!(hash, ContentHasher::hash("  <bpmn:definitions   id=\"d\"/>\n"));
}
