use std::collections::{HashMap, HashSet};

use c_backend::{is_reserved, sanitize, NameGenerator, RESERVED_WORDS};
use frontend::SymbolTable;
use proptest::prelude::*;

#[cfg(test)]
mod sanitize_properties {
    use super::*;

    fn identifier() -> impl Strategy<Value = String> {
        prop_oneof![
            prop::sample::select(RESERVED_WORDS.to_vec()).prop_map(str::to_string),
            (0u32..6).prop_map(|n| format!("v{}", n)),
            "[a-z]{1,6}",
        ]
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config {
            cases: 64,
            .. proptest::test_runner::Config::default()
        })]

        #[test]
        fn prop_sanitized_names_are_distinct_and_legal(names in prop::collection::hash_set(identifier(), 1..20)) {
            let mut symbols = SymbolTable::new();
            let mut ids = Vec::new();
            for name in &names {
                ids.push((symbols.add(name).unwrap(), name.clone()));
            }
            let mut fresh = NameGenerator::new('v');

            let mut emitted = HashMap::new();
            for (id, original) in &ids {
                let name = sanitize(&mut symbols, *id, &mut fresh).unwrap();
                prop_assert!(!is_reserved(&name));
                if !is_reserved(original) {
                    prop_assert_eq!(&name, original);
                }
                emitted.insert(*id, name);
            }
            let distinct: HashSet<_> = emitted.values().collect();
            prop_assert_eq!(distinct.len(), ids.len());

            for (id, _) in &ids {
                let again = sanitize(&mut symbols, *id, &mut fresh).unwrap();
                prop_assert_eq!(Some(&again), emitted.get(id));
            }
        }
    }
}
