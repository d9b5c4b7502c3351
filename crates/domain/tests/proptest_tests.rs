//! Property-based tests for domain value objects
//!
//! These tests use proptest to verify invariants across many random inputs.

use domain::{ActionKind, Credentials, LogPath, LogPattern, RemoteTarget};
use proptest::prelude::*;

// ============================================================================
// RemoteTarget Property Tests
// ============================================================================

mod remote_target_tests {
    use super::*;

    proptest! {
        #[test]
        fn host_and_port_survive_parsing(
            host in "[a-z][a-z0-9-]{0,20}(\\.[a-z]{2,6}){0,2}",
            port in 1u16..=u16::MAX
        ) {
            let target = RemoteTarget::parse(&format!("{host}:{port}"), Credentials::default());
            prop_assert!(target.is_ok());

            let target = target.unwrap();
            prop_assert_eq!(target.host(), host.as_str());
            prop_assert_eq!(target.port(), port);
        }

        #[test]
        fn display_parses_back(
            host in "[a-z][a-z0-9]{0,15}",
            port in 1u16..=u16::MAX
        ) {
            let target = RemoteTarget::parse(&format!("{host}:{port}"), Credentials::default()).unwrap();
            let reparsed = RemoteTarget::parse(&target.to_string(), Credentials::default()).unwrap();
            prop_assert_eq!(reparsed.host(), target.host());
            prop_assert_eq!(reparsed.port(), target.port());
        }
    }
}

// ============================================================================
// LogPath Property Tests
// ============================================================================

mod log_path_tests {
    use super::*;

    proptest! {
        #[test]
        fn watch_key_is_case_insensitive(path in "/[a-zA-Z0-9_./-]{1,40}") {
            let lower = LogPath::new(path.to_lowercase());
            let upper = LogPath::new(path.to_uppercase());
            prop_assert_eq!(lower.watch_key(), upper.watch_key());
        }

        #[test]
        fn watch_key_is_idempotent(path in "/[a-zA-Z0-9_./-]{1,40}") {
            let key = LogPath::new(path).watch_key();
            prop_assert_eq!(LogPath::new(key.clone()).watch_key(), key);
        }
    }
}

// ============================================================================
// LogPattern Property Tests
// ============================================================================

mod log_pattern_tests {
    use super::*;

    proptest! {
        #[test]
        fn literal_pattern_matches_line_containing_it(
            prefix in "[a-z ]{0,20}",
            needle in "[A-Za-z0-9]{1,12}",
            suffix in "[a-z ]{0,20}"
        ) {
            let pattern = LogPattern::new(&regex::escape(&needle)).unwrap();
            let line = format!("{prefix}{needle}{suffix}");
            prop_assert!(pattern.is_match(&line));
        }

        #[test]
        fn empty_pattern_matches_any_line(line in ".{0,80}") {
            let pattern = LogPattern::new("").unwrap();
            prop_assert!(pattern.is_match(&line));
        }
    }
}

// ============================================================================
// ActionKind Property Tests
// ============================================================================

mod action_kind_tests {
    use super::*;

    proptest! {
        #[test]
        fn registry_names_parse_in_any_case(upper in proptest::bool::ANY, idx in 0usize..2) {
            let kind = ActionKind::ALL[idx];
            let name = if upper { kind.name().to_uppercase() } else { kind.name().to_string() };
            prop_assert_eq!(name.parse::<ActionKind>().unwrap(), kind);
        }

        #[test]
        fn unregistered_names_are_rejected(name in "[a-z]{3,12}") {
            prop_assume!(name != "latency" && name != "restartservice");
            prop_assert!(name.parse::<ActionKind>().is_err());
        }
    }
}
