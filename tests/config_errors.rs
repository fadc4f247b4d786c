// tests/config_errors.rs

use std::io::Write;

use tempfile::NamedTempFile;

use muddle::config::{discover_root, load_and_validate, parse_description};
use muddle::errors::MuddleError;
use muddle_test_utils::builders::{TempTree, THREE_PACKAGES};

fn config_error(text: &str) -> String {
    match parse_description(text) {
        Err(MuddleError::ConfigError(msg)) => msg,
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_package_cycle_returns_structured_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[package.A]
roles = ["x86"]
depends = ["B"]

[package.B]
roles = ["x86"]
depends = ["A"]
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(MuddleError::CyclicDependency(msg)) => {
            assert!(msg.contains('A') || msg.contains('B'));
        }
        Err(e) => panic!("Expected CyclicDependency error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_references_are_config_errors() {
    let msg = config_error(
        r#"
[package.app]
roles = ["x86"]
checkouts = ["missing"]
"#,
    );
    assert!(msg.contains("missing"));

    let msg = config_error(
        r#"
[package.app]
roles = ["x86"]
depends = ["ghost"]
"#,
    );
    assert!(msg.contains("ghost"));

    let msg = config_error(
        r#"
[package.app]
roles = ["x86"]

[deployment.fs]
roles = ["arm"]
"#,
    );
    assert!(msg.contains("arm"));
}

#[test]
fn test_git_checkout_needs_repo() {
    let msg = config_error(
        r#"
[checkout.app]
vcs = "git"
"#,
    );
    assert!(msg.contains("app"));
}

#[test]
fn test_unknown_step_name_is_rejected() {
    let msg = config_error(
        r#"
[package.app]
roles = ["x86"]
[package.app.steps]
compiled = "make"
"#,
    );
    assert!(msg.contains("compiled"));
}

#[test]
fn test_bad_rule_label_is_malformed() {
    let result = parse_description(
        r#"
[package.app]
roles = ["x86"]

[[rule]]
target = "package:app{x86"
"#,
    );
    match result {
        Err(MuddleError::MalformedLabel { text, reason }) => {
            assert_eq!(text, "package:app{x86");
            assert!(reason.starts_with("[[rule]] #1"), "{reason}");
        }
        Err(e) => panic!("Expected MalformedLabel, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_bad_default_target_is_malformed() {
    let result = parse_description(
        r#"
[description]
default_targets = ["package:app/bu ilt"]

[package.app]
roles = ["x86"]
"#,
    );
    match result {
        Err(MuddleError::MalformedLabel { reason, .. }) => {
            assert!(reason.contains("default_targets"), "{reason}");
        }
        Err(e) => panic!("Expected MalformedLabel, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_fields_fail_to_parse() {
    let result = parse_description(
        r#"
[package.app]
roles = ["x86"]
colour = "blue"
"#,
    );
    assert!(matches!(result, Err(MuddleError::TomlError(_))));
}

#[test]
fn test_root_is_found_from_nested_directory() {
    let tree = TempTree::new(THREE_PACKAGES);
    let nested = tree.mkdir("obj/a/x86");
    assert_eq!(discover_root(None, &nested).unwrap(), tree.root());
}

#[test]
fn test_explicit_root_without_description_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let result = discover_root(Some(dir.path()), dir.path());
    assert!(matches!(result, Err(MuddleError::ConfigError(_))));
}
