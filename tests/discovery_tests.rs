//! Resource discovery over real directory trees.

use convene::resource::{discover, Role};
use std::fs::{self, File};
use std::path::Path;

fn touch(path: &Path) {
    File::create(path).unwrap();
}

fn resource_dir(base: &Path, name: &str, files: &[&str]) {
    let dir = base.join(name);
    fs::create_dir_all(&dir).unwrap();
    for f in files {
        touch(&dir.join(f));
    }
}

#[test]
fn test_full_tree_grouping() {
    let tmp = tempfile::tempdir().unwrap();
    resource_dir(
        tmp.path(),
        "pets",
        &[
            "pets.controller.json",
            "pets.router.json",
            "pets.schema.json",
            "pets.service.json",
            "README.md",
        ],
    );
    resource_dir(tmp.path(), "users", &["users.route.json", "helpers.txt"]);
    resource_dir(tmp.path(), "audit", &["audit.service.json"]);

    let found = discover(tmp.path()).unwrap();
    assert_eq!(found.len(), 3);

    let pets = &found["pets"];
    assert_eq!(pets.roles.len(), 4);
    assert!(pets.has_router());

    let users = &found["users"];
    assert_eq!(users.roles.len(), 1);
    assert!(users.has_router());

    let audit = &found["audit"];
    assert!(!audit.has_router());
    assert!(audit.role_path(Role::Service).is_some());
}

#[test]
fn test_non_matching_files_ignored() {
    let tmp = tempfile::tempdir().unwrap();
    resource_dir(
        tmp.path(),
        "misc",
        &["notes.txt", "router.json", "misc.model.json", "misc"],
    );

    let found = discover(tmp.path()).unwrap();
    assert!(found["misc"].roles.is_empty());
}

#[test]
fn test_empty_tree_is_not_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(discover(tmp.path()).unwrap().is_empty());
    assert!(discover(&tmp.path().join("missing")).unwrap().is_empty());
}

#[test]
fn test_grouping_is_deterministic_and_sorted() {
    let tmp = tempfile::tempdir().unwrap();
    for name in ["zebra", "alpha", "kilo"] {
        resource_dir(tmp.path(), name, &[&format!("{name}.router.json")]);
    }

    let first = discover(tmp.path()).unwrap();
    let second = discover(tmp.path()).unwrap();
    assert_eq!(
        first.keys().collect::<Vec<_>>(),
        second.keys().collect::<Vec<_>>()
    );
    assert_eq!(first.keys().collect::<Vec<_>>(), vec!["alpha", "kilo", "zebra"]);
}

#[test]
fn test_duplicate_role_last_in_sort_order_wins() {
    let tmp = tempfile::tempdir().unwrap();
    resource_dir(
        tmp.path(),
        "pets",
        &["aaa.router.json", "zzz.route.json", "mmm.router.yaml"],
    );

    let found = discover(tmp.path()).unwrap();
    let kept = found["pets"].role_path(Role::Router).unwrap();
    assert!(kept.ends_with("zzz.route.json"), "kept {kept:?}");
}
