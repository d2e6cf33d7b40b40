/*!
 * Integration tests for ignore rules and file discovery
 */

use dxtpack::core::discovery::discover_with_observer;
use dxtpack::core::ignore::{load_patterns, matches, IgnoreList, RuleSource};
use dxtpack::discover;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn test_load_patterns_skips_comments_and_blanks() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        ".dxtignore",
        "# comment\n\n*.pyc\n  dist/  \n/secret.txt\n",
    );

    let patterns = load_patterns(temp.path()).unwrap();
    assert_eq!(patterns, vec!["*.pyc", "dist/", "/secret.txt"]);
}

#[test]
fn test_missing_ignore_file_is_empty() {
    let temp = TempDir::new().unwrap();
    assert!(load_patterns(temp.path()).unwrap().is_empty());
}

#[test]
fn test_matches_semantics() {
    let patterns: Vec<String> = ["*.pyc", "/secret.txt", "docs/*.md", "build/**/out"]
        .iter()
        .map(|p| p.to_string())
        .collect();

    assert!(matches("a.pyc", &patterns));
    assert!(matches("deep/nested/b.pyc", &patterns));
    assert!(matches("secret.txt", &patterns));
    assert!(!matches("nested/secret.txt", &patterns));
    assert!(matches("docs/readme.md", &patterns));
    assert!(!matches("docs/sub/readme.md", &patterns));
    assert!(matches("build/x/y/out", &patterns));
    assert!(!matches("A.PYC", &patterns));
    assert!(matches(".git/config", &patterns));
}

#[test]
fn test_malformed_pattern_is_literal() {
    let patterns = vec!["[unclosed".to_string()];
    assert!(matches("[unclosed", &patterns));
    assert!(!matches("u", &patterns));
}

#[test]
fn test_negation_is_not_supported() {
    let patterns = vec!["*.log".to_string(), "!keep.log".to_string()];
    assert!(matches("keep.log", &patterns));
}

#[test]
fn test_ignored_tree_is_never_visited() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "main.js", "main");
    for i in 0..5 {
        write(
            temp.path(),
            &format!("node_modules/pkg{}/index.js", i),
            "sentinel",
        );
    }

    let mut ignore = IgnoreList::with_builtin();
    ignore.add_pattern("node_modules", RuleSource::IgnoreFile { line: 1 });

    let mut sentinel_visits = 0;
    let result = discover_with_observer(temp.path(), &ignore, &mut |path| {
        if path.starts_with("node_modules/") {
            sentinel_visits += 1;
        }
    })
    .unwrap();

    assert_eq!(sentinel_visits, 0);
    assert_eq!(result.ignored_count(), 1);
    assert_eq!(result.paths().collect::<Vec<_>>(), vec!["main.js"]);
}

#[test]
fn test_rule_attribution_prefers_first_rule() {
    let mut ignore = IgnoreList::with_builtin();
    ignore.add_pattern("*.tmp", RuleSource::IgnoreFile { line: 3 });
    ignore.add_pattern("cache.tmp", RuleSource::Config);

    let rule = ignore.first_match(Path::new("cache.tmp"), false).unwrap();
    assert_eq!(rule.source(), RuleSource::IgnoreFile { line: 3 });

    let rule = ignore.first_match(Path::new(".svn"), true).unwrap();
    assert_eq!(rule.source(), RuleSource::BuiltIn);
}

#[test]
fn test_excluded_count_matches_ignored_files() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.txt", "");
    write(temp.path(), "b.bak", "");
    write(temp.path(), "sub/c.bak", "");
    write(temp.path(), "sub/d.txt", "");

    let mut ignore = IgnoreList::new();
    ignore.add_pattern("*.bak", RuleSource::Config);

    let result = discover(temp.path(), &ignore).unwrap();
    assert_eq!(result.ignored_count(), 2);
    assert!(result.paths().all(|p| !p.ends_with(".bak")));
    assert_eq!(result.len(), 2);
}
