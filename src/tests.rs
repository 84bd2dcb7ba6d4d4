/*!
 * End-to-end tests for ClipTree
 */

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::ProgressBar;
use tempfile::tempdir;
use tracing_test::traced_test;

use crate::clipboard::MemoryClipboard;
use crate::config::Config;
use crate::error::ClipTreeError;
use crate::ignore_index::IgnoreIndex;
use crate::pipeline::{build_bundle, deliver, Bundle};
use crate::scanner::{FileCollector, UndetectedPolicy};
use crate::tree::TreeRenderer;
use crate::types::RootSet;

// Root with a nested .gitignore, used by most scenarios
fn setup_project() -> io::Result<(tempfile::TempDir, PathBuf)> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path().canonicalize()?;

    fs::write(root.join("a.txt"), "hello")?;
    fs::create_dir(root.join("sub"))?;
    fs::write(root.join("sub/.gitignore"), "*.log\n")?;
    fs::write(root.join("sub/b.log"), "x")?;
    fs::write(root.join("sub/c.txt"), "y")?;

    Ok((temp_dir, root))
}

fn config_for(root: &Path) -> Config {
    let mut config = Config::new([root.to_string_lossy()]);
    config.recursive = true;
    config.base_dir = Some(root.to_path_buf());
    config.clip = false;
    config
}

fn run(config: &Config) -> crate::error::Result<Bundle> {
    build_bundle(config, Arc::new(ProgressBar::hidden()))
}

fn relative_files(bundle: &Bundle, root: &Path) -> BTreeSet<String> {
    bundle
        .files
        .iter()
        .map(|f| {
            f.path
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[test]
fn test_nested_gitignore_scenario() {
    let (_dir, root) = setup_project().unwrap();
    let bundle = run(&config_for(&root)).unwrap();

    let files = relative_files(&bundle, &root);
    assert!(files.contains("a.txt"));
    assert!(files.contains("sub/c.txt"));
    assert!(!files.contains("sub/b.log"));
    // .gitignore files are ordinary text files
    assert!(files.contains("sub/.gitignore"));

    assert!(bundle.tree.contains("sub/"));
    assert!(bundle.tree.contains("c.txt"));
    assert!(!bundle.tree.contains("b.log"));
}

#[test]
fn test_manual_exclude_scenario() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    fs::write(root.join("readme.md"), "# readme").unwrap();
    fs::write(root.join("main.py"), "print('hi')").unwrap();

    let mut config = config_for(&root);
    config.exclude = vec!["*.md".to_string()];
    let bundle = run(&config).unwrap();

    assert_eq!(
        relative_files(&bundle, &root),
        BTreeSet::from(["main.py".to_string()])
    );
}

#[test]
fn test_empty_root_has_no_content() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();

    assert!(matches!(
        run(&config_for(&root)),
        Err(ClipTreeError::NoContent)
    ));
}

#[test]
fn test_missing_roots_only_has_no_content() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();

    let mut config = config_for(&root);
    config.paths = vec![root.join("nope").to_string_lossy().to_string()];
    assert!(matches!(run(&config), Err(ClipTreeError::NoContent)));
}

#[test]
fn test_non_recursive_collects_direct_children_only() {
    let (_dir, root) = setup_project().unwrap();
    let mut config = config_for(&root);
    config.recursive = false;

    let bundle = run(&config).unwrap();
    assert_eq!(
        relative_files(&bundle, &root),
        BTreeSet::from(["a.txt".to_string()])
    );
    assert!(bundle.tree.contains("sub/"));
    assert!(!bundle.tree.contains("c.txt"));
}

#[test]
fn test_default_ignores_apply_without_gitignore() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    fs::create_dir(root.join(".git")).unwrap();
    fs::write(root.join(".git/config"), "[core]").unwrap();
    fs::create_dir(root.join("__pycache__")).unwrap();
    fs::write(root.join("__pycache__/mod.pyc"), "cached").unwrap();
    fs::write(root.join("main.py"), "pass").unwrap();

    let bundle = run(&config_for(&root)).unwrap();
    assert_eq!(
        relative_files(&bundle, &root),
        BTreeSet::from(["main.py".to_string()])
    );
    assert!(!bundle.tree.contains(".git"));
    assert!(!bundle.tree.contains("__pycache__"));
}

#[test]
fn test_negation_keeps_file() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    fs::write(root.join(".gitignore"), "*.txt\n!keep.txt\n").unwrap();
    fs::write(root.join("drop.txt"), "drop").unwrap();
    fs::write(root.join("keep.txt"), "keep").unwrap();

    let bundle = run(&config_for(&root)).unwrap();
    let files = relative_files(&bundle, &root);
    assert!(files.contains("keep.txt"));
    assert!(!files.contains("drop.txt"));
}

#[test]
fn test_tree_and_list_agree() {
    let (_dir, root) = setup_project().unwrap();
    fs::create_dir_all(root.join("sub/deeper")).unwrap();
    fs::write(root.join("sub/deeper/d.rs"), "fn main() {}").unwrap();

    let bundle = run(&config_for(&root)).unwrap();

    let listed: BTreeSet<String> = bundle
        .files
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    let leaves: BTreeSet<String> = bundle
        .tree
        .lines()
        .skip(1)
        .map(|line| line.trim_start_matches(|c: char| " │├└─".contains(c)).to_string())
        .filter(|name| !name.ends_with('/'))
        .collect();

    assert_eq!(listed, leaves);
}

#[test]
fn test_collection_is_idempotent() {
    let (_dir, root) = setup_project().unwrap();
    let roots = RootSet::resolve(&[root.to_string_lossy()]);
    let index = IgnoreIndex::new(&roots.paths(), &[], &root);

    let first = FileCollector::new(&index, UndetectedPolicy::Include).collect(&roots, true);
    let second = FileCollector::new(&index, UndetectedPolicy::Include).collect(&roots, true);
    assert_eq!(first, second);

    let tree_a = TreeRenderer::new(&index).render(&roots, true);
    let tree_b = TreeRenderer::new(&index).render(&roots, true);
    assert_eq!(tree_a, tree_b);
}

#[test]
fn test_payload_is_byte_exact() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    fs::create_dir(root.join("src")).unwrap();
    fs::write(root.join("src/lib.rs"), "pub fn a() {}").unwrap();
    fs::write(root.join("Cargo.toml"), "[package]").unwrap();

    let mut config = config_for(&root);
    config.instruction = Some("Explain this".to_string());
    let bundle = run(&config).unwrap();

    let name = root.file_name().unwrap().to_string_lossy().to_string();
    let expected = format!(
        "<instruction>Explain this</instruction>\n\n\
         <fileTree>\n{name}/\n    ├── Cargo.toml\n    └── src/\n        └── lib.rs\n</fileTree>\n\n\
         <Cargo.toml>\n[package]\n</Cargo.toml>\n\n\
         <src/lib.rs>\npub fn a() {{}}\n</src/lib.rs>"
    );
    assert_eq!(bundle.payload, expected);
}

#[test]
fn test_deliver_to_clipboard_and_file() {
    let (dir, root) = setup_project().unwrap();
    let output = dir.path().join("payload.txt");

    let mut config = config_for(&root);
    config.clip = true;
    config.output_file = Some(output.clone());

    let bundle = run(&config).unwrap();
    let clipboard = MemoryClipboard::new();
    let destination = deliver(&bundle, &config, &clipboard).unwrap();

    assert!(destination.contains("clipboard"));
    assert!(destination.contains("payload.txt"));
    assert_eq!(clipboard.contents().as_deref(), Some(bundle.payload.as_str()));
    assert_eq!(fs::read_to_string(&output).unwrap(), bundle.payload);

    let report = bundle.report(destination);
    assert_eq!(report.files_copied, 3);
    assert_eq!(report.payload_bytes, bundle.payload.len());
}

#[test]
fn test_deliver_without_clipboard_leaves_it_untouched() {
    let (_dir, root) = setup_project().unwrap();
    let config = config_for(&root);

    let bundle = run(&config).unwrap();
    let clipboard = MemoryClipboard::new();
    deliver(&bundle, &config, &clipboard).unwrap();
    assert_eq!(clipboard.copies(), 0);
}

#[test]
fn test_undecodable_file_is_dropped_from_payload() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    fs::write(root.join("good.txt"), "fine").unwrap();
    // Latin-1 text: not binary, not UTF-8
    fs::write(root.join("latin.txt"), b"caf\xe9 au lait").unwrap();

    let bundle = run(&config_for(&root)).unwrap();
    assert_eq!(bundle.files.len(), 2);
    assert_eq!(bundle.assembly.included.len(), 1);
    assert_eq!(bundle.assembly.failed.len(), 1);
    assert!(bundle.payload.contains("<good.txt>"));
    assert!(!bundle.payload.contains("latin.txt>"));

    let mut config = config_for(&root);
    config.undetected = UndetectedPolicy::Exclude;
    let bundle = run(&config).unwrap();
    assert_eq!(bundle.files.len(), 1);
    assert!(bundle.assembly.failed.is_empty());
}

#[test]
#[traced_test]
fn test_diagnostics_are_logged() {
    let (_dir, root) = setup_project().unwrap();
    fs::write(root.join("blob.bin"), [0u8, 159, 146, 150, 0, 1, 2]).unwrap();
    fs::write(root.join(".gitignore"), "src/[unclosed\n").unwrap();

    let mut config = config_for(&root);
    config
        .paths
        .push(root.join("ghost").to_string_lossy().to_string());

    let bundle = run(&config).unwrap();
    assert_eq!(bundle.skipped_binary.len(), 1);
    assert_eq!(bundle.rejected_patterns.len(), 1);
    assert_eq!(bundle.missing_roots.len(), 1);
    assert_eq!(bundle.report("clipboard").missing_roots, 1);

    assert!(logs_contain("does not exist and will be skipped"));
    assert!(!logs_contain("Warning:"));
    assert!(logs_contain("Skipping binary file"));
    assert!(logs_contain("src/[unclosed"));
}

// A repository with its own .git, an anchored rule and a nested .gitignore
fn setup_repo(repo: &Path) -> io::Result<()> {
    fs::create_dir_all(repo.join(".git/logs"))?;
    fs::write(repo.join(".git/config"), "[core]")?;
    fs::write(repo.join(".git/HEAD"), "ref: refs/heads/main")?;
    fs::create_dir_all(repo.join("build"))?;
    fs::write(repo.join("build/out.txt"), "artifact")?;
    fs::create_dir_all(repo.join("sub"))?;
    fs::write(repo.join(".gitignore"), "/build/\n")?;
    fs::write(repo.join("sub/.gitignore"), "*.log\n")?;
    fs::write(repo.join("sub/b.log"), "x")?;
    fs::write(repo.join("sub/c.txt"), "y")?;
    fs::write(repo.join("main.py"), "pass")?;
    Ok(())
}

fn expected_repo_files() -> BTreeSet<String> {
    [".gitignore", "main.py", "sub/.gitignore", "sub/c.txt"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[test]
fn test_root_below_base_keeps_its_rules() {
    let temp_dir = tempdir().unwrap();
    let base = temp_dir.path().canonicalize().unwrap();
    let repo = base.join("repo");
    setup_repo(&repo).unwrap();

    let mut config = config_for(&repo);
    config.base_dir = Some(base.clone());
    let bundle = run(&config).unwrap();

    assert_eq!(relative_files(&bundle, &repo), expected_repo_files());
    assert!(!bundle.tree.contains(".git/"));
    assert!(!bundle.tree.contains("build/"));
    assert!(bundle.payload.contains("<repo/main.py>"));
}

#[test]
fn test_root_outside_base_keeps_its_rules() {
    let base_dir = tempdir().unwrap();
    let other = tempdir().unwrap();
    let repo = other.path().canonicalize().unwrap();
    setup_repo(&repo).unwrap();

    let mut config = config_for(&repo);
    config.base_dir = Some(base_dir.path().to_path_buf());
    let bundle = run(&config).unwrap();

    assert_eq!(relative_files(&bundle, &repo), expected_repo_files());
    assert!(!bundle.tree.contains(".git/"));
    // Files outside the base are tagged with their absolute path
    let tag = repo.join("main.py").to_string_lossy().replace('\\', "/");
    assert!(bundle.payload.contains(&format!("<{}>", tag)));
}

#[cfg(unix)]
#[test]
#[traced_test]
fn test_broken_links_and_special_files_are_skipped() {
    let (_dir, root) = setup_project().unwrap();
    std::os::unix::fs::symlink(root.join("gone.txt"), root.join("dangling.txt")).unwrap();
    let _socket = std::os::unix::net::UnixListener::bind(root.join("sub/app.sock")).unwrap();

    let bundle = run(&config_for(&root)).unwrap();
    let files = relative_files(&bundle, &root);
    assert!(!files.contains("dangling.txt"));
    assert!(!files.contains("sub/app.sock"));
    assert!(!bundle.tree.contains("dangling.txt"));
    assert!(!bundle.tree.contains("app.sock"));
    assert!(files.contains("sub/c.txt"));

    assert!(logs_contain("dangling.txt"));
    assert!(logs_contain("is neither a file nor a directory and will be skipped."));
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_reported() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, root) = setup_project().unwrap();
    let locked = root.join("locked");
    fs::create_dir(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(&locked).is_ok() {
        // Permissions are not enforced for root
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let bundle = run(&config_for(&root));
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    let bundle = bundle.unwrap();

    assert_eq!(bundle.unreadable_dirs.len(), 1);
    assert!(bundle.tree.contains("├── locked/\n    │   Permission Denied"));
    assert_eq!(bundle.report("clipboard").unreadable_dirs, 1);
}

