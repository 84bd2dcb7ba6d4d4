/*!
 * Text tree rendering of the walked hierarchy
 */

use std::io;
use std::path::Path;

use crate::ignore_index::IgnoreIndex;
use crate::types::{RootKind, RootPath, RootSet};
use crate::walker::{walk, Node, Visitor};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Renders roots as an indented tree with box-drawing connectors
pub struct TreeRenderer<'a> {
    index: &'a IgnoreIndex,
    lines: Vec<String>,
    /// Prefix for the current depth, one segment per open directory
    prefix: Vec<&'static str>,
}

impl<'a> TreeRenderer<'a> {
    /// Create a new renderer
    pub fn new(index: &'a IgnoreIndex) -> Self {
        Self {
            index,
            lines: Vec::new(),
            prefix: Vec::new(),
        }
    }

    /// Render `roots` into a newline-joined tree, empty if nothing resolved
    pub fn render(mut self, roots: &RootSet, recursive: bool) -> String {
        walk(roots, self.index, recursive, &mut self);
        self.finish()
    }

    /// The rendered tree so far
    pub fn finish(self) -> String {
        self.lines.join("\n")
    }

    fn current_prefix(&self) -> String {
        self.prefix.concat()
    }
}

impl Visitor for TreeRenderer<'_> {
    fn visit_root(&mut self, root: &RootPath) {
        match root.kind {
            RootKind::Directory => {
                self.lines.push(format!("{}/", root.name()));
                self.prefix = vec![SPACE];
            }
            RootKind::File => {
                self.lines.push(root.name());
                self.prefix.clear();
            }
        }
    }

    fn visit_entry(&mut self, node: &Node<'_>) {
        let connector = if node.is_last { LAST_BRANCH } else { BRANCH };
        let suffix = if node.is_dir { "/" } else { "" };
        self.lines.push(format!(
            "{}{}{}{}",
            self.current_prefix(),
            connector,
            node.name,
            suffix
        ));
    }

    fn enter_dir(&mut self, node: &Node<'_>) {
        self.prefix.push(if node.is_last { SPACE } else { PIPE });
    }

    fn leave_dir(&mut self, _node: &Node<'_>) {
        self.prefix.pop();
    }

    fn unreadable_dir(&mut self, _dir: &Path, error: &io::Error) {
        if error.kind() == io::ErrorKind::PermissionDenied {
            self.lines
                .push(format!("{}Permission Denied", self.current_prefix()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn fixture() -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let root = dir.path().join("proj");
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join("Docs")).unwrap();
        fs::write(root.join("README.md"), "r").unwrap();
        fs::write(root.join("build.rs"), "b").unwrap();
        fs::write(root.join("src/main.rs"), "m").unwrap();
        fs::write(root.join("src/nested/deep.rs"), "d").unwrap();
        fs::write(root.join("Docs/guide.md"), "g").unwrap();
        let root = root.canonicalize().unwrap();
        (dir, root)
    }

    fn render(root: &Path, recursive: bool) -> String {
        let roots = RootSet::resolve(&[root.to_string_lossy()]);
        let index = IgnoreIndex::new(&roots.paths(), &[], root);
        TreeRenderer::new(&index).render(&roots, recursive)
    }

    #[test]
    fn test_recursive_tree() {
        let (_dir, root) = fixture();
        let expected = [
            "proj/",
            "    ├── build.rs",
            "    ├── Docs/",
            "    │   └── guide.md",
            "    ├── README.md",
            "    └── src/",
            "        ├── main.rs",
            "        └── nested/",
            "            └── deep.rs",
        ]
        .join("\n");
        assert_eq!(render(&root, true), expected);
    }

    #[test]
    fn test_flat_tree_lists_directories_without_contents() {
        let (_dir, root) = fixture();
        let expected = [
            "proj/",
            "    ├── build.rs",
            "    ├── Docs/",
            "    ├── README.md",
            "    └── src/",
        ]
        .join("\n");
        assert_eq!(render(&root, false), expected);
    }

    #[test]
    fn test_file_root_and_empty_roots() {
        let (_dir, root) = fixture();
        assert_eq!(render(&root.join("build.rs"), true), "build.rs");

        let roots = RootSet::resolve(&["/definitely/not/here"]);
        let index = IgnoreIndex::new(&roots.paths(), &[], &root);
        assert_eq!(TreeRenderer::new(&index).render(&roots, true), "");
    }

    #[test]
    fn test_ignored_entries_are_not_rendered() {
        let (_dir, root) = fixture();
        fs::write(root.join(".gitignore"), "*.md\n").unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();

        let tree = render(&root, true);
        assert!(!tree.contains("README.md"));
        assert!(!tree.contains("guide.md"));
        assert!(!tree.contains(".git/"));
        assert!(tree.contains("    ├── .gitignore"));
        // Docs is still listed, it just has nothing to show
        assert!(tree.contains("Docs/"));
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_denied_sentinel() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, root) = fixture();
        let locked = root.join("src/nested");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Running with privileges that bypass permission bits
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let tree = render(&root, true);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(tree.contains("        └── nested/\n            Permission Denied"));
    }
}
