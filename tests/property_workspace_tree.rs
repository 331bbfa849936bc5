//! Property tests for workspace path arithmetic and tree building.

use proptest::prelude::*;
use uuid::Uuid;

use teamspace::domain::models::workspace::{is_within, join_path, rewrite_prefix, split_full_path};
use teamspace::domain::models::{build_tree, TreeNode, WorkspaceNode};

fn segment() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

fn path(max_depth: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 0..=max_depth).prop_map(|segments| segments.join("/"))
}

fn count(nodes: &[TreeNode]) -> usize {
    nodes.iter().map(|n| 1 + count(&n.children)).sum()
}

proptest! {
    #[test]
    fn split_then_join_is_identity(parent in path(4), name in segment()) {
        let full = join_path(&parent, &name);
        let (p, n) = split_full_path(&full);
        prop_assert_eq!(p, parent.as_str());
        prop_assert_eq!(n, name.as_str());
    }

    #[test]
    fn rewrite_moves_only_paths_within_prefix(
        prefix in path(3).prop_filter("non-empty", |p| !p.is_empty()),
        rest in path(3),
        target in path(3),
    ) {
        let inside = join_path(&prefix, &rest);
        let rewritten = rewrite_prefix(&inside, &prefix, &target).unwrap();
        prop_assert!(is_within(&rewritten, &target));
        prop_assert_eq!(rewrite_prefix(&rewritten, &target, &prefix).unwrap(), inside);

        // A sibling sharing the prefix string is never considered inside it
        let sibling = format!("{prefix}x");
        prop_assert!(!is_within(&sibling, &prefix));
        prop_assert!(rewrite_prefix(&sibling, &prefix, &target).is_none());
    }

    #[test]
    fn tree_contains_every_node_once(folders in prop::collection::btree_set(path(3), 1..12)) {
        let team = Uuid::new_v4();
        let author = Uuid::new_v4();

        // Every ancestor of a listed folder is listed too
        let mut all = std::collections::BTreeSet::new();
        for folder in folders.iter().filter(|f| !f.is_empty()) {
            let segments: Vec<&str> = folder.split('/').collect();
            for depth in 1..=segments.len() {
                all.insert(segments[..depth].join("/"));
            }
        }

        let nodes: Vec<WorkspaceNode> = all
            .iter()
            .map(|full| {
                let (parent, name) = split_full_path(full);
                WorkspaceNode::folder(team, author, parent, name)
            })
            .collect();
        let expected = nodes.len();
        let roots = all.iter().filter(|f| !f.contains('/')).count();

        let tree = build_tree(nodes);
        prop_assert_eq!(count(&tree), expected);
        prop_assert_eq!(tree.len(), roots);
    }
}
