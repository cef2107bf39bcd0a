use arbor_bt::{Clipboard, FieldValue, Node, NodeId, Tree};

/// Sequence root holding an `Inverse` over a 2s wait, then an empty action.
fn authored() -> (Tree, NodeId, NodeId) {
    let mut tree = Tree::with_root(Node::sequence());
    let root = tree.root();
    let inverse = tree.add(Node::inverse(), root).unwrap();
    let child = tree.children(inverse)[0];
    assert!(tree.replace(child, Node::wait(2.0)));
    let empty = tree.add(Node::empty(), root).unwrap();
    (tree, inverse, empty)
}

#[test]
fn copy_captures_the_whole_subtree() {
    let (tree, inverse, _) = authored();
    let clip = tree.copy_subtree(inverse).unwrap();
    assert_eq!(clip.len(), 2);
    assert_eq!(clip.root().unwrap().name, "Inverse");

    assert!(tree.copy_subtree(NodeId(40)).is_none());
}

#[test]
fn paste_replaces_target_and_renames_clashes() {
    let (mut tree, inverse, empty) = authored();
    let clip = tree.copy_subtree(inverse).unwrap();
    let version = tree.version();

    assert_eq!(tree.paste_replace(empty, &clip), Some(empty));
    assert_ne!(tree.version(), version);

    let pasted = tree.node(empty).unwrap();
    assert_eq!(pasted.name, "Inverse (1)");
    assert!(pasted.is_decorator());

    let children = tree.children(empty);
    assert_eq!(children.len(), 1);
    let wait = tree.node(children[0]).unwrap();
    assert_eq!(wait.name, "Wait (1)");
    assert_eq!(wait.field("duration"), Some(FieldValue::Float(2.0)));

    // The source subtree is untouched.
    assert_eq!(tree.node(inverse).unwrap().name, "Inverse");
    assert_eq!(tree.node_count(), 5);
}

#[test]
fn paste_drops_the_replaced_children() {
    let (mut tree, inverse, _) = authored();
    let clip = Tree::with_root(Node::wait(0.5)).copy_subtree(NodeId(0)).unwrap();
    let root = tree.root();

    assert_eq!(tree.paste_replace(root, &clip), Some(root));
    assert!(!tree.contains(inverse));
    assert!(tree.children(root).is_empty());
    assert_eq!(tree.node_count(), 1);
    assert_eq!(tree.node(root).unwrap().name, "Wait");
}

#[test]
fn clipboards_travel_between_trees() {
    let (source, inverse, _) = authored();
    let json = serde_json::to_string(&source.copy_subtree(inverse).unwrap()).unwrap();
    let clip: Clipboard = serde_json::from_str(&json).unwrap();

    let mut target = Tree::new();
    let root = target.root();
    let slot = target.children(root)[0];
    assert_eq!(target.paste_replace(slot, &clip), Some(slot));
    assert_eq!(target.node(slot).unwrap().name, "Inverse");
    assert_eq!(target.parent(slot), Some(root));
    assert!(target.is_descendant_of(target.children(slot)[0], root));
}

#[test]
fn paste_refuses_missing_targets_and_empty_clipboards() {
    let (mut tree, inverse, empty) = authored();
    let clip = tree.copy_subtree(inverse).unwrap();
    let version = tree.version();

    assert_eq!(tree.paste_replace(NodeId(99), &clip), None);
    assert_eq!(tree.paste_replace(empty, &Clipboard::default()), None);
    assert_eq!(tree.version(), version);
}
