use arbor_bt::{Category, Env, FieldValue, LayoutError, Node, NodeId, Tree, TreeLayout};
use arbor_core::{HookRegistry, RunContext, Status};
use serde_json::{json, Value};

struct Owner;

/// Sequence root with a wait (#1) and an empty action (#2).
fn sample() -> Tree {
    let mut tree = Tree::with_root(Node::sequence());
    let root = tree.root();
    tree.add(Node::wait(2.0), root).unwrap();
    tree.add(Node::empty(), root).unwrap();
    tree
}

fn validate(value: Value) -> Result<Tree, LayoutError> {
    let layout: TreeLayout = serde_json::from_value(value).unwrap();
    Tree::try_from(layout)
}

#[test]
fn json_round_trip_keeps_structure_properties_and_version() {
    let mut tree = sample();
    let root = tree.root();
    let extra = tree.add(Node::inverse(), root).unwrap();
    tree.remove(extra);
    tree.add_property("Delay", NodeId(1), "duration").unwrap();

    let json = serde_json::to_string(&tree).unwrap();
    let back: Tree = serde_json::from_str(&json).unwrap();

    assert_eq!(back.version(), tree.version());
    assert_eq!(back.slot_count(), tree.slot_count());
    assert_eq!(back.node_count(), 3);
    assert_eq!(back.children(back.root()), vec![NodeId(1), NodeId(2)]);
    assert_eq!(back.get_field(NodeId(1), "duration"), Ok(FieldValue::Float(2.0)));
    assert_eq!(back.get_property::<f32>("Delay"), 2.0);
}

#[test]
fn run_state_is_not_serialized() {
    let mut tree = sample();
    let mut hooks: HookRegistry<Owner> = HookRegistry::new();
    let mut owner = Owner;
    let mut env = Env::new(&mut owner, &mut hooks);
    assert_eq!(tree.run(&mut env, &RunContext::new(0.5)), Status::Running);
    assert!(tree.node(NodeId(1)).unwrap().is_started());

    let back: Tree = serde_json::from_value(serde_json::to_value(&tree).unwrap()).unwrap();
    assert!(back.nodes().all(|(_, node)| !node.is_started()));
}

#[test]
fn missing_properties_and_version_take_defaults() {
    let mut value = serde_json::to_value(sample()).unwrap();
    let object = value.as_object_mut().unwrap();
    object.remove("properties");
    object.remove("version");

    let tree = validate(value).unwrap();
    assert!(tree.properties().is_empty());
    assert_eq!(tree.node_count(), 3);
}

#[test]
fn mismatched_lengths_are_rejected() {
    let mut value = serde_json::to_value(sample()).unwrap();
    value["parents"].as_array_mut().unwrap().pop();
    assert_eq!(
        validate(value).unwrap_err(),
        LayoutError::LengthMismatch {
            nodes: 3,
            parents: 2
        }
    );
}

#[test]
fn root_must_exist_and_be_parentless() {
    let mut value = serde_json::to_value(sample()).unwrap();
    value["root"] = json!(9);
    assert_eq!(validate(value).unwrap_err(), LayoutError::RootMissing(NodeId(9)));

    let mut value = serde_json::to_value(sample()).unwrap();
    value["parents"][0] = json!(1);
    assert_eq!(validate(value).unwrap_err(), LayoutError::RootMissing(NodeId(0)));
}

#[test]
fn orphans_and_cycles_are_rejected() {
    let mut value = serde_json::to_value(sample()).unwrap();
    value["parents"][2] = Value::Null;
    assert_eq!(
        validate(value).unwrap_err(),
        LayoutError::DanglingParent { node: NodeId(2) }
    );

    let mut value = serde_json::to_value(sample()).unwrap();
    value["parents"][1] = json!(2);
    value["parents"][2] = json!(1);
    assert_eq!(
        validate(value).unwrap_err(),
        LayoutError::ParentCycle { node: NodeId(1) }
    );
}

#[test]
fn child_counts_follow_categories() {
    let mut value = serde_json::to_value(sample()).unwrap();
    value["parents"][2] = json!(1);
    assert_eq!(
        validate(value).unwrap_err(),
        LayoutError::ChildCount {
            node: NodeId(1),
            category: Category::Action,
            count: 1,
        }
    );

    let mut tree = Tree::with_root(Node::sequence());
    let root = tree.root();
    let inverse = tree.add(Node::inverse(), root).unwrap();
    let mut value = serde_json::to_value(&tree).unwrap();
    let child = tree.children(inverse)[0];
    value["parents"][child.index()] = json!(root);
    assert_eq!(
        validate(value).unwrap_err(),
        LayoutError::ChildCount {
            node: inverse,
            category: Category::Decorator,
            count: 0,
        }
    );
}

#[test]
fn invalid_layout_fails_deserialization() {
    let mut value = serde_json::to_value(sample()).unwrap();
    value["root"] = json!(5);
    let err = serde_json::from_value::<Tree>(value).unwrap_err();
    assert!(err.to_string().contains("root #5"), "{err}");
}
