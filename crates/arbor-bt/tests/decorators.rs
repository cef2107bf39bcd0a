use arbor_bt::{Env, Node, Tree, UntilCondition};
use arbor_core::{HookRegistry, Outcome, RunContext, Status};

#[derive(Debug, Default)]
struct Owner {
    calls: u32,
    results: Vec<(&'static str, Outcome)>,
}

/// Decorator root over a single action bound to `script`.
fn decorated(decorator: Node, script: &[Status]) -> (Tree, HookRegistry<Owner>) {
    let mut tree = Tree::with_root(decorator);
    let root = tree.root();
    let child = tree.children(root)[0];
    assert!(tree.replace(child, Node::action_fn("child")));

    let script = script.to_vec();
    let mut hooks = HookRegistry::new();
    hooks
        .provider("test")
        .on_evaluate("child", 0, move |owner: &mut Owner, _ctx: &RunContext| {
            let status = script[(owner.calls as usize).min(script.len() - 1)];
            owner.calls += 1;
            status
        });
    (tree, hooks)
}

fn run(tree: &mut Tree, hooks: &mut HookRegistry<Owner>, owner: &mut Owner, ticks: u64) -> Vec<Status> {
    (1..=ticks)
        .map(|n| {
            let mut env = Env::new(&mut *owner, &mut *hooks);
            tree.run(&mut env, &RunContext::new(0.1).with_tick(n))
        })
        .collect()
}

#[test]
fn decorators_get_an_empty_child() {
    let tree = Tree::with_root(Node::inverse());
    let children = tree.children(tree.root());
    assert_eq!(children.len(), 1);
    assert_eq!(tree.node(children[0]).unwrap().name, "Empty");
}

#[test]
fn inverse_swaps_terminal_results() {
    let (mut tree, mut hooks) = decorated(
        Node::inverse(),
        &[Status::Running, Status::Success, Status::Failure],
    );
    let mut owner = Owner::default();
    assert_eq!(
        run(&mut tree, &mut hooks, &mut owner, 3),
        vec![Status::Running, Status::Failure, Status::Success]
    );
}

#[test]
fn always_succeed_and_always_fail_pass_running_through() {
    let script = [Status::Running, Status::Failure];

    let (mut tree, mut hooks) = decorated(Node::always_succeed(), &script);
    let mut owner = Owner::default();
    assert_eq!(
        run(&mut tree, &mut hooks, &mut owner, 2),
        vec![Status::Running, Status::Success]
    );

    let script = [Status::Running, Status::Success];
    let (mut tree, mut hooks) = decorated(Node::always_fail(), &script);
    let mut owner = Owner::default();
    assert_eq!(
        run(&mut tree, &mut hooks, &mut owner, 2),
        vec![Status::Running, Status::Failure]
    );
}

#[test]
fn disabled_condition_fails_without_running_child() {
    let (mut tree, mut hooks) = decorated(Node::condition(false), &[Status::Success]);
    let mut owner = Owner::default();
    assert_eq!(run(&mut tree, &mut hooks, &mut owner, 1), vec![Status::Failure]);
    assert_eq!(owner.calls, 0);

    let root = tree.root();
    tree.set_field(root, "enabled", true).unwrap();
    assert_eq!(run(&mut tree, &mut hooks, &mut owner, 1), vec![Status::Success]);
    assert_eq!(owner.calls, 1);
}

#[test]
fn condition_function_without_predicate_fails() {
    let (mut tree, mut hooks) = decorated(Node::condition_fn("missing"), &[Status::Success]);
    let mut owner = Owner::default();
    assert_eq!(run(&mut tree, &mut hooks, &mut owner, 1), vec![Status::Failure]);
    assert_eq!(owner.calls, 0);
}

#[test]
fn condition_function_uses_highest_priority_active_predicate() {
    let (mut tree, mut hooks) = decorated(Node::condition_fn("gate"), &[Status::Success]);
    hooks.provider("low").condition("gate", 1, |_: &mut Owner| true);
    hooks.provider("high").condition("gate", 5, |_: &mut Owner| false);
    let mut owner = Owner::default();

    assert_eq!(run(&mut tree, &mut hooks, &mut owner, 1), vec![Status::Failure]);

    hooks.set_active("high", false);
    assert_eq!(run(&mut tree, &mut hooks, &mut owner, 1), vec![Status::Success]);
}

#[test]
fn callback_function_reports_terminal_results_only() {
    let (mut tree, mut hooks) = decorated(
        Node::callback_fn("done"),
        &[Status::Running, Status::Failure, Status::Success],
    );
    hooks
        .provider("a")
        .on_result("done", 1, |owner: &mut Owner, outcome| {
            owner.results.push(("a", outcome))
        });
    hooks
        .provider("b")
        .on_result("done", 7, |owner: &mut Owner, outcome| {
            owner.results.push(("b", outcome))
        });
    let mut owner = Owner::default();

    assert_eq!(
        run(&mut tree, &mut hooks, &mut owner, 3),
        vec![Status::Running, Status::Failure, Status::Success]
    );
    assert_eq!(
        owner.results,
        vec![
            ("b", Outcome::Failure),
            ("a", Outcome::Failure),
            ("b", Outcome::Success),
            ("a", Outcome::Success),
        ]
    );
}

#[test]
fn weight_passes_result_through() {
    let (mut tree, mut hooks) = decorated(Node::weight(3.0), &[Status::Running, Status::Failure]);
    let mut owner = Owner::default();
    assert_eq!(
        run(&mut tree, &mut hooks, &mut owner, 2),
        vec![Status::Running, Status::Failure]
    );
    assert_eq!(tree.node(tree.root()).unwrap().weight_value(), Some(3.0));
}

#[test]
fn repeat_infinite_runs_until_failure() {
    let (mut tree, mut hooks) = decorated(
        Node::repeat_infinite(),
        &[Status::Success, Status::Success, Status::Failure],
    );
    let mut owner = Owner::default();
    assert_eq!(
        run(&mut tree, &mut hooks, &mut owner, 3),
        vec![Status::Running, Status::Running, Status::Failure]
    );
}

#[test]
fn repeat_fixed_counts_successful_completions() {
    let (mut tree, mut hooks) = decorated(
        Node::repeat_fixed(2),
        &[Status::Success, Status::Running, Status::Success],
    );
    let mut owner = Owner::default();
    assert_eq!(
        run(&mut tree, &mut hooks, &mut owner, 3),
        vec![Status::Running, Status::Running, Status::Success]
    );

    // A new run starts counting from zero.
    owner.calls = 0;
    assert_eq!(
        run(&mut tree, &mut hooks, &mut owner, 3),
        vec![Status::Running, Status::Running, Status::Success]
    );
}

#[test]
fn repeat_fixed_propagates_failure() {
    let (mut tree, mut hooks) = decorated(Node::repeat_fixed(5), &[Status::Success, Status::Failure]);
    let mut owner = Owner::default();
    assert_eq!(
        run(&mut tree, &mut hooks, &mut owner, 2),
        vec![Status::Running, Status::Failure]
    );
}

#[test]
fn repeat_until_stops_on_matching_result() {
    let script = [Status::Success, Status::Running, Status::Failure];

    let (mut tree, mut hooks) = decorated(Node::repeat_until(UntilCondition::Fail), &script);
    let mut owner = Owner::default();
    assert_eq!(
        run(&mut tree, &mut hooks, &mut owner, 3),
        vec![Status::Running, Status::Running, Status::Success]
    );

    let (mut tree, mut hooks) = decorated(Node::repeat_until(UntilCondition::Succeed), &script);
    let mut owner = Owner::default();
    assert_eq!(run(&mut tree, &mut hooks, &mut owner, 1), vec![Status::Success]);

    let (mut tree, mut hooks) = decorated(Node::repeat_until(UntilCondition::Complete), &script);
    let mut owner = Owner::default();
    assert_eq!(run(&mut tree, &mut hooks, &mut owner, 1), vec![Status::Success]);
}

#[test]
fn wait_accumulates_tick_time() {
    let mut tree = Tree::with_root(Node::wait(0.25));
    let mut hooks: HookRegistry<Owner> = HookRegistry::new();
    let mut owner = Owner::default();
    assert_eq!(
        run(&mut tree, &mut hooks, &mut owner, 4),
        vec![Status::Running, Status::Running, Status::Success, Status::Running]
    );
}

#[test]
fn empty_action_succeeds() {
    let mut tree = Tree::with_root(Node::empty());
    let mut hooks: HookRegistry<Owner> = HookRegistry::new();
    let mut owner = Owner::default();
    assert_eq!(run(&mut tree, &mut hooks, &mut owner, 1), vec![Status::Success]);
}

#[test]
fn action_function_without_handlers_succeeds() {
    let mut tree = Tree::with_root(Node::action_fn("unbound"));
    let mut hooks: HookRegistry<Owner> = HookRegistry::new();
    let mut owner = Owner::default();
    assert_eq!(run(&mut tree, &mut hooks, &mut owner, 1), vec![Status::Success]);
}
