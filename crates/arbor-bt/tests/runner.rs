use arbor_bt::{share, EngineConfig, Env, Evaluator, Node, PropertyError, Tree, TreeRunner};
use arbor_core::{HookRegistry, NodeState, RunContext, Status};
use arbor_tools::{tags, SharedTraceLog};

#[derive(Debug, Default)]
struct Owner {
    log: Vec<String>,
}

fn ctx(tick: u64) -> RunContext {
    RunContext::new(0.1).with_tick(tick)
}

/// Sequence over one long-running action `a`.
fn running_blueprint() -> Tree {
    let mut tree = Tree::with_root(Node::sequence());
    let root = tree.root();
    tree.add(Node::action_fn("a"), root).unwrap();
    tree
}

fn bind_running(evaluator: &mut Evaluator<Owner>) {
    evaluator
        .hooks
        .provider("test")
        .on_evaluate("a", 0, |owner: &mut Owner, _ctx: &RunContext| {
            owner.log.push("eval:a".to_string());
            Status::Running
        })
        .on_force_stop("a", 0, |owner: &mut Owner| owner.log.push("stop:a".to_string()));
}

#[test]
fn runner_without_blueprint_fails() {
    let mut evaluator: Evaluator<Owner> = Evaluator::new(1u64);
    let mut owner = Owner::default();
    assert_eq!(evaluator.tick(&mut owner, &ctx(1)), Status::Failure);
    assert!(evaluator.runner().instance().is_none());
    assert_eq!(evaluator.last_status(), Some(Status::Failure));
    assert_eq!(
        evaluator.try_get_property::<f32>("Delay"),
        Err(PropertyError::NoInstance)
    );
}

#[test]
fn instance_tracks_blueprint_version() {
    let blueprint = share(Tree::new());
    let mut runner = TreeRunner::new(blueprint.clone());
    let first = runner.instance().unwrap().version();
    assert_eq!(first, blueprint.borrow().version());
    assert!(!runner.validate(), "an up-to-date instance is kept");

    {
        let mut tree = blueprint.borrow_mut();
        let root = tree.root();
        let child = tree.children(root)[0];
        tree.replace(child, Node::wait(2.0));
    }
    assert!(runner.is_stale());
    assert!(runner.validate());
    assert_eq!(
        runner.instance().unwrap().version(),
        blueprint.borrow().version()
    );

    runner.set_blueprint(None);
    assert!(runner.instance().is_none());
    assert!(!runner.is_stale());
}

#[test]
fn instances_are_independent_of_the_blueprint() {
    let mut tree = Tree::new();
    let root = tree.root();
    let wait = tree.children(root)[0];
    tree.replace(wait, Node::wait(1.0));
    tree.add_property("Delay", wait, "duration").unwrap();
    let blueprint = share(tree);

    let mut evaluator: Evaluator<Owner> = Evaluator::new(7u64).with_blueprint(blueprint.clone());
    let version = blueprint.borrow().version();

    assert!(evaluator.set_property("Delay", 5.0f32));
    assert_eq!(evaluator.get_property::<f32>("Delay"), 5.0);
    assert_eq!(blueprint.borrow().get_property::<f32>("Delay"), 1.0);
    assert_eq!(blueprint.borrow().version(), version);
    assert!(!evaluator.runner().is_stale());
}

#[test]
fn blueprint_edit_rebuilds_instance_and_stops_old_run() {
    let blueprint = share(running_blueprint());
    let mut evaluator = Evaluator::new(1u64).with_blueprint(blueprint.clone());
    bind_running(&mut evaluator);
    let mut owner = Owner::default();

    assert_eq!(evaluator.tick(&mut owner, &ctx(1)), Status::Running);
    let before = evaluator.runner().instance().unwrap().version();

    {
        let mut tree = blueprint.borrow_mut();
        let root = tree.root();
        tree.add(Node::empty(), root);
    }
    assert_eq!(evaluator.tick(&mut owner, &ctx(2)), Status::Running);

    let after = evaluator.runner().instance().unwrap().version();
    assert_ne!(before, after);
    assert_eq!(after, blueprint.borrow().version());
    assert_eq!(owner.log, vec!["eval:a", "stop:a", "eval:a"]);
}

#[test]
fn property_access_leaves_a_running_instance_for_the_next_tick() {
    let blueprint = share(running_blueprint());
    let mut evaluator = Evaluator::new(1u64).with_blueprint(blueprint.clone());
    bind_running(&mut evaluator);
    let mut owner = Owner::default();
    assert_eq!(evaluator.tick(&mut owner, &ctx(1)), Status::Running);

    {
        let mut tree = blueprint.borrow_mut();
        let root = tree.root();
        tree.add(Node::empty(), root);
    }
    assert_eq!(evaluator.get_property::<f32>("Delay"), 0.0);
    assert!(!evaluator.set_property("Delay", 1.0f32));
    assert!(evaluator.runner().is_stale());

    assert_eq!(evaluator.tick(&mut owner, &ctx(2)), Status::Running);
    assert_eq!(owner.log, vec!["eval:a", "stop:a", "eval:a"]);
    assert!(!evaluator.runner().is_stale());
}

#[test]
fn swapping_blueprints_stops_the_running_instance() {
    let mut evaluator = Evaluator::new(1u64).with_blueprint(share(running_blueprint()));
    bind_running(&mut evaluator);
    let mut owner = Owner::default();
    evaluator.tick(&mut owner, &ctx(1));

    let other = share(running_blueprint());
    evaluator.set_blueprint(Some(other.clone()));
    let instance = evaluator.runner().instance().unwrap();
    assert!(instance.node(instance.root()).unwrap().is_started());

    assert_eq!(evaluator.tick(&mut owner, &ctx(2)), Status::Running);
    assert_eq!(owner.log, vec!["eval:a", "stop:a", "eval:a"]);
    assert_eq!(
        evaluator.runner().instance().unwrap().version(),
        other.borrow().version()
    );

    evaluator.set_blueprint(None);
    assert!(evaluator.runner().instance().is_some());
    assert_eq!(evaluator.tick(&mut owner, &ctx(3)), Status::Failure);
    assert!(evaluator.runner().instance().is_none());
    assert_eq!(owner.log.last().map(String::as_str), Some("stop:a"));
}

#[test]
fn sibling_instances_keep_separate_run_state() {
    let mut blueprint = Tree::with_root(Node::sequence());
    let root = blueprint.root();
    let wait = blueprint.add(Node::wait(1.0), root).unwrap();
    let mut first = blueprint.instantiate();
    let second = blueprint.instantiate();

    let mut hooks: HookRegistry<Owner> = HookRegistry::new();
    let mut owner = Owner::default();
    let mut env = Env::new(&mut owner, &mut hooks);
    assert_eq!(first.run(&mut env, &ctx(1)), Status::Running);
    assert!(first.node(wait).unwrap().is_started());
    assert_eq!(first.node(wait).unwrap().state(), NodeState::Running);

    for idle in [&second, &blueprint] {
        assert!(idle
            .nodes()
            .all(|(_, node)| !node.is_started() && node.state() == NodeState::Idle));
    }
}

#[test]
fn evaluator_force_stop_aborts_the_instance() {
    let mut evaluator = Evaluator::new(1u64).with_blueprint(share(running_blueprint()));
    bind_running(&mut evaluator);
    let mut owner = Owner::default();

    evaluator.tick(&mut owner, &ctx(1));
    evaluator.force_stop(&mut owner);
    assert_eq!(owner.log, vec!["eval:a", "stop:a"]);

    let instance = evaluator.runner().instance().unwrap();
    assert!(instance.nodes().all(|(_, node)| !node.is_started()));
}

#[test]
fn subtree_runs_its_own_instance() {
    let inner = share(Tree::with_root(Node::action_fn("inner")));
    let mut outer = Tree::with_root(Node::sequence());
    let root = outer.root();
    outer.add(Node::subtree(Some(inner.clone())), root).unwrap();
    outer.add(Node::action_fn("after"), root).unwrap();

    let mut evaluator = Evaluator::new(3u64).with_blueprint(share(outer));
    evaluator
        .hooks
        .provider("test")
        .on_evaluate("inner", 0, |owner: &mut Owner, _ctx: &RunContext| {
            owner.log.push("inner".to_string());
            Status::Success
        })
        .on_evaluate("after", 0, |owner: &mut Owner, _ctx: &RunContext| {
            owner.log.push("after".to_string());
            Status::Success
        });
    let mut owner = Owner::default();

    assert_eq!(evaluator.tick(&mut owner, &ctx(1)), Status::Running);
    assert_eq!(evaluator.tick(&mut owner, &ctx(2)), Status::Success);
    assert_eq!(owner.log, vec!["inner", "after"]);
}

#[test]
fn subtree_without_blueprint_fails() {
    let mut evaluator: Evaluator<Owner> =
        Evaluator::new(3u64).with_blueprint(share(Tree::with_root(Node::subtree(None))));
    let mut owner = Owner::default();
    assert_eq!(evaluator.tick(&mut owner, &ctx(1)), Status::Failure);
}

#[test]
fn self_referencing_subtree_stops_at_depth_limit() {
    let blueprint = share(Tree::with_root(Node::sequence()));
    let handle = blueprint.clone();
    {
        let mut tree = blueprint.borrow_mut();
        let root = tree.root();
        // The blueprint is borrowed here, so only the handle is stored.
        tree.add(Node::subtree(Some(handle)), root).unwrap();
    }

    let config = EngineConfig {
        max_subtree_depth: 4,
        ..EngineConfig::default()
    };
    let mut evaluator: Evaluator<Owner> = Evaluator::new(1u64)
        .with_config(config)
        .with_blueprint(blueprint);
    let mut owner = Owner::default();
    assert_eq!(evaluator.tick(&mut owner, &ctx(1)), Status::Failure);
}

#[test]
fn rebuilds_are_traced_when_enabled() {
    let blueprint = share(running_blueprint());
    let trace = SharedTraceLog::default();
    let config = EngineConfig {
        trace_nodes: true,
        ..EngineConfig::default()
    };
    let mut evaluator = Evaluator::new(1u64)
        .with_config(config)
        .with_blueprint(blueprint.clone())
        .with_trace_sink(Box::new(trace.clone()));
    bind_running(&mut evaluator);
    let mut owner = Owner::default();

    evaluator.tick(&mut owner, &ctx(1));
    assert!(trace.snapshot().nodes_tagged(tags::TREE_REINSTANTIATE).is_empty());

    {
        let mut tree = blueprint.borrow_mut();
        let root = tree.root();
        tree.add(Node::empty(), root);
    }
    evaluator.tick(&mut owner, &ctx(2));

    let log = trace.take();
    let rebuilt: Vec<u64> = log
        .events
        .iter()
        .filter(|e| e.is(tags::TREE_REINSTANTIATE))
        .map(|e| e.tick)
        .collect();
    assert_eq!(rebuilt, vec![2]);
    assert_eq!(log.nodes_tagged(tags::NODE_FORCE_STOP).len(), 2);
}
