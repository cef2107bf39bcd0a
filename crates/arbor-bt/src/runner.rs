//! Lazily instantiated copies of a shared blueprint tree.

use std::cell::RefCell;
use std::rc::Rc;

use arbor_core::{RunContext, Status};
use arbor_tools::tags;
use serde::{Deserialize, Serialize};

use crate::engine::Env;
use crate::property::{PropertyError, PropertyValue};
use crate::tree::Tree;

/// A blueprint shared between the authoring side and every runner using it.
pub type TreeHandle = Rc<RefCell<Tree>>;

pub fn share(tree: Tree) -> TreeHandle {
    Rc::new(RefCell::new(tree))
}

/// Owns a private instance of a blueprint and rebuilds it whenever the
/// blueprint's version moves on.
///
/// Only the blueprint reference is serialized. Cloning keeps the blueprint
/// and drops the instance.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TreeRunner {
    blueprint: Option<TreeHandle>,
    #[serde(skip)]
    instance: Option<Box<Tree>>,
}

impl Clone for TreeRunner {
    fn clone(&self) -> Self {
        Self {
            blueprint: self.blueprint.clone(),
            instance: None,
        }
    }
}

impl TreeRunner {
    pub fn new(blueprint: TreeHandle) -> Self {
        let mut runner = Self::default();
        runner.set_blueprint(Some(blueprint));
        runner
    }

    pub fn blueprint(&self) -> Option<&TreeHandle> {
        self.blueprint.as_ref()
    }

    /// Replaces the blueprint and re-validates the instance against it.
    ///
    /// A running instance keeps running until the next tick stops it.
    pub fn set_blueprint(&mut self, blueprint: Option<TreeHandle>) {
        self.blueprint = blueprint;
        self.validate();
    }

    pub fn instance(&self) -> Option<&Tree> {
        self.instance.as_deref()
    }

    pub fn instance_mut(&mut self) -> Option<&mut Tree> {
        self.instance.as_deref_mut()
    }

    pub(crate) fn discard_instance(&mut self) {
        self.instance = None;
    }

    /// Whether the instance no longer matches the blueprint.
    pub fn is_stale(&self) -> bool {
        match (&self.blueprint, &self.instance) {
            (None, instance) => instance.is_some(),
            (Some(_), None) => true,
            (Some(blueprint), Some(instance)) => match blueprint.try_borrow() {
                Ok(blueprint) => blueprint.version() != instance.version(),
                Err(_) => false,
            },
        }
    }

    fn is_running(&self) -> bool {
        self.instance
            .as_deref()
            .is_some_and(|tree| tree.is_started(tree.root()))
    }

    /// Brings the instance in line with the blueprint.
    ///
    /// Without a blueprint the instance is dropped. An instance still inside
    /// a run is kept until [`TreeRunner::run`] or [`TreeRunner::force_stop`]
    /// has stopped it. Returns `true` when the instance was rebuilt or dropped.
    pub fn validate(&mut self) -> bool {
        if self.is_running() {
            if self.is_stale() {
                tracing::debug!("stale instance is running; rebuild deferred");
            }
            return false;
        }
        let Some(blueprint) = &self.blueprint else {
            return self.instance.take().is_some();
        };
        let Ok(blueprint) = blueprint.try_borrow() else {
            tracing::warn!("blueprint is mutably borrowed; keeping the current instance");
            return false;
        };

        let current = self
            .instance
            .as_ref()
            .is_some_and(|instance| instance.version() == blueprint.version());
        if current {
            return false;
        }

        tracing::debug!(version = %blueprint.version(), "instantiating tree");
        self.instance = Some(Box::new(blueprint.instantiate()));
        true
    }

    /// Runs the instance for one tick, rebuilding it first if stale.
    ///
    /// A stale instance still inside a run is force-stopped before it is
    /// replaced. Without a blueprint the run fails.
    pub fn run<O>(&mut self, env: &mut Env<'_, O>, ctx: &RunContext) -> Status {
        env.tick = ctx.tick;
        if self.is_stale() {
            if let Some(old) = self.instance.as_deref_mut() {
                old.force_stop(env);
            }
            if self.validate() {
                let root = self.instance.as_ref().map(|t| t.root());
                if let Some(root) = root {
                    env.emit(tags::TREE_REINSTANTIATE, root, 0);
                }
            }
        }

        match self.instance.as_deref_mut() {
            Some(tree) => tree.run(env, ctx),
            None => Status::Failure,
        }
    }

    pub fn force_stop<O>(&mut self, env: &mut Env<'_, O>) {
        if let Some(tree) = self.instance.as_deref_mut() {
            tree.force_stop(env);
        }
    }

    pub fn try_get_property<T: PropertyValue>(&mut self, name: &str) -> Result<T, PropertyError> {
        self.validate();
        self.instance
            .as_deref()
            .ok_or(PropertyError::NoInstance)?
            .try_get_property(name)
    }

    pub fn try_set_property<T: PropertyValue>(
        &mut self,
        name: &str,
        value: T,
    ) -> Result<(), PropertyError> {
        self.validate();
        self.instance
            .as_deref_mut()
            .ok_or(PropertyError::NoInstance)?
            .try_set_property(name, value)
    }
}
