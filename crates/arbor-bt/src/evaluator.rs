use arbor_core::{HookRegistry, OwnerId, RunContext, Status};
use arbor_tools::{NullTraceSink, TraceSink};

use crate::config::EngineConfig;
use crate::engine::Env;
use crate::property::{PropertyError, PropertyValue};
use crate::runner::{TreeHandle, TreeRunner};

/// Runs one tree instance on behalf of one owner.
///
/// The evaluator keeps the hook registry, the runner holding the instance and
/// the trace sink; the owner value is passed in on every call.
pub struct Evaluator<O> {
    id: u64,
    pub config: EngineConfig,
    pub hooks: HookRegistry<O>,
    runner: TreeRunner,
    trace: Box<dyn TraceSink>,
    last: Option<Status>,
}

impl<O> Evaluator<O> {
    pub fn new(id: impl OwnerId) -> Self {
        Self {
            id: id.stable_id(),
            config: EngineConfig::default(),
            hooks: HookRegistry::new(),
            runner: TreeRunner::default(),
            trace: Box::new(NullTraceSink),
            last: None,
        }
    }

    pub fn with_blueprint(mut self, blueprint: TreeHandle) -> Self {
        self.runner.set_blueprint(Some(blueprint));
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_trace_sink(mut self, sink: Box<dyn TraceSink>) -> Self {
        self.trace = sink;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn blueprint(&self) -> Option<&TreeHandle> {
        self.runner.blueprint()
    }

    pub fn set_blueprint(&mut self, blueprint: Option<TreeHandle>) {
        self.runner.set_blueprint(blueprint);
    }

    pub fn runner(&self) -> &TreeRunner {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut TreeRunner {
        &mut self.runner
    }

    /// Result of the most recent tick.
    pub fn last_status(&self) -> Option<Status> {
        self.last
    }

    pub fn tick(&mut self, owner: &mut O, ctx: &RunContext) -> Status {
        let mut env = Env::new(owner, &mut self.hooks)
            .with_evaluator_id(self.id)
            .with_config(self.config)
            .with_trace(&mut *self.trace);
        let status = self.runner.run(&mut env, ctx);
        self.last = Some(status);
        status
    }

    /// Aborts the current run, if any.
    pub fn force_stop(&mut self, owner: &mut O) {
        let mut env = Env::new(owner, &mut self.hooks)
            .with_evaluator_id(self.id)
            .with_config(self.config)
            .with_trace(&mut *self.trace);
        self.runner.force_stop(&mut env);
    }

    pub fn try_get_property<T: PropertyValue>(&mut self, name: &str) -> Result<T, PropertyError> {
        self.runner.try_get_property(name)
    }

    pub fn try_set_property<T: PropertyValue>(
        &mut self,
        name: &str,
        value: T,
    ) -> Result<(), PropertyError> {
        self.runner.try_set_property(name, value)
    }

    /// Reads property `name` from the instance, or `T::default()`.
    pub fn get_property<T: PropertyValue + Default>(&mut self, name: &str) -> T {
        match self.try_get_property(name) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(evaluator = self.id, property = %name, error = %err, "property read failed");
                T::default()
            }
        }
    }

    pub fn set_property<T: PropertyValue>(&mut self, name: &str, value: T) -> bool {
        match self.try_set_property(name, value) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(evaluator = self.id, property = %name, error = %err, "property write failed");
                false
            }
        }
    }
}
