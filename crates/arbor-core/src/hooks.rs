//! Registry of externally supplied behaviour, keyed by string id.
//!
//! Host code registers handlers on named providers. Nodes look handlers up by
//! `(HookKind, id)` at call time:
//! - the highest-priority binding among active providers wins (ties go to the
//!   first registered);
//! - result callbacks invoke *every* matching binding in descending priority;
//! - a binding whose handler does not match its declared kind is skipped with a
//!   warning;
//! - a lookup with no match falls back to the kind's neutral default.

use std::fmt;

use crate::{Outcome, RunContext, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Start,
    Evaluate,
    End,
    ForceStop,
    Predicate,
    ResultCallback,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookKind::Start => "start",
            HookKind::Evaluate => "evaluate",
            HookKind::End => "end",
            HookKind::ForceStop => "force_stop",
            HookKind::Predicate => "predicate",
            HookKind::ResultCallback => "result_callback",
        };
        f.write_str(name)
    }
}

pub type StartFn<O> = Box<dyn FnMut(&mut O) -> bool>;
pub type EvaluateFn<O> = Box<dyn FnMut(&mut O, &RunContext) -> Status>;
pub type NotifyFn<O> = Box<dyn FnMut(&mut O)>;
pub type PredicateFn<O> = Box<dyn FnMut(&mut O) -> bool>;
pub type ResultFn<O> = Box<dyn FnMut(&mut O, Outcome)>;

/// A handler with one of the supported signatures.
pub enum Handler<O> {
    Start(StartFn<O>),
    Evaluate(EvaluateFn<O>),
    End(NotifyFn<O>),
    ForceStop(NotifyFn<O>),
    Predicate(PredicateFn<O>),
    ResultCallback(ResultFn<O>),
}

impl<O> Handler<O> {
    /// The kind this handler's signature can serve.
    pub fn kind(&self) -> HookKind {
        match self {
            Handler::Start(_) => HookKind::Start,
            Handler::Evaluate(_) => HookKind::Evaluate,
            Handler::End(_) => HookKind::End,
            Handler::ForceStop(_) => HookKind::ForceStop,
            Handler::Predicate(_) => HookKind::Predicate,
            Handler::ResultCallback(_) => HookKind::ResultCallback,
        }
    }
}

struct Binding<O> {
    kind: HookKind,
    id: String,
    priority: i32,
    handler: Handler<O>,
}

/// A named group of bindings that can be switched on and off as a unit.
pub struct HookProvider<O> {
    name: String,
    active: bool,
    bindings: Vec<Binding<O>>,
}

impl<O> HookProvider<O> {
    fn new(name: String) -> Self {
        Self {
            name,
            active: true,
            bindings: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) -> &mut Self {
        self.active = active;
        self
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Declares `handler` under `kind` and `id`.
    ///
    /// The declaration is not checked here: a handler whose signature does not
    /// match `kind` is reported and skipped when it is looked up.
    pub fn bind(
        &mut self,
        kind: HookKind,
        id: impl Into<String>,
        priority: i32,
        handler: Handler<O>,
    ) -> &mut Self {
        self.bindings.push(Binding {
            kind,
            id: id.into(),
            priority,
            handler,
        });
        self
    }

    pub fn on_start(
        &mut self,
        id: impl Into<String>,
        priority: i32,
        f: impl FnMut(&mut O) -> bool + 'static,
    ) -> &mut Self {
        self.bind(HookKind::Start, id, priority, Handler::Start(Box::new(f)))
    }

    pub fn on_evaluate(
        &mut self,
        id: impl Into<String>,
        priority: i32,
        f: impl FnMut(&mut O, &RunContext) -> Status + 'static,
    ) -> &mut Self {
        self.bind(
            HookKind::Evaluate,
            id,
            priority,
            Handler::Evaluate(Box::new(f)),
        )
    }

    pub fn on_end(
        &mut self,
        id: impl Into<String>,
        priority: i32,
        f: impl FnMut(&mut O) + 'static,
    ) -> &mut Self {
        self.bind(HookKind::End, id, priority, Handler::End(Box::new(f)))
    }

    pub fn on_force_stop(
        &mut self,
        id: impl Into<String>,
        priority: i32,
        f: impl FnMut(&mut O) + 'static,
    ) -> &mut Self {
        self.bind(
            HookKind::ForceStop,
            id,
            priority,
            Handler::ForceStop(Box::new(f)),
        )
    }

    pub fn condition(
        &mut self,
        id: impl Into<String>,
        priority: i32,
        f: impl FnMut(&mut O) -> bool + 'static,
    ) -> &mut Self {
        self.bind(
            HookKind::Predicate,
            id,
            priority,
            Handler::Predicate(Box::new(f)),
        )
    }

    pub fn on_result(
        &mut self,
        id: impl Into<String>,
        priority: i32,
        f: impl FnMut(&mut O, Outcome) + 'static,
    ) -> &mut Self {
        self.bind(
            HookKind::ResultCallback,
            id,
            priority,
            Handler::ResultCallback(Box::new(f)),
        )
    }
}

impl<O> fmt::Debug for HookProvider<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookProvider")
            .field("name", &self.name)
            .field("active", &self.active)
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

/// Ordered collection of hook providers.
pub struct HookRegistry<O> {
    providers: Vec<HookProvider<O>>,
}

impl<O> Default for HookRegistry<O> {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
        }
    }
}

impl<O> fmt::Debug for HookRegistry<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("providers", &self.providers)
            .finish()
    }
}

impl<O> HookRegistry<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the provider called `name`, creating it (active) on first use.
    pub fn provider(&mut self, name: &str) -> &mut HookProvider<O> {
        let index = match self.providers.iter().position(|p| p.name == name) {
            Some(index) => index,
            None => {
                self.providers.push(HookProvider::new(name.to_string()));
                self.providers.len() - 1
            }
        };
        &mut self.providers[index]
    }

    pub fn provider_mut(&mut self, name: &str) -> Option<&mut HookProvider<O>> {
        self.providers.iter_mut().find(|p| p.name == name)
    }

    pub fn providers(&self) -> impl Iterator<Item = &HookProvider<O>> {
        self.providers.iter()
    }

    pub fn remove_provider(&mut self, name: &str) -> bool {
        let before = self.providers.len();
        self.providers.retain(|p| p.name != name);
        self.providers.len() != before
    }

    pub fn set_active(&mut self, name: &str, active: bool) -> bool {
        match self.provider_mut(name) {
            Some(provider) => {
                provider.active = active;
                true
            }
            None => false,
        }
    }

    /// Whether a usable handler exists for `(kind, id)`.
    pub fn has(&self, kind: HookKind, id: &str) -> bool {
        self.candidates(kind, id).next().is_some()
    }

    /// Active, well-formed bindings for `(kind, id)` in registration order, as
    /// `(provider index, binding index, priority)`.
    fn candidates<'a>(
        &'a self,
        kind: HookKind,
        id: &'a str,
    ) -> impl Iterator<Item = (usize, usize, i32)> + 'a {
        self.providers
            .iter()
            .enumerate()
            .filter(|(_, p)| p.active)
            .flat_map(move |(pi, p)| {
                p.bindings
                    .iter()
                    .enumerate()
                    .filter(move |(_, b)| b.kind == kind && b.id == id)
                    .filter_map(move |(bi, b)| {
                        if b.handler.kind() != kind {
                            tracing::warn!(
                                provider = %p.name,
                                hook = %id,
                                declared = %kind,
                                actual = %b.handler.kind(),
                                "hook handler signature does not match its declaration; skipping"
                            );
                            return None;
                        }
                        Some((pi, bi, b.priority))
                    })
            })
    }

    fn resolve(&mut self, kind: HookKind, id: &str) -> Option<&mut Handler<O>> {
        let mut best: Option<(usize, usize, i32)> = None;
        for candidate in self.candidates(kind, id) {
            match best {
                Some((_, _, priority)) if candidate.2 <= priority => {}
                _ => best = Some(candidate),
            }
        }

        match best {
            Some((pi, bi, _)) => Some(&mut self.providers[pi].bindings[bi].handler),
            None => {
                tracing::debug!(hook = %id, kind = %kind, "no handler registered; using default");
                None
            }
        }
    }

    /// Start hook; defaults to `true`.
    pub fn start(&mut self, id: &str, owner: &mut O) -> bool {
        match self.resolve(HookKind::Start, id) {
            Some(Handler::Start(f)) => f(owner),
            _ => true,
        }
    }

    /// Evaluate hook; defaults to `Success`.
    pub fn evaluate(&mut self, id: &str, owner: &mut O, ctx: &RunContext) -> Status {
        match self.resolve(HookKind::Evaluate, id) {
            Some(Handler::Evaluate(f)) => f(owner, ctx),
            _ => Status::Success,
        }
    }

    /// End hook; no-op by default.
    pub fn end(&mut self, id: &str, owner: &mut O) {
        if let Some(Handler::End(f)) = self.resolve(HookKind::End, id) {
            f(owner);
        }
    }

    /// Force-stop hook; no-op by default.
    pub fn force_stop(&mut self, id: &str, owner: &mut O) {
        if let Some(Handler::ForceStop(f)) = self.resolve(HookKind::ForceStop, id) {
            f(owner);
        }
    }

    /// Predicate hook; defaults to `false`.
    pub fn check(&mut self, id: &str, owner: &mut O) -> bool {
        match self.resolve(HookKind::Predicate, id) {
            Some(Handler::Predicate(f)) => f(owner),
            _ => false,
        }
    }

    /// Invokes every result callback bound to `id`, highest priority first.
    ///
    /// Returns the number of callbacks invoked.
    pub fn notify_result(&mut self, id: &str, owner: &mut O, outcome: Outcome) -> usize {
        let mut matches: Vec<(usize, usize, i32)> =
            self.candidates(HookKind::ResultCallback, id).collect();
        // Stable: equal priorities keep registration order.
        matches.sort_by(|a, b| b.2.cmp(&a.2));

        let mut invoked = 0;
        for (pi, bi, _) in matches {
            if let Handler::ResultCallback(f) = &mut self.providers[pi].bindings[bi].handler {
                f(owner, outcome);
                invoked += 1;
            }
        }
        invoked
    }
}
