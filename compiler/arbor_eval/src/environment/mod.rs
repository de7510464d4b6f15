//! Environment frames for the interpreter.
//!
//! Lambda parameters, block variables and catch variables all live in
//! frames keyed by `ParameterId`, so two parameters that share a name never
//! share a slot. Frames form a parent chain; a handler's frame is distinct
//! from the frame of the block that encloses the `Try`.

#![expect(
    clippy::disallowed_types,
    reason = "Rc is the implementation of LocalScope<T>"
)]

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use arbor_ir::{ParameterId, Value};

/// A single-threaded, shared, mutable frame.
///
/// Wraps `Rc<RefCell<T>>` so every frame allocation goes through
/// [`LocalScope::new`]. Not `Send`: one interpreter owns its frames for
/// the duration of one call.
#[repr(transparent)]
pub struct LocalScope<T>(Rc<RefCell<T>>);

impl<T> LocalScope<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        LocalScope(Rc::new(RefCell::new(value)))
    }

    #[inline]
    pub fn borrow(&self) -> std::cell::Ref<'_, T> {
        self.0.borrow()
    }

    #[inline]
    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, T> {
        self.0.borrow_mut()
    }
}

impl<T> Clone for LocalScope<T> {
    #[inline]
    fn clone(&self) -> Self {
        LocalScope(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for LocalScope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalScope").field(&self.0).finish()
    }
}

impl<T: Default> Default for LocalScope<T> {
    fn default() -> Self {
        LocalScope::new(T::default())
    }
}

impl<T> Deref for LocalScope<T> {
    type Target = RefCell<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// One frame of slots.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    slots: FxHashMap<ParameterId, Value>,
    parent: Option<LocalScope<Scope>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: LocalScope<Scope>) -> Self {
        Scope {
            slots: FxHashMap::default(),
            parent: Some(parent),
        }
    }

    /// Bind `id` in this frame, shadowing any outer slot.
    #[inline]
    pub fn define(&mut self, id: ParameterId, value: Value) {
        self.slots.insert(id, value);
    }

    #[inline]
    pub fn lookup(&self, id: ParameterId) -> Option<Value> {
        if let Some(value) = self.slots.get(&id) {
            return Some(value.clone());
        }
        self.parent.as_ref()?.borrow().lookup(id)
    }

    /// Overwrite the innermost slot for `id`. Returns `false` when no frame
    /// in the chain binds it.
    #[inline]
    pub fn assign(&mut self, id: ParameterId, value: Value) -> bool {
        if let Some(slot) = self.slots.get_mut(&id) {
            *slot = value;
            return true;
        }
        match &self.parent {
            Some(parent) => parent.borrow_mut().assign(id, value),
            None => false,
        }
    }
}

/// The interpreter's frame stack.
///
/// The bottom frame holds captured values (for nested lambdas); each
/// lambda call, block and catch handler pushes one frame on top.
pub struct Environment {
    scopes: Vec<LocalScope<Scope>>,
    global: LocalScope<Scope>,
}

impl Environment {
    pub fn new() -> Self {
        let global = LocalScope::new(Scope::new());
        Environment {
            scopes: vec![global.clone()],
            global,
        }
    }

    /// An environment whose bottom frame holds `captures`.
    pub fn from_captures<'a>(captures: impl IntoIterator<Item = (&'a ParameterId, &'a Value)>) -> Self {
        let env = Self::new();
        {
            let mut global = env.global.borrow_mut();
            for (id, value) in captures {
                global.define(*id, value.clone());
            }
        }
        env
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    #[inline]
    pub fn push_scope(&mut self) {
        let parent = self.current_scope();
        self.scopes.push(LocalScope::new(Scope::with_parent(parent)));
    }

    /// Pop the innermost frame. The bottom frame is never popped.
    #[inline]
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    #[inline]
    fn current_scope(&self) -> LocalScope<Scope> {
        self.scopes.last().unwrap_or(&self.global).clone()
    }

    #[inline]
    pub fn define(&mut self, id: ParameterId, value: Value) {
        self.scopes
            .last()
            .unwrap_or(&self.global)
            .borrow_mut()
            .define(id, value);
    }

    #[inline]
    pub fn lookup(&self, id: ParameterId) -> Option<Value> {
        self.scopes.last().unwrap_or(&self.global).borrow().lookup(id)
    }

    #[inline]
    pub fn assign(&mut self, id: ParameterId, value: Value) -> bool {
        self.scopes
            .last()
            .unwrap_or(&self.global)
            .borrow_mut()
            .assign(id, value)
    }

    /// Snapshot every visible slot; inner frames shadow outer ones.
    pub fn capture(&self) -> FxHashMap<ParameterId, Value> {
        fn collect(scope: &Scope, captures: &mut FxHashMap<ParameterId, Value>) {
            for (id, value) in &scope.slots {
                captures.entry(*id).or_insert_with(|| value.clone());
            }
            if let Some(parent) = &scope.parent {
                collect(&parent.borrow(), captures);
            }
        }
        let mut captures = FxHashMap::default();
        collect(&self.current_scope().borrow(), &mut captures);
        captures
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}
