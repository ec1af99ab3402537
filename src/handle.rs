//! Write access to UI state from async operations.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::{RwSignal, Update};

/// Something that owns a `T` which async work may update after an await.
///
/// Views keep their state in a signal; tests use a plain `Rc<RefCell<T>>`.
pub trait StateHandle<T>: Clone {
	/// Runs `f` against the state, or returns `None` once the owning view has
	/// been disposed.
	fn apply<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R>;
}

impl<T: Send + Sync + 'static> StateHandle<T> for RwSignal<T> {
	fn apply<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
		self.try_update(f)
	}
}

impl<T> StateHandle<T> for Rc<RefCell<T>> {
	fn apply<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
		Some(f(&mut self.borrow_mut()))
	}
}
