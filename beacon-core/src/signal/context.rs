//! Dispatch Context
//!
//! Tracks which signals are currently dispatching on this thread. Listeners
//! may fire signals themselves, including the one that invoked them, so
//! dispatches nest; the stack records that nesting.
//!
//! # Implementation
//!
//! A thread-local stack of signal IDs. A dispatch pushes its signal on entry
//! and the returned guard pops it on drop, so the stack stays balanced even
//! if something unwinds through it.
//!
//! Parallel listeners and `fire_async` broadcasts run on other tasks and
//! start with their own (empty) stack.

use std::cell::RefCell;

use super::SignalId;

thread_local! {
    static DISPATCH_STACK: RefCell<Vec<SignalId>> = const { RefCell::new(Vec::new()) };
}

/// Guard for one level of dispatch on the current thread.
pub struct DispatchContext {
    signal: SignalId,
}

impl DispatchContext {
    /// Enter a dispatch of `signal`. The level is exited when the guard drops.
    pub(crate) fn enter(signal: SignalId) -> Self {
        DISPATCH_STACK.with(|stack| stack.borrow_mut().push(signal));
        Self { signal }
    }

    /// Whether any signal is dispatching on this thread.
    pub fn is_dispatching() -> bool {
        DISPATCH_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// The innermost signal dispatching on this thread.
    pub fn current_signal() -> Option<SignalId> {
        DISPATCH_STACK.with(|stack| stack.borrow().last().copied())
    }

    /// How many dispatches of `signal` are nested on this thread.
    pub fn depth_of(signal: SignalId) -> usize {
        DISPATCH_STACK.with(|stack| stack.borrow().iter().filter(|id| **id == signal).count())
    }
}

impl Drop for DispatchContext {
    fn drop(&mut self) {
        DISPATCH_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert_eq!(
                popped,
                Some(self.signal),
                "DispatchContext mismatch: expected {:?}, got {:?}",
                self.signal,
                popped
            );
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_tracks_signal() {
        let id = SignalId::next();

        assert!(!DispatchContext::is_dispatching());
        assert!(DispatchContext::current_signal().is_none());

        {
            let _ctx = DispatchContext::enter(id);
            assert!(DispatchContext::is_dispatching());
            assert_eq!(DispatchContext::current_signal(), Some(id));
        }

        assert!(!DispatchContext::is_dispatching());
        assert_eq!(DispatchContext::depth_of(id), 0);
    }

    #[test]
    fn nested_dispatches() {
        let outer = SignalId::next();
        let inner = SignalId::next();

        let _ctx1 = DispatchContext::enter(outer);
        {
            let _ctx2 = DispatchContext::enter(inner);
            let _ctx3 = DispatchContext::enter(outer);

            assert_eq!(DispatchContext::current_signal(), Some(outer));
            assert_eq!(DispatchContext::depth_of(outer), 2);
            assert_eq!(DispatchContext::depth_of(inner), 1);
        }

        assert_eq!(DispatchContext::current_signal(), Some(outer));
        assert_eq!(DispatchContext::depth_of(outer), 1);
        assert_eq!(DispatchContext::depth_of(inner), 0);
    }
}
