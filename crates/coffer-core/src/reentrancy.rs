//! Reentrancy protection for guarded entry points.
//!
//! A component owns one guard. While any guarded entry point of that
//! component is executing, every other guarded entry point of the same
//! component is rejected, including the one already running. This blocks
//! callbacks from an outbound value transfer from re-entering the ledger or
//! the coordinator before the outer call has finished.

use crate::error::CoreError;
use coffer_types::Address;
use parking_lot::Mutex;

/// A single frame in the guarded call stack.
#[derive(Debug, Clone, PartialEq)]
pub struct CallFrame {
    /// Entry point being executed
    pub entry_point: &'static str,
    /// Caller of the entry point
    pub caller: Address,
    /// Call depth (0 for top-level)
    pub depth: usize,
}

/// Per-component non-reentrant guard.
#[derive(Debug)]
pub struct ReentrancyGuard {
    component: &'static str,
    stack: Mutex<Vec<CallFrame>>,
}

impl ReentrancyGuard {
    pub fn new(component: &'static str) -> Self {
        Self {
            component,
            stack: Mutex::new(Vec::new()),
        }
    }

    /// Enter a guarded entry point.
    ///
    /// # Errors
    /// Returns `CoreError::Reentrant` if any guarded entry point of this
    /// component is already executing.
    pub fn enter(&self, entry_point: &'static str, caller: Address) -> Result<usize, CoreError> {
        let mut stack = self.stack.lock();

        if let Some(active) = stack.last() {
            tracing::warn!(
                component = self.component,
                entry_point,
                active = active.entry_point,
                caller = %caller,
                "Rejected reentrant call"
            );
            return Err(CoreError::Reentrant {
                component: self.component,
                entry_point,
                active: active.entry_point,
            });
        }

        let depth = stack.len();
        stack.push(CallFrame {
            entry_point,
            caller,
            depth,
        });
        Ok(depth)
    }

    /// Exit the current frame. Returns `None` on an empty stack.
    pub fn exit(&self) -> Option<CallFrame> {
        self.stack.lock().pop()
    }

    pub fn depth(&self) -> usize {
        self.stack.lock().len()
    }

    /// Check if a guarded call is in progress.
    pub fn is_entered(&self) -> bool {
        !self.stack.lock().is_empty()
    }

    pub fn current_frame(&self) -> Option<CallFrame> {
        self.stack.lock().last().cloned()
    }

    pub fn component(&self) -> &'static str {
        self.component
    }
}

/// A scoped guard that exits the call frame on drop, including on early
/// returns through `?`.
pub struct CallScope<'a> {
    guard: &'a ReentrancyGuard,
}

impl<'a> CallScope<'a> {
    /// Create a new call scope and enter it.
    pub fn enter(
        guard: &'a ReentrancyGuard,
        entry_point: &'static str,
        caller: Address,
    ) -> Result<Self, CoreError> {
        guard.enter(entry_point, caller)?;
        Ok(Self { guard })
    }

    pub fn depth(&self) -> usize {
        self.guard.depth()
    }
}

impl Drop for CallScope<'_> {
    fn drop(&mut self) {
        self.guard.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    #[test]
    fn test_basic_enter_exit() {
        let guard = ReentrancyGuard::new("ledger");
        assert!(!guard.is_entered());

        assert_eq!(guard.enter("deposit", addr(1)).unwrap(), 0);
        assert!(guard.is_entered());
        assert_eq!(guard.current_frame().unwrap().entry_point, "deposit");

        let frame = guard.exit().unwrap();
        assert_eq!(frame.caller, addr(1));
        assert!(!guard.is_entered());
        assert!(guard.exit().is_none());
    }

    #[test]
    fn test_nested_entry_rejected() {
        let guard = ReentrancyGuard::new("ledger");
        guard.enter("withdraw", addr(1)).unwrap();

        let err = guard.enter("deposit", addr(1)).unwrap_err();
        assert_eq!(
            err,
            CoreError::Reentrant {
                component: "ledger",
                entry_point: "deposit",
                active: "withdraw",
            }
        );
        // The rejected attempt leaves the outer frame untouched
        assert_eq!(guard.depth(), 1);
    }

    #[test]
    fn test_call_scope_releases_on_drop() {
        let guard = ReentrancyGuard::new("coordinator");
        {
            let scope = CallScope::enter(&guard, "execute", addr(2)).unwrap();
            assert_eq!(scope.depth(), 1);
            assert!(CallScope::enter(&guard, "execute", addr(3)).is_err());
        }
        assert!(!guard.is_entered());
        assert!(CallScope::enter(&guard, "execute", addr(3)).is_ok());
    }

    #[test]
    fn test_call_scope_releases_on_error_path() {
        fn guarded(guard: &ReentrancyGuard) -> Result<(), CoreError> {
            let _scope = CallScope::enter(guard, "allocate", addr(1))?;
            Err(CoreError::InvalidConfig("boom".into()))
        }

        let guard = ReentrancyGuard::new("ledger");
        assert!(guarded(&guard).is_err());
        assert!(!guard.is_entered());
    }
}
