//! Binding between value kinds and crypters.
//!
//! A registry is built once during setup, then frozen into an [`Arc`] and
//! shared read-only. Serialization hooks (serde, rusqlite) cannot take extra
//! arguments, so they look up the *active* registry:
//!
//! 1. the innermost registry entered on the current thread, if any;
//! 2. otherwise the process-wide registry, if one was installed.
//!
//! ```ignore
//! let mut registry = CrypterRegistry::new();
//! registry.register::<DefaultKind>(crypter)?;
//! let registry = Arc::new(registry);
//!
//! let json = registry.scope(|| serde_json::to_string(&record))?;
//! ```

use crate::error::{ValueError, ValueResult};
use silent_crypto::Crypter;
use std::any::{TypeId, type_name};
use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

static GLOBAL: OnceLock<Arc<CrypterRegistry>> = OnceLock::new();

thread_local! {
    // Entered registries, innermost last, each tagged with its guard's id.
    static ACTIVE: RefCell<Vec<(u64, Arc<CrypterRegistry>)>> = const { RefCell::new(Vec::new()) };
    static NEXT_GUARD: Cell<u64> = const { Cell::new(0) };
}

struct Entry {
    kind: TypeId,
    kind_name: &'static str,
    crypter: Arc<dyn Crypter>,
}

/// Maps each value kind to exactly one crypter.
#[derive(Default)]
pub struct CrypterRegistry {
    // At most one entry per kind, in registration order.
    entries: Vec<Entry>,
}

impl CrypterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `crypter` to the kind `K`.
    pub fn register<K: 'static>(&mut self, crypter: impl Crypter + 'static) -> ValueResult<()> {
        self.register_shared::<K>(Arc::new(crypter))
    }

    /// Binds an already shared crypter to the kind `K`.
    ///
    /// The same crypter may serve several kinds.
    pub fn register_shared<K: 'static>(&mut self, crypter: Arc<dyn Crypter>) -> ValueResult<()> {
        let kind_name = type_name::<K>();
        if self.is_registered::<K>() {
            return Err(ValueError::DuplicateRegistration(kind_name));
        }

        self.entries.push(Entry {
            kind: TypeId::of::<K>(),
            kind_name,
            crypter,
        });
        debug!(kind = kind_name, "crypter registered");
        Ok(())
    }

    /// Returns the crypter bound to `K`.
    pub fn resolve<K: 'static>(&self) -> ValueResult<&dyn Crypter> {
        let kind = TypeId::of::<K>();
        self.entries
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| entry.crypter.as_ref())
            .ok_or(ValueError::NoCrypterRegistered(type_name::<K>()))
    }

    pub fn is_registered<K: 'static>(&self) -> bool {
        let kind = TypeId::of::<K>();
        self.entries.iter().any(|entry| entry.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Makes this registry active on the current thread until the guard drops.
    ///
    /// Guards nest; the innermost live one wins. Dropping a guard removes only
    /// its own registry, whatever the drop order.
    pub fn enter(self: &Arc<Self>) -> RegistryGuard {
        let id = NEXT_GUARD.with(|next| {
            let id = next.get();
            next.set(id.wrapping_add(1));
            id
        });
        ACTIVE.with(|stack| stack.borrow_mut().push((id, Arc::clone(self))));
        RegistryGuard {
            id,
            _not_send: PhantomData,
        }
    }

    /// Runs `f` with this registry active on the current thread.
    pub fn scope<T>(self: &Arc<Self>, f: impl FnOnce() -> T) -> T {
        let _guard = self.enter();
        f()
    }

    /// Installs this registry as the process-wide fallback. Only the first
    /// call succeeds.
    pub fn install_global(self: Arc<Self>) -> ValueResult<()> {
        let kinds = self.len();
        GLOBAL
            .set(self)
            .map_err(|_| ValueError::RegistryAlreadyInstalled)?;
        info!(kinds, "global crypter registry installed");
        Ok(())
    }
}

impl std::fmt::Debug for CrypterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrypterRegistry")
            .field(
                "kinds",
                &self.entries.iter().map(|e| e.kind_name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Keeps a registry active on the current thread. Returned by
/// [`CrypterRegistry::enter`].
#[must_use = "the registry is only active while the guard is alive"]
pub struct RegistryGuard {
    id: u64,
    // Tied to the thread-local stack it was pushed onto.
    _not_send: PhantomData<*const ()>,
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        let _ = ACTIVE.try_with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(at) = stack.iter().rposition(|(id, _)| *id == self.id) {
                stack.remove(at);
            }
        });
    }
}

/// Runs `f` against the active registry.
///
/// Fails with [`ValueError::NoActiveRegistry`] if no registry was entered on
/// this thread and none was installed globally.
pub fn with_active<T>(f: impl FnOnce(&CrypterRegistry) -> ValueResult<T>) -> ValueResult<T> {
    // Clone out of the stack so `f` may enter further scopes.
    let scoped = ACTIVE.with(|stack| {
        let stack = stack.borrow();
        stack.last().map(|(_, registry)| Arc::clone(registry))
    });
    match scoped.as_deref().or_else(|| GLOBAL.get().map(|global| &**global)) {
        Some(registry) => f(registry),
        None => Err(ValueError::NoActiveRegistry),
    }
}
