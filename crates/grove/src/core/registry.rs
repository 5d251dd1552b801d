//! Routing of native callbacks back to instances.
//!
//! Registering an event returns an [`EventRegistration`]. Dropping the token
//! unregisters the event natively and removes the route, so an instance that
//! leaves the arena cannot receive stale callbacks.

use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::{Rc, Weak},
};

use crate::core::{
    error::Result,
    id::InstanceId,
    native::{NativeEventKind, NativeFacade, NativeHandle, check},
};

/// Route table keyed by handle and event kind.
type Routes = HashMap<(NativeHandle, NativeEventKind), InstanceId>;

/// Maps native handles to the instances that own them.
#[derive(Clone, Default)]
pub struct EventRegistry {
    /// Shared route table. Tokens hold a weak reference.
    routes: Rc<RefCell<Routes>>,
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("routes", &self.len())
            .finish()
    }
}

impl EventRegistry {
    /// Construct an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `kind` on `handle` for `id`.
    pub fn register(
        &self,
        facade: &Rc<dyn NativeFacade>,
        handle: NativeHandle,
        kind: NativeEventKind,
        id: InstanceId,
    ) -> Result<EventRegistration> {
        check(facade.register_event(handle, kind))?;
        self.routes.borrow_mut().insert((handle, kind), id);
        tracing::trace!("registered {kind:?} on {handle:?}");
        Ok(EventRegistration {
            handle,
            kind,
            routes: Rc::downgrade(&self.routes),
            facade: Rc::clone(facade),
        })
    }

    /// The instance registered for `kind` on `handle`.
    pub fn route(&self, handle: NativeHandle, kind: NativeEventKind) -> Option<InstanceId> {
        self.routes.borrow().get(&(handle, kind)).copied()
    }

    /// Number of live routes.
    pub fn len(&self) -> usize {
        self.routes.borrow().len()
    }

    /// Return true if no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A live native event registration. Unregisters on drop.
pub struct EventRegistration {
    /// Registered handle.
    handle: NativeHandle,
    /// Registered kind.
    kind: NativeEventKind,
    /// Route table to clean up.
    routes: Weak<RefCell<Routes>>,
    /// Facade to unregister through.
    facade: Rc<dyn NativeFacade>,
}

impl fmt::Debug for EventRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistration")
            .field("handle", &self.handle)
            .field("kind", &self.kind)
            .finish()
    }
}

impl EventRegistration {
    /// Registered handle.
    pub fn handle(&self) -> NativeHandle {
        self.handle
    }

    /// Registered kind.
    pub fn kind(&self) -> NativeEventKind {
        self.kind
    }
}

impl Drop for EventRegistration {
    fn drop(&mut self) {
        if let Some(routes) = self.routes.upgrade() {
            routes.borrow_mut().remove(&(self.handle, self.kind));
        }
        if let Err(e) = self.facade.unregister_event(self.handle, self.kind) {
            tracing::error!(
                "unregistering {:?} on {:?} failed: {e}",
                self.kind,
                self.handle
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;
    use crate::core::testing::facade::{NativeCall, RecordingFacade};

    #[test]
    fn drop_unregisters() -> Result<()> {
        let recording = Rc::new(RecordingFacade::new());
        let facade: Rc<dyn NativeFacade> = recording.clone();
        let mut ids: SlotMap<InstanceId, ()> = SlotMap::with_key();
        let id = ids.insert(());
        let registry = EventRegistry::new();
        let handle = NativeHandle(7);

        let token = registry.register(&facade, handle, NativeEventKind::Scroll, id)?;
        assert_eq!(registry.route(handle, NativeEventKind::Scroll), Some(id));
        assert!(recording.is_registered(handle, NativeEventKind::Scroll));

        drop(token);
        assert_eq!(registry.route(handle, NativeEventKind::Scroll), None);
        assert!(registry.is_empty());
        assert!(!recording.is_registered(handle, NativeEventKind::Scroll));
        assert!(recording.calls().contains(&NativeCall::Unregister {
            handle,
            kind: NativeEventKind::Scroll
        }));
        Ok(())
    }

    #[test]
    fn drop_survives_registry() -> Result<()> {
        let recording = Rc::new(RecordingFacade::new());
        let facade: Rc<dyn NativeFacade> = recording.clone();
        let mut ids: SlotMap<InstanceId, ()> = SlotMap::with_key();
        let id = ids.insert(());
        let registry = EventRegistry::new();
        let token = registry.register(&facade, NativeHandle(1), NativeEventKind::Focus, id)?;
        drop(registry);
        drop(token);
        assert!(!recording.is_registered(NativeHandle(1), NativeEventKind::Focus));
        Ok(())
    }

    #[test]
    fn failed_unregister_is_logged() -> Result<()> {
        let recording = Rc::new(RecordingFacade::new());
        let facade: Rc<dyn NativeFacade> = recording.clone();
        let mut ids: SlotMap<InstanceId, ()> = SlotMap::with_key();
        let id = ids.insert(());
        let registry = EventRegistry::new();
        let token = registry.register(&facade, NativeHandle(1), NativeEventKind::Blur, id)?;
        recording.fail_on("unregister_event", 3);
        drop(token);
        assert!(registry.is_empty());
        Ok(())
    }
}
