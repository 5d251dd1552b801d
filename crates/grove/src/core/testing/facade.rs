use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
};

use crate::core::native::{
    AttributeId, AttributeValue, FacadeError, FacadeResult, NativeEventKind, NativeFacade,
    NativeHandle, NodeType,
};

/// One recorded facade call.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCall {
    /// `create_node`.
    Create {
        /// Handle returned.
        handle: NativeHandle,
        /// Requested type.
        node_type: NodeType,
    },
    /// `dispose_node`.
    Dispose(NativeHandle),
    /// `set_attribute`.
    Set {
        /// Target node.
        handle: NativeHandle,
        /// Attribute.
        id: AttributeId,
        /// Value written.
        value: AttributeValue,
    },
    /// `reset_attribute`.
    Reset {
        /// Target node.
        handle: NativeHandle,
        /// Attribute.
        id: AttributeId,
    },
    /// `get_attribute`.
    Get {
        /// Target node.
        handle: NativeHandle,
        /// Attribute.
        id: AttributeId,
    },
    /// `insert_child`.
    Insert {
        /// Container.
        parent: NativeHandle,
        /// Inserted node.
        child: NativeHandle,
        /// Requested index.
        index: usize,
    },
    /// `remove_child`.
    Remove {
        /// Container.
        parent: NativeHandle,
        /// Removed node.
        child: NativeHandle,
    },
    /// `register_event`.
    Register {
        /// Target node.
        handle: NativeHandle,
        /// Event kind.
        kind: NativeEventKind,
    },
    /// `unregister_event`.
    Unregister {
        /// Target node.
        handle: NativeHandle,
        /// Event kind.
        kind: NativeEventKind,
    },
}

/// An in-memory toolkit that records every call and keeps enough state to
/// answer structural questions in assertions.
#[derive(Debug, Default)]
pub struct RecordingFacade {
    /// Calls in order.
    calls: RefCell<Vec<NativeCall>>,
    /// Next handle value.
    next: Cell<u64>,
    /// Injected failure statuses by operation name.
    failures: RefCell<HashMap<&'static str, i32>>,
    /// Current attribute values.
    attributes: RefCell<HashMap<(NativeHandle, AttributeId), AttributeValue>>,
    /// Native children per container.
    children: RefCell<HashMap<NativeHandle, Vec<NativeHandle>>>,
    /// Node types of live nodes.
    types: RefCell<HashMap<NativeHandle, NodeType>>,
    /// Live event registrations.
    registered: RefCell<HashSet<(NativeHandle, NativeEventKind)>>,
}

impl RecordingFacade {
    /// Construct an empty facade.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call to `op` fail with `status`.
    pub fn fail_on(&self, op: &'static str, status: i32) {
        self.failures.borrow_mut().insert(op, status);
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.failures.borrow_mut().clear();
    }

    /// Copy of the recorded calls.
    pub fn calls(&self) -> Vec<NativeCall> {
        self.calls.borrow().clone()
    }

    /// Take the recorded calls, leaving the log empty.
    pub fn take_calls(&self) -> Vec<NativeCall> {
        self.calls.take()
    }

    /// Clear the call log. Toolkit state is kept.
    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Attribute ids set on `handle`, in call order.
    pub fn set_ids(&self, handle: NativeHandle) -> Vec<AttributeId> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                NativeCall::Set { handle: h, id, .. } if *h == handle => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Current native children of `handle`.
    pub fn native_children(&self, handle: NativeHandle) -> Vec<NativeHandle> {
        self.children
            .borrow()
            .get(&handle)
            .cloned()
            .unwrap_or_default()
    }

    /// Current value of an attribute.
    pub fn attribute(&self, handle: NativeHandle, id: AttributeId) -> Option<AttributeValue> {
        self.attributes.borrow().get(&(handle, id)).cloned()
    }

    /// Type of a live node.
    pub fn node_type(&self, handle: NativeHandle) -> Option<NodeType> {
        self.types.borrow().get(&handle).copied()
    }

    /// Number of live nodes.
    pub fn live_nodes(&self) -> usize {
        self.types.borrow().len()
    }

    /// Is `kind` registered on `handle`?
    pub fn is_registered(&self, handle: NativeHandle, kind: NativeEventKind) -> bool {
        self.registered.borrow().contains(&(handle, kind))
    }

    /// Number of live registrations.
    pub fn registrations(&self) -> usize {
        self.registered.borrow().len()
    }

    /// Fail if a failure is injected for `op`.
    fn gate(&self, op: &'static str) -> FacadeResult<()> {
        match self.failures.borrow().get(op) {
            Some(status) => Err(FacadeError {
                op,
                status: *status,
            }),
            None => Ok(()),
        }
    }

    /// Append a call to the log.
    fn record(&self, call: NativeCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl NativeFacade for RecordingFacade {
    fn create_node(&self, node_type: NodeType) -> FacadeResult<NativeHandle> {
        self.gate("create_node")?;
        let handle = NativeHandle(self.next.get() + 1);
        self.next.set(handle.0);
        self.types.borrow_mut().insert(handle, node_type);
        self.record(NativeCall::Create { handle, node_type });
        Ok(handle)
    }

    fn dispose_node(&self, handle: NativeHandle) -> FacadeResult<()> {
        self.gate("dispose_node")?;
        self.types.borrow_mut().remove(&handle);
        self.children.borrow_mut().remove(&handle);
        self.attributes.borrow_mut().retain(|(h, _), _| *h != handle);
        self.record(NativeCall::Dispose(handle));
        Ok(())
    }

    fn set_attribute(
        &self,
        handle: NativeHandle,
        id: AttributeId,
        value: &AttributeValue,
    ) -> FacadeResult<()> {
        self.gate("set_attribute")?;
        self.attributes
            .borrow_mut()
            .insert((handle, id), value.clone());
        self.record(NativeCall::Set {
            handle,
            id,
            value: value.clone(),
        });
        Ok(())
    }

    fn reset_attribute(&self, handle: NativeHandle, id: AttributeId) -> FacadeResult<()> {
        self.gate("reset_attribute")?;
        self.attributes.borrow_mut().remove(&(handle, id));
        self.record(NativeCall::Reset { handle, id });
        Ok(())
    }

    fn get_attribute(
        &self,
        handle: NativeHandle,
        id: AttributeId,
    ) -> FacadeResult<Option<AttributeValue>> {
        self.gate("get_attribute")?;
        self.record(NativeCall::Get { handle, id });
        Ok(self.attribute(handle, id))
    }

    fn insert_child(
        &self,
        parent: NativeHandle,
        child: NativeHandle,
        index: usize,
    ) -> FacadeResult<()> {
        self.gate("insert_child")?;
        let mut children = self.children.borrow_mut();
        let list = children.entry(parent).or_default();
        list.insert(index.min(list.len()), child);
        self.record(NativeCall::Insert {
            parent,
            child,
            index,
        });
        Ok(())
    }

    fn remove_child(&self, parent: NativeHandle, child: NativeHandle) -> FacadeResult<()> {
        self.gate("remove_child")?;
        if let Some(list) = self.children.borrow_mut().get_mut(&parent) {
            list.retain(|c| *c != child);
        }
        self.record(NativeCall::Remove { parent, child });
        Ok(())
    }

    fn register_event(&self, handle: NativeHandle, kind: NativeEventKind) -> FacadeResult<()> {
        self.gate("register_event")?;
        self.registered.borrow_mut().insert((handle, kind));
        self.record(NativeCall::Register { handle, kind });
        Ok(())
    }

    fn unregister_event(&self, handle: NativeHandle, kind: NativeEventKind) -> FacadeResult<()> {
        self.registered.borrow_mut().remove(&(handle, kind));
        self.gate("unregister_event")?;
        self.record(NativeCall::Unregister { handle, kind });
        Ok(())
    }
}
