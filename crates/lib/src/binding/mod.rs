//! The document binding facade.
//!
//! A [`DocBinding`] owns an engine document and keeps a plain snapshot of
//! it in lockstep. Local changes go through [`update`](DocBinding::update)
//! as ordinary value mutations and are translated to patches against the
//! shared tree; remote changes arrive as binary deltas through
//! [`apply_remote_deltas`](DocBinding::apply_remote_deltas) and the
//! snapshot follows by replaying the engine's change events. Every state
//! the snapshot passes through has been validated against the binding's
//! schema; changes that violate it are rolled back and reported.

use std::sync::{Arc, Mutex};

use tracing::{debug, trace, warn};
use yrs::updates::decoder::Decode;
use yrs::updates::encoder::Encode;
use yrs::{DeepObservable, Doc, MapRef, ReadTxn, StateVector, Subscription, Transact, Update};

use crate::apply::apply_patch;
use crate::bridge::read_map;
use crate::constants::ROOT;
use crate::replay::{ChangeEvent, capture_events, replay_events};
use crate::schema::Schema;
use crate::Result;
use crate::snapshot::{Patch, TextPathSet, Value, diff, diff_with};

pub mod errors;
pub use errors::BindingError;

/// Handle for removing a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Whether a binding is still usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Ready,
    Disposed,
}

type Listener = Box<dyn FnMut(&Value)>;

#[derive(Default)]
struct PendingEvents {
    events: Vec<ChangeEvent>,
    failure: Option<crate::replay::ReplayError>,
}

/// A schema-validated plain snapshot bound to a live engine document.
pub struct DocBinding {
    doc: Doc,
    root: MapRef,
    schema: Schema,
    text_paths: TextPathSet,
    snapshot: Value,
    lifecycle: Lifecycle,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    pending: Arc<Mutex<PendingEvents>>,
    observer: Option<Subscription>,
}

impl DocBinding {
    /// Creates a binding seeded from `initial`.
    ///
    /// The initial state is validated before anything touches the engine;
    /// a rejected seed leaves no document behind.
    pub fn new(schema: Schema, text_paths: TextPathSet, initial: impl Into<Value>) -> Result<Self> {
        let initial = initial.into();
        schema
            .validate(&initial)
            .map_err(|violation| BindingError::InvalidSeed {
                violation,
                state: initial.clone(),
            })?;
        let mut binding = Self::bind(schema, text_paths);
        {
            let mut txn = binding.doc.transact_mut();
            apply_patch(
                &mut txn,
                &binding.root,
                &Patch::replace_root(initial),
                &binding.text_paths,
            )?;
        }
        binding.take_pending()?;
        binding.snapshot = binding.serialize_root()?;
        debug!("seeded document from initial state");
        Ok(binding)
    }

    /// Creates a binding from previously encoded deltas.
    ///
    /// The deltas are merged into a fresh document and the resulting state
    /// must pass validation, otherwise the whole construction fails.
    pub fn from_deltas<I>(schema: Schema, text_paths: TextPathSet, deltas: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let mut binding = Self::bind(schema, text_paths);
        binding.ingest(deltas)?;
        binding.take_pending()?;
        binding.snapshot = binding.serialize_root()?;
        binding
            .schema
            .validate(&binding.snapshot)
            .map_err(|violation| BindingError::InvalidSeed {
                violation,
                state: binding.snapshot.clone(),
            })?;
        debug!("reconstructed document from deltas");
        Ok(binding)
    }

    fn bind(schema: Schema, text_paths: TextPathSet) -> Self {
        let doc = Doc::new();
        let root = doc.get_or_insert_map(ROOT);
        let pending = Arc::new(Mutex::new(PendingEvents::default()));
        let observer = {
            let pending = Arc::clone(&pending);
            root.observe_deep(move |txn, events| {
                let mut guard = match pending.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                if guard.failure.is_some() {
                    return;
                }
                match capture_events(txn, events) {
                    Ok(mut captured) => guard.events.append(&mut captured),
                    Err(err) => guard.failure = Some(err),
                }
            })
        };
        Self {
            doc,
            root,
            schema,
            text_paths,
            snapshot: Value::empty_map(),
            lifecycle: Lifecycle::Ready,
            listeners: Vec::new(),
            next_listener: 0,
            pending,
            observer: Some(observer),
        }
    }

    /// Runs a mutation against the current snapshot and pushes the
    /// resulting patches into the shared tree.
    ///
    /// The mutator works on a draft; nothing is shared until the change
    /// has been applied and validated. A change the schema rejects is
    /// rolled back and returned as a [`BindingError::SchemaViolation`].
    pub fn update<F>(&mut self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Value),
    {
        self.ensure_ready("update")?;
        let before = self.snapshot.clone();
        let (_, patches) = diff_with(&before, mutate);
        if patches.is_empty() {
            trace!("mutation produced no changes");
            return Ok(());
        }
        debug!(patches = patches.len(), "applying local mutation");
        let applied = self.apply_patches(&patches);
        let drained = self.take_pending();
        applied?;
        drained?;
        let candidate = self.serialize_root()?;
        match self.schema.validate(&candidate) {
            Ok(()) => {
                self.commit(candidate);
                Ok(())
            }
            Err(violation) => {
                warn!(%violation, "mutation rejected, restoring previous state");
                self.restore(&before)?;
                Err(BindingError::SchemaViolation {
                    violation,
                    old_state: before,
                    new_state: candidate,
                    patches,
                }
                .into())
            }
        }
    }

    /// Merges binary deltas from a remote peer.
    ///
    /// The snapshot follows the engine's change events. A merged state the
    /// schema rejects is corrected by restoring the previous state as new
    /// content, and reported with the offending change as patches.
    pub fn apply_remote_deltas<I>(&mut self, deltas: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        self.ensure_ready("apply_remote_deltas")?;
        let before = self.snapshot.clone();
        let merged = self.ingest(deltas);
        let drained = self.take_pending();
        merged?;
        let events = drained?;
        if events.is_empty() {
            trace!("deltas produced no events");
            return Ok(());
        }
        debug!(events = events.len(), "replaying remote change events");
        let candidate = match replay_events(&before, &events) {
            Ok(candidate) => candidate,
            // replay only fails if the snapshot diverged; the tree is truth
            Err(err) => {
                warn!(%err, "event replay failed, re-serializing the tree");
                self.serialize_root()?
            }
        };
        if candidate == before {
            return Ok(());
        }
        match self.schema.validate(&candidate) {
            Ok(()) => {
                self.commit(candidate);
                Ok(())
            }
            Err(violation) => {
                warn!(%violation, "remote state rejected, publishing corrective replace");
                self.restore(&before)?;
                let patches = diff(&before, &candidate);
                Err(BindingError::SchemaViolation {
                    violation,
                    old_state: before,
                    new_state: candidate,
                    patches,
                }
                .into())
            }
        }
    }

    /// The current snapshot.
    pub fn state(&self) -> Result<&Value> {
        self.ensure_ready("state")?;
        Ok(&self.snapshot)
    }

    /// The underlying engine document.
    pub fn doc(&self) -> Result<&Doc> {
        self.ensure_ready("doc")?;
        Ok(&self.doc)
    }

    /// Encodes the document's state vector for delta exchange.
    pub fn state_vector(&self) -> Result<Vec<u8>> {
        self.ensure_ready("state_vector")?;
        let txn = self.doc.transact();
        Ok(txn.state_vector().encode_v1())
    }

    /// Encodes the whole document as one delta.
    pub fn encode_update(&self) -> Result<Vec<u8>> {
        self.ensure_ready("encode_update")?;
        let txn = self.doc.transact();
        Ok(txn.encode_state_as_update_v1(&StateVector::default()))
    }

    /// Encodes everything a peer with `state_vector` is missing.
    pub fn encode_update_since(&self, state_vector: &[u8]) -> Result<Vec<u8>> {
        self.ensure_ready("encode_update_since")?;
        let sv = StateVector::decode_v1(state_vector).map_err(|err| {
            BindingError::MalformedStateVector {
                reason: err.to_string(),
            }
        })?;
        let txn = self.doc.transact();
        Ok(txn.encode_state_as_update_v1(&sv))
    }

    /// Registers a listener called with the snapshot after every committed
    /// change, in registration order.
    pub fn subscribe<F>(&mut self, listener: F) -> Result<ListenerId>
    where
        F: FnMut(&Value) + 'static,
    {
        self.ensure_ready("subscribe")?;
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        trace!(listener = id.0, "listener registered");
        Ok(id)
    }

    /// Removes a listener, returning whether it was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> Result<bool> {
        self.ensure_ready("unsubscribe")?;
        let before = self.listeners.len();
        self.listeners.retain(|(registered, _)| *registered != id);
        Ok(self.listeners.len() < before)
    }

    /// Whether the binding is still usable.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Detaches from the engine and drops all listeners.
    ///
    /// Disposal is idempotent; every other operation on a disposed
    /// binding fails with [`BindingError::UseAfterDispose`].
    pub fn dispose(&mut self) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }
        debug!("disposing document binding");
        drop(self.observer.take());
        self.listeners.clear();
        self.lifecycle = Lifecycle::Disposed;
    }

    fn ensure_ready(&self, operation: &str) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Ready => Ok(()),
            Lifecycle::Disposed => Err(BindingError::UseAfterDispose {
                operation: operation.to_string(),
            }
            .into()),
        }
    }

    fn apply_patches(&self, patches: &[Patch]) -> Result<()> {
        let mut txn = self.doc.transact_mut();
        for patch in patches {
            apply_patch(&mut txn, &self.root, patch, &self.text_paths)?;
        }
        Ok(())
    }

    fn ingest<I>(&self, deltas: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        // A malformed delta must reject the whole batch before any of it
        // reaches the tree, so decoding happens outside the transaction
        let mut updates = Vec::new();
        for delta in deltas {
            updates.push(Update::decode_v1(delta.as_ref()).map_err(|err| {
                BindingError::MalformedDelta {
                    reason: err.to_string(),
                }
            })?);
        }
        let merged = updates.len();
        let mut txn = self.doc.transact_mut();
        for update in updates {
            txn.apply_update(update)
                .map_err(|err| BindingError::DeltaRejected {
                    reason: err.to_string(),
                })?;
        }
        trace!(deltas = merged, "merged remote deltas");
        Ok(())
    }

    /// Takes everything the observer captured since the last call.
    ///
    /// Every transaction is followed by exactly one drain, so events can
    /// never leak from one operation into the next.
    fn take_pending(&self) -> Result<Vec<ChangeEvent>> {
        let mut guard = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(failure) = guard.failure.take() {
            guard.events.clear();
            return Err(failure.into());
        }
        Ok(std::mem::take(&mut guard.events))
    }

    /// Reads the whole shared tree into a plain snapshot.
    fn serialize_root(&self) -> Result<Value> {
        let txn = self.doc.transact();
        Ok(read_map(&txn, &self.root)?)
    }

    fn commit(&mut self, next: Value) {
        self.snapshot = next;
        if self.listeners.is_empty() {
            return;
        }
        trace!(listeners = self.listeners.len(), "notifying listeners");
        let Self {
            snapshot, listeners, ..
        } = self;
        for (_, listener) in listeners.iter_mut() {
            listener(snapshot);
        }
    }

    /// Rewrites the shared tree back to `state` and discards the events
    /// the rewrite produced.
    fn restore(&mut self, state: &Value) -> Result<()> {
        {
            let mut txn = self.doc.transact_mut();
            apply_patch(
                &mut txn,
                &self.root,
                &Patch::replace_root(state.clone()),
                &self.text_paths,
            )?;
        }
        self.take_pending()?;
        Ok(())
    }
}

impl std::fmt::Debug for DocBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocBinding")
            .field("lifecycle", &self.lifecycle)
            .field("listeners", &self.listeners.len())
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}
