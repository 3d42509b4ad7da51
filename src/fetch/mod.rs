//! Coalescing, session-scoped cache for asynchronous lookups.

mod store;

pub use store::{
    FieldDisabledReason, FieldDisabledState, FieldMetadataFlags, FieldPermissions, FieldSchema,
    FieldSchemaMap, FieldType, SchemaStore, WorkflowStage,
};

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use futures::future::{self, LocalBoxFuture, Shared};
use futures::FutureExt;
use serde::Serialize;

type FetchFn<A, V, E> = Rc<dyn Fn(A) -> LocalBoxFuture<'static, Result<V, E>>>;
type UidResolver<A> = Rc<dyn Fn(&A) -> String>;
type InFlight<V, E> = Shared<LocalBoxFuture<'static, Result<V, E>>>;

struct CacheState<V, E> {
    resolved: HashMap<String, V>,
    in_flight: HashMap<String, InFlight<V, E>>,
    generation: u64,
}

/// Wraps an async fetch so identical concurrent calls share one underlying
/// request and successful results are remembered until [`clear_cache`].
///
/// [`clear_cache`]: CachedFetch::clear_cache
pub struct CachedFetch<A, V, E> {
    fetch: FetchFn<A, V, E>,
    resolve_uid: UidResolver<A>,
    state: Rc<RefCell<CacheState<V, E>>>,
    calls: Rc<Cell<u64>>,
}

impl<A, V, E> Clone for CachedFetch<A, V, E> {
    fn clone(&self) -> Self {
        Self {
            fetch: Rc::clone(&self.fetch),
            resolve_uid: Rc::clone(&self.resolve_uid),
            state: Rc::clone(&self.state),
            calls: Rc::clone(&self.calls),
        }
    }
}

impl<A, V, E> CachedFetch<A, V, E>
where
    A: Serialize + 'static,
    V: Clone + 'static,
    E: Clone + 'static,
{
    /// Keys entries by the JSON serialization of the arguments.
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn(A) -> Fut + 'static,
        Fut: Future<Output = Result<V, E>> + 'static,
    {
        Self::with_uid_resolver(fetch, |args: &A| {
            serde_json::to_string(args).unwrap_or_default()
        })
    }
}

impl<A, V, E> CachedFetch<A, V, E>
where
    A: 'static,
    V: Clone + 'static,
    E: Clone + 'static,
{
    pub fn with_uid_resolver<F, Fut, R>(fetch: F, resolve_uid: R) -> Self
    where
        F: Fn(A) -> Fut + 'static,
        Fut: Future<Output = Result<V, E>> + 'static,
        R: Fn(&A) -> String + 'static,
    {
        Self {
            fetch: Rc::new(move |args| fetch(args).boxed_local()),
            resolve_uid: Rc::new(resolve_uid),
            state: Rc::new(RefCell::new(CacheState {
                resolved: HashMap::new(),
                in_flight: HashMap::new(),
                generation: 0,
            })),
            calls: Rc::new(Cell::new(0)),
        }
    }

    pub fn call(&self, args: A) -> LocalBoxFuture<'static, Result<V, E>> {
        let uid = (self.resolve_uid)(&args);
        {
            let state = self.state.borrow();
            if let Some(value) = state.resolved.get(&uid) {
                return future::ready(Ok(value.clone())).boxed_local();
            }
            if let Some(in_flight) = state.in_flight.get(&uid) {
                return in_flight.clone().boxed_local();
            }
        }

        self.calls.set(self.calls.get() + 1);
        let generation = self.state.borrow().generation;
        let request = (self.fetch)(args);
        let state = Rc::clone(&self.state);
        let key = uid.clone();
        let shared = async move {
            let outcome = request.await;
            let mut state = state.borrow_mut();
            // A clear while this was running means the result must not land.
            if state.generation == generation {
                state.in_flight.remove(&key);
                if let Ok(value) = &outcome {
                    state.resolved.insert(key, value.clone());
                }
            }
            outcome
        }
        .boxed_local()
        .shared();

        self.state
            .borrow_mut()
            .in_flight
            .insert(uid, shared.clone());
        shared.boxed_local()
    }

    /// Forgets every resolved value and in-flight marker. Futures already
    /// handed out still settle.
    pub fn clear_cache(&self) {
        let mut state = self.state.borrow_mut();
        state.resolved.clear();
        state.in_flight.clear();
        state.generation += 1;
    }

    /// Number of underlying fetches started so far.
    pub fn fetch_count(&self) -> u64 {
        self.calls.get()
    }

    pub fn is_cached(&self, args: &A) -> bool {
        let uid = (self.resolve_uid)(args);
        self.state.borrow().resolved.contains_key(&uid)
    }
}
