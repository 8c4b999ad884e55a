//! Tokio runtime ownership and the root cancellation scope.
//!
//! Every generation token handed out by [`TypeaheadHandle::child_token`] is a
//! child of the runtime's root token, so [`TypeaheadRuntime::shutdown`]
//! cancels all in-flight suggestion and preview work in one step.
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct TypeaheadHandle {
    inner: Handle,
    cancel: CancellationToken,
}

pub struct TypeaheadRuntime {
    runtime: Runtime,
    cancel: CancellationToken,
}

impl TypeaheadRuntime {
    /// Runtime for the host's pipelines. `worker_threads` defaults to one
    /// per core; zero is raised to one.
    ///
    /// ```
    /// use typeahead_runtime::TypeaheadRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = TypeaheadRuntime::build("typeahead-worker", Some(0))
    ///     .expect("runtime builds");
    /// let scope = runtime.handle().child_token();
    /// let watched = scope.clone();
    /// runtime.shutdown(Duration::from_millis(10));
    /// assert!(watched.is_cancelled());
    /// ```
    pub fn build(thread_name: &str, worker_threads: Option<usize>) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(thread_name);

        if let Some(workers) = worker_threads {
            builder.worker_threads(workers.max(1));
        }

        let runtime = builder.build()?;
        Ok(Self {
            runtime,
            cancel: CancellationToken::new(),
        })
    }

    pub fn handle(&self) -> TypeaheadHandle {
        TypeaheadHandle {
            inner: self.runtime.handle().clone(),
            cancel: self.cancel.clone(),
        }
    }

    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Cancel every generation scope, then give spawned pipelines `graceful`
    /// to wind down before the runtime is dropped.
    pub fn shutdown(self, graceful: Duration) {
        self.cancel.cancel();
        self.runtime.shutdown_timeout(graceful);
    }
}

impl TypeaheadHandle {
    /// Wrap the runtime the caller is already running on, with a fresh root token.
    ///
    /// Panics when called outside a Tokio runtime, like [`Handle::current`].
    pub fn current() -> Self {
        Self {
            inner: Handle::current(),
            cancel: CancellationToken::new(),
        }
    }

    /// Start a pipeline without blocking the caller. Callers that may run off
    /// the runtime thread (a UI callback, say) use this instead of
    /// `tokio::spawn`.
    ///
    /// ```
    /// use typeahead_runtime::TypeaheadRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = TypeaheadRuntime::build("spawn-doctest", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// let scope = handle.child_token();
    /// let pipeline = handle.spawn({
    ///     let scope = scope.clone();
    ///     async move {
    ///         scope.cancelled().await;
    ///         "superseded"
    ///     }
    /// });
    /// scope.cancel();
    /// assert_eq!(runtime.block_on(pipeline).unwrap(), "superseded");
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn spawn<F, T>(&self, fut: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.inner.spawn(fut)
    }

    /// New scope that is cancelled when either it or the root is cancelled.
    ///
    /// ```
    /// use typeahead_runtime::TypeaheadRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = TypeaheadRuntime::build("child-example", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// let scope = handle.child_token();
    /// handle.cancellation().cancel();
    /// assert!(scope.is_cancelled());
    /// runtime.shutdown(Duration::from_millis(5));
    /// ```
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// The root token. Cancelling it ends every scope handed out so far.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }
}
