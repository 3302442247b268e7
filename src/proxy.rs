//! Deferred, compute-once values.
//!
//! A [`LazyProxy`] stands in for a value that is expensive or fallible to
//! construct. Nothing happens until the value is first observed through
//! [`LazyProxy::resolve`] (or one of the accessors built on it); the loaded value
//! is then cached for the lifetime of the proxy and every later access returns
//! the same reference.
//!
//! Failed loads are not cached: the next access runs the loader again. Wrap the
//! loader in [`Sticky`] to replay the first failure instead.
//!
//! Concurrent first access is serialized: exactly one thread runs the loader
//! while the others wait for its outcome.

use std::fmt;

use once_cell::sync::OnceCell;

/// Materializes the value a [`LazyProxy`] stands in for.
pub trait Loader {
    type Output;
    type Error;

    fn load(&self) -> Result<Self::Output, Self::Error>;
}

impl<L: Loader + ?Sized> Loader for Box<L> {
    type Output = L::Output;
    type Error = L::Error;

    fn load(&self) -> Result<Self::Output, Self::Error> {
        (**self).load()
    }
}

/// Loader backed by a closure. Built with [`from_fn`].
#[derive(Clone, Copy)]
pub struct FromFn<F>(F);

/// Wraps `f` as a [`Loader`].
pub const fn from_fn<T, E, F>(f: F) -> FromFn<F>
where
    F: Fn() -> Result<T, E>,
{
    FromFn(f)
}

impl<T, E, F> Loader for FromFn<F>
where
    F: Fn() -> Result<T, E>,
{
    type Output = T;
    type Error = E;

    fn load(&self) -> Result<T, E> {
        (self.0)()
    }
}

impl<F> fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FromFn")
    }
}

pub struct LazyProxy<L: Loader> {
    loader: L,
    value: OnceCell<L::Output>,
}

impl<L: Loader> LazyProxy<L> {
    /// Creates an unloaded proxy. Usable in `static` items.
    pub const fn new(loader: L) -> Self {
        Self {
            loader,
            value: OnceCell::new(),
        }
    }

    /// Loads the value on first use and returns the cached reference afterwards.
    ///
    /// A loader error is returned unchanged and leaves the proxy unloaded.
    pub fn resolve(&self) -> Result<&L::Output, L::Error> {
        self.value.get_or_try_init(|| self.loader.load())
    }

    /// Resolves the value and applies `f` to it.
    pub fn with<R>(&self, f: impl FnOnce(&L::Output) -> R) -> Result<R, L::Error> {
        self.resolve().map(f)
    }

    /// The loaded value, without triggering a load.
    pub fn get(&self) -> Option<&L::Output> {
        self.value.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.value.get().is_some()
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn into_inner(self) -> Option<L::Output> {
        self.value.into_inner()
    }
}

impl<L> fmt::Debug for LazyProxy<L>
where
    L: Loader,
    L::Output: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.get() {
            Some(value) => f.debug_tuple("LazyProxy").field(value).finish(),
            None => f.write_str("LazyProxy(<unloaded>)"),
        }
    }
}

/// Loader adapter that remembers the first failure and returns it on every
/// later load instead of retrying.
pub struct Sticky<L: Loader> {
    inner: L,
    failure: OnceCell<L::Error>,
}

impl<L: Loader> Sticky<L> {
    pub const fn new(inner: L) -> Self {
        Self {
            inner,
            failure: OnceCell::new(),
        }
    }

    pub fn failure(&self) -> Option<&L::Error> {
        self.failure.get()
    }
}

impl<L> Loader for Sticky<L>
where
    L: Loader,
    L::Error: Clone,
{
    type Output = L::Output;
    type Error = L::Error;

    fn load(&self) -> Result<Self::Output, Self::Error> {
        if let Some(failure) = self.failure.get() {
            return Err(failure.clone());
        }

        self.inner.load().map_err(|err| {
            let _ = self.failure.set(err.clone());
            err
        })
    }
}
