//! Transparent timing wrapper for async functions
//!
//! `Timed<F>` holds an async callable and forwards every call to it, taking a
//! monotonic timestamp before the call and another once its future resolves.
//! The difference is appended to a [`Recorder`] as one [`TimingEvent`] line.
//! The wrapped function's output is returned untouched.
//!
//! # Example
//!
//! ```
//! use timed::{timed, Recorder};
//!
//! async fn add(a: u32, b: u32) -> u32 {
//!     a + b
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let recorder = Recorder::new();
//! let add = timed!(add, recorder.clone());
//!
//! assert_eq!(add.call((2, 3)).await, 5);
//! assert_eq!(add.name(), "add");
//! assert_eq!(recorder.len(), 1);
//! # });
//! ```
//!
//! # Failure policy
//!
//! Only calls that complete successfully are recorded:
//!
//! - a panic in the wrapped future unwinds past the wrapper before anything
//!   is appended;
//! - a wrapper future dropped before it resolves (cancelled, timed out)
//!   records nothing;
//! - with [`Timed::try_call`], an `Err` output is returned to the caller and
//!   nothing is appended.
//!
//! [`Timed::call`] treats every resolved output as a success, including an
//! `Err` from a `Result`-returning function. Call those through `try_call`.

use crate::event::{function_identity, TimingEvent};
use crate::recorder::Recorder;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// An async callable taking its arguments as a tuple
///
/// Implemented for every `Fn(A1, .., An) -> impl Future` with up to six
/// arguments, so plain `async fn` items and closures returning futures can
/// be wrapped directly.
pub trait AsyncCall<Args> {
    type Output;
    type Future: Future<Output = Self::Output>;

    fn invoke(&self, args: Args) -> Self::Future;
}

macro_rules! impl_async_call {
    ($($arg:ident),*) => {
        impl<Func, Fut, $($arg,)*> AsyncCall<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Fut,
            Fut: Future,
        {
            type Output = Fut::Output;
            type Future = Fut;

            #[allow(non_snake_case)]
            fn invoke(&self, ($($arg,)*): ($($arg,)*)) -> Fut {
                (self)($($arg),*)
            }
        }
    };
}

impl_async_call!();
impl_async_call!(A1);
impl_async_call!(A1, A2);
impl_async_call!(A1, A2, A3);
impl_async_call!(A1, A2, A3, A4);
impl_async_call!(A1, A2, A3, A4, A5);
impl_async_call!(A1, A2, A3, A4, A5, A6);

/// Timing wrapper around an async callable
pub struct Timed<F> {
    identity: Arc<str>,
    func: F,
    recorder: Recorder,
}

impl<F> Timed<F> {
    /// Wrap `func` under its own identity, recording into the process-wide
    /// recorder
    pub fn wrap(func: F) -> Self {
        Self::wrap_with_recorder(func, Recorder::global().clone())
    }

    /// Wrap `func` under its own identity, recording into `recorder`
    pub fn wrap_with_recorder(func: F, recorder: Recorder) -> Self {
        let identity = function_identity(&func);
        Self::with_recorder(identity, func, recorder)
    }

    /// Wrap `func` under an explicit identity, recording into the
    /// process-wide recorder
    pub fn new(identity: impl Into<String>, func: F) -> Self {
        Self::with_recorder(identity, func, Recorder::global().clone())
    }

    /// Wrap `func` under an explicit identity, recording into `recorder`
    pub fn with_recorder(identity: impl Into<String>, func: F, recorder: Recorder) -> Self {
        Self {
            identity: Arc::from(identity.into()),
            func,
            recorder,
        }
    }

    /// Full identity, `"<module>.<qualified name>"`
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Qualified name without the module part (e.g. `UserRepo::load`)
    pub fn qualified_name(&self) -> &str {
        self.identity
            .split_once('.')
            .map_or(&*self.identity, |(_, name)| name)
    }

    /// Bare function name (e.g. `load`)
    pub fn name(&self) -> &str {
        let qualified = self.qualified_name();
        qualified.rsplit("::").next().unwrap_or(qualified)
    }

    /// The wrapped callable
    pub fn inner(&self) -> &F {
        &self.func
    }

    pub fn into_inner(self) -> F {
        self.func
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Call the wrapped function and record its duration
    ///
    /// Every resolved output is recorded, `Err` included; use
    /// [`Timed::try_call`] for `Result`-returning functions.
    pub async fn call<Args>(&self, args: Args) -> <F as AsyncCall<Args>>::Output
    where
        F: AsyncCall<Args>,
    {
        let start = Instant::now();
        let output = self.func.invoke(args).await;
        self.finish(start);
        output
    }

    /// Call a `Result`-returning function, recording only `Ok` outcomes
    pub async fn try_call<Args, T, E>(&self, args: Args) -> Result<T, E>
    where
        F: AsyncCall<Args, Output = Result<T, E>>,
    {
        let start = Instant::now();
        let output = self.func.invoke(args).await;
        match output {
            Ok(_) => self.finish(start),
            Err(_) => tracing::debug!(
                function = %self.identity,
                "call failed, no timing recorded"
            ),
        }
        output
    }

    fn finish(&self, start: Instant) {
        let event = TimingEvent::from_duration(&*self.identity, start.elapsed());
        self.recorder.record(&event);
    }
}

impl<F: Clone> Clone for Timed<F> {
    fn clone(&self) -> Self {
        Self {
            identity: Arc::clone(&self.identity),
            func: self.func.clone(),
            recorder: self.recorder.clone(),
        }
    }
}

impl<F> fmt::Debug for Timed<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timed")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Await `future`, recording its duration under `identity`
///
/// For one-off futures that have no function to wrap. Same policy as
/// [`Timed::call`]: recorded once the future resolves, never on drop.
pub async fn time_future<Fut>(identity: &str, recorder: &Recorder, future: Fut) -> Fut::Output
where
    Fut: Future,
{
    let start = Instant::now();
    let output = future.await;
    recorder.record(&TimingEvent::from_duration(identity, start.elapsed()));
    output
}

/// Wrap an async function in a [`Timed`]
///
/// The identity is the function's defining module joined to its qualified
/// name, e.g. `my_app::db.fetch_user` or `my_app::repo.UserRepo::load`,
/// wherever the wrapper is built. With a second argument, the wrapper
/// records into that [`Recorder`] instead of the global one.
///
/// For `Result`-returning functions, call the wrapper with
/// [`Timed::try_call`] so that `Err` outcomes are not timed; `call` records
/// them like any other output.
#[macro_export]
macro_rules! timed {
    ($func:expr) => {
        $crate::Timed::wrap($func)
    };
    ($func:expr, $recorder:expr) => {
        $crate::Timed::wrap_with_recorder($func, $recorder)
    };
}
