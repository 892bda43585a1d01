//! # Handler shapes
//!
//! Extensions subscribe with three callback shapes, modelled as one tagged
//! union dispatched through [`Handler::invoke`]:
//!
//! 1. **Plain function**: `|args| { ... }`
//! 2. **Bound receiver**: a value implementing [`Hook`], or any method paired
//!    with its receiver through [`Handler::method`]
//! 3. **Function with extra data**: data fixed at registration time is handed
//!    to the function on every call
//!
//! Every shape may return anything implementing [`IntoHookOutcome`].

use crate::{
    args::HookArgs,
    error::ArgumentError,
    hook::{Hook, HookResult},
    response::IntoHookOutcome,
};
use std::{
    any::{Any, type_name},
    fmt,
    sync::Arc,
};

type PlainFn = Arc<dyn Fn(&mut HookArgs<'_>) -> HookResult + Send + Sync>;
type DataFn = Arc<dyn Fn(&(dyn Any + Send + Sync), &mut HookArgs<'_>) -> HookResult + Send + Sync>;

/// A polymorphic handle over the supported callback shapes.
#[derive(Clone)]
pub enum Handler {
    /// A free function or closure.
    Plain(PlainFn),
    /// A receiver invoked through [`Hook::on_event`].
    Bound(Arc<dyn Hook>),
    /// A function invoked with data captured at registration time.
    WithData {
        /// The function.
        func: DataFn,
        /// The data handed to `func`.
        data: Arc<dyn Any + Send + Sync>,
    },
}

impl Handler {
    /// Wrap a plain function or closure.
    pub fn plain<F, R>(f: F) -> Self
    where
        F: Fn(&mut HookArgs<'_>) -> R + Send + Sync + 'static,
        R: IntoHookOutcome,
    {
        Handler::Plain(Arc::new(move |args: &mut HookArgs<'_>| {
            f(args).into_hook_result()
        }))
    }

    /// Wrap a receiver implementing [`Hook`].
    pub fn bound<H: Hook>(receiver: H) -> Self {
        Handler::Bound(Arc::new(receiver))
    }

    /// Bind `method` to `receiver`.
    pub fn method<T, R>(receiver: Arc<T>, method: fn(&T, &mut HookArgs<'_>) -> R) -> Self
    where
        T: Send + Sync + 'static,
        R: IntoHookOutcome + 'static,
    {
        Handler::Bound(Arc::new(BoundMethod { receiver, method }))
    }

    /// Wrap a function that receives `data` on every call.
    pub fn with_data<D, F, R>(data: D, f: F) -> Self
    where
        D: Send + Sync + 'static,
        F: Fn(&D, &mut HookArgs<'_>) -> R + Send + Sync + 'static,
        R: IntoHookOutcome,
    {
        let func: DataFn = Arc::new(
            move |data: &(dyn Any + Send + Sync), args: &mut HookArgs<'_>| -> HookResult {
                let data = data.downcast_ref::<D>().ok_or(ArgumentError::Data {
                    expected: type_name::<D>(),
                })?;
                f(data, args).into_hook_result()
            },
        );
        Handler::WithData {
            func,
            data: Arc::new(data),
        }
    }

    /// Call the handler.
    pub fn invoke(&self, args: &mut HookArgs<'_>) -> HookResult {
        match self {
            Handler::Plain(f) => f(args),
            Handler::Bound(receiver) => receiver.on_event(args),
            Handler::WithData { func, data } => func(&**data, args),
        }
    }

    /// Short name of the shape, for diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Handler::Plain(_) => "function",
            Handler::Bound(_) => "bound method",
            Handler::WithData { .. } => "function with data",
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.shape()).finish()
    }
}

struct BoundMethod<T, R> {
    receiver: Arc<T>,
    method: fn(&T, &mut HookArgs<'_>) -> R,
}

impl<T, R> Hook for BoundMethod<T, R>
where
    T: Send + Sync + 'static,
    R: IntoHookOutcome + 'static,
{
    fn on_event(&self, args: &mut HookArgs<'_>) -> HookResult {
        (self.method)(&self.receiver, args).into_hook_result()
    }
}
