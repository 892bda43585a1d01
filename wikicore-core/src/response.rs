//! Conversion of handler return values into a [`HookResult`].

use crate::{
    error::BoxError,
    hook::{HookOutcome, HookResult},
};

/// Trait for converting a handler's return value into a [`HookResult`].
///
/// # Default Implementations
///
/// - `()` → Continue
/// - `bool` → `true` = Continue, `false` = Abort
/// - `String` / `&'static str` → Fatal, carrying the string
/// - `Option<T>` → `None` = Continue, otherwise delegates to `T`
/// - `HookOutcome` → As is
/// - `Result<T, E>` → Delegates to inner `T` or propagates the error
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid hook return value",
    label = "missing `IntoHookOutcome` implementation",
    note = "Handlers may return (), bool, a string, HookOutcome, Option or Result of those."
)]
pub trait IntoHookOutcome {
    /// Convert the value into an outcome or an error.
    fn into_hook_result(self) -> HookResult;
}

impl IntoHookOutcome for () {
    fn into_hook_result(self) -> HookResult {
        Ok(HookOutcome::Continue)
    }
}

impl IntoHookOutcome for bool {
    fn into_hook_result(self) -> HookResult {
        Ok(if self {
            HookOutcome::Continue
        } else {
            HookOutcome::Abort
        })
    }
}

impl IntoHookOutcome for HookOutcome {
    fn into_hook_result(self) -> HookResult {
        Ok(self)
    }
}

// A string return value always means "fatal", whatever it says.
impl IntoHookOutcome for String {
    fn into_hook_result(self) -> HookResult {
        Ok(HookOutcome::Fatal(self))
    }
}

impl IntoHookOutcome for &'static str {
    fn into_hook_result(self) -> HookResult {
        Ok(HookOutcome::Fatal(self.to_owned()))
    }
}

impl<T: IntoHookOutcome> IntoHookOutcome for Option<T> {
    fn into_hook_result(self) -> HookResult {
        match self {
            Some(t) => t.into_hook_result(),
            None => Ok(HookOutcome::Continue),
        }
    }
}

impl<T, E> IntoHookOutcome for Result<T, E>
where
    T: IntoHookOutcome,
    E: Into<BoxError>,
{
    fn into_hook_result(self) -> HookResult {
        match self {
            Ok(t) => t.into_hook_result(),
            Err(e) => Err(e.into()),
        }
    }
}
