//! Reactions: the user callbacks commands run once every filter passes.
//!
//! A reaction is any async function whose parameters implement
//! [`FromContext`] and whose return value implements
//! [`IntoReactionResult`]:
//!
//! ```rust,ignore
//! async fn ping() {}
//!
//! async fn sum(ctx: CommandContext) -> Result<(), ReactionError> {
//!     let numbers: Vec<f64> = ctx.arg("numbers")?;
//!     tracing::info!(total = numbers.iter().sum::<f64>());
//!     Ok(())
//! }
//!
//! async fn greet(event: EventContext<TextEvent>, args: Arguments) -> Result<(), MyError> {
//!     // ...
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tower::BoxError;

use crate::context::CommandContext;
use crate::error::{ReactionError, ReactionResult};
use crate::extractor::FromContext;

// ============================================================================
// IntoReactionResult - Normalise reaction return values
// ============================================================================

/// Return types a reaction may have.
pub trait IntoReactionResult: Send {
    fn into_reaction_result(self) -> ReactionResult;
}

impl IntoReactionResult for () {
    fn into_reaction_result(self) -> ReactionResult {
        Ok(())
    }
}

impl<E: Into<BoxError> + Send> IntoReactionResult for Result<(), E> {
    fn into_reaction_result(self) -> ReactionResult {
        self.map_err(ReactionError::failed)
    }
}

// ============================================================================
// Reaction Trait
// ============================================================================

/// The trait implemented by reaction functions.
///
/// Implemented automatically for async functions taking 0-8 parameters that
/// implement [`FromContext`]. Parameters are extracted in order; the first
/// failing extraction aborts the call with [`ReactionError::Extract`].
#[async_trait]
pub trait Reaction<T>: Clone + Send + Sync + 'static {
    /// Calls the reaction with the given context.
    async fn call(self, ctx: CommandContext) -> ReactionResult;
}

/// A type-erased reaction stored inside a command.
pub type BoxedReaction =
    Arc<dyn Fn(CommandContext) -> BoxFuture<'static, ReactionResult> + Send + Sync>;

/// Converts a reaction function into a [`BoxedReaction`].
pub fn into_reaction<F, T>(f: F) -> BoxedReaction
where
    F: Reaction<T>,
    T: 'static,
{
    Arc::new(move |ctx| f.clone().call(ctx))
}

macro_rules! impl_reaction {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_variables)]
        #[async_trait]
        impl<F, Fut, Res, $($ty,)*> Reaction<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: IntoReactionResult + 'static,
            $( $ty: FromContext + Send + 'static, )*
        {
            async fn call(self, ctx: CommandContext) -> ReactionResult {
                $(
                    let $ty = $ty::from_context(&ctx)?;
                )*

                (self)($($ty,)*).await.into_reaction_result()
            }
        }
    };
}

impl_reaction!();
impl_reaction!(T1);
impl_reaction!(T1, T2);
impl_reaction!(T1, T2, T3);
impl_reaction!(T1, T2, T3, T4);
impl_reaction!(T1, T2, T3, T4, T5);
impl_reaction!(T1, T2, T3, T4, T5, T6);
impl_reaction!(T1, T2, T3, T4, T5, T6, T7);
impl_reaction!(T1, T2, T3, T4, T5, T6, T7, T8);

#[cfg(test)]
mod tests {
    use super::*;
    use chisel_core::{Arguments, BoxedEvent, EventContext, TextEvent};

    fn context() -> CommandContext {
        CommandContext::new(
            "echo",
            BoxedEvent::new(TextEvent::message("/echo hi")),
            Arguments::new(),
        )
    }

    #[test]
    fn test_unit_reaction_succeeds() {
        let reaction = into_reaction(|| async {});
        assert!(tokio_test::block_on(reaction(context())).is_ok());
    }

    #[test]
    fn test_error_return_is_captured() {
        let reaction = into_reaction(|_ctx: CommandContext| async {
            Err::<(), _>("nothing to echo")
        });

        let err = tokio_test::block_on(reaction(context())).unwrap_err();
        assert_eq!(err.to_string(), "nothing to echo");
    }

    #[test]
    fn test_extractors_run_in_order() {
        let reaction = into_reaction(
            |event: EventContext<TextEvent>, ctx: CommandContext| async move {
                assert_eq!(event.text.as_deref(), Some("/echo hi"));
                assert_eq!(ctx.command(), "echo");
            },
        );
        assert!(tokio_test::block_on(reaction(context())).is_ok());
    }

    #[test]
    fn test_missing_argument_is_extract_error() {
        let reaction = into_reaction(|ctx: CommandContext| async move {
            let _: i64 = ctx.arg("count")?;
            Ok::<(), ReactionError>(())
        });

        let err = tokio_test::block_on(reaction(context())).unwrap_err();
        assert!(matches!(err, ReactionError::Extract(_)));
        assert!(err.render().contains("count"));
    }
}
