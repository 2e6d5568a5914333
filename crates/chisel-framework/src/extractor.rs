use chisel_core::{Arguments, BoxedEvent, Event, EventContext};

use crate::context::CommandContext;
use crate::error::{ExtractError, ExtractResult};

/// A trait for types that can be extracted from a [`CommandContext`].
///
/// Types implementing this trait can be used directly as reaction
/// parameters. A failed extraction is recorded as a reaction failure of the
/// command; the reaction body does not run.
pub trait FromContext: Sized {
    /// Attempts to extract this type from the given context.
    fn from_context(ctx: &CommandContext) -> ExtractResult<Self>;
}

impl FromContext for CommandContext {
    fn from_context(ctx: &CommandContext) -> ExtractResult<Self> {
        Ok(ctx.clone())
    }
}

impl FromContext for BoxedEvent {
    fn from_context(ctx: &CommandContext) -> ExtractResult<Self> {
        Ok(ctx.event().clone())
    }
}

impl FromContext for Arguments {
    fn from_context(ctx: &CommandContext) -> ExtractResult<Self> {
        Ok(ctx.arguments().clone())
    }
}

/// Optional parameters never fail; an extraction error becomes `None`.
impl<T: FromContext> FromContext for Option<T> {
    fn from_context(ctx: &CommandContext) -> ExtractResult<Self> {
        Ok(T::from_context(ctx).ok())
    }
}

/// Downcasts the event to a concrete type.
impl<T> FromContext for EventContext<T>
where
    T: Event + Clone + 'static,
{
    fn from_context(ctx: &CommandContext) -> ExtractResult<Self> {
        ctx.event()
            .extract::<T>()
            .ok_or(ExtractError::EventTypeMismatch {
                expected: std::any::type_name::<T>(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chisel_core::{ArgValue, TextEvent};

    #[derive(Clone)]
    struct Joined;

    impl Event for Joined {
        fn event_type(&self) -> &str {
            "group_join"
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn context() -> CommandContext {
        let arguments = [("n", ArgValue::Integer(3))].into_iter().collect();
        CommandContext::new("count", BoxedEvent::new(TextEvent::message("/count 3")), arguments)
    }

    #[test]
    fn test_extract_event_context() {
        let ctx = context();

        let typed = EventContext::<TextEvent>::from_context(&ctx).unwrap();
        assert_eq!(typed.text.as_deref(), Some("/count 3"));
        assert!(matches!(
            EventContext::<Joined>::from_context(&ctx),
            Err(ExtractError::EventTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_option_swallows_errors() {
        let ctx = context();
        assert!(Option::<EventContext<Joined>>::from_context(&ctx).unwrap().is_none());
    }

    #[test]
    fn test_arguments_and_typed_access() {
        let ctx = context();

        assert_eq!(Arguments::from_context(&ctx).unwrap().len(), 1);
        assert_eq!(ctx.arg::<i64>("n").unwrap(), 3);
        assert!(matches!(
            ctx.arg::<bool>("n"),
            Err(ExtractError::Argument(_))
        ));
    }
}
