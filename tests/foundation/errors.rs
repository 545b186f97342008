//! Tests for error construction and display.

use weft_foundation::{CascadeLimit, Error, ErrorContext, ErrorKind};

#[test]
fn kinds_render_their_subject() {
    let err = Error::unknown_operation("ghost.op");
    assert!(err.to_string().contains("ghost.op"));

    let err = Error::malformed_rule("dangling", "no effects");
    assert!(err.to_string().contains("dangling"));
    assert!(err.to_string().contains("no effects"));

    let err = Error::unbound_variable("summary", "owner");
    assert!(err.to_string().contains("owner"));
}

#[test]
fn limit_errors_carry_the_ceiling() {
    let err = Error::limit_exceeded(CascadeLimit::MaxGenerations { limit: 3 });
    assert!(matches!(
        err.kind,
        ErrorKind::LimitExceeded(CascadeLimit::MaxGenerations { limit: 3 })
    ));
    assert!(err.to_string().contains('3'));
}

#[test]
fn context_is_attached_not_required() {
    let bare = Error::internal("broke");
    assert!(bare.context.is_none());

    let dressed = Error::internal("broke").with_context(
        ErrorContext::new()
            .with_rule("daily-summary")
            .with_generation(2),
    );
    let context = dressed.context.unwrap();
    assert_eq!(context.rule.as_deref(), Some("daily-summary"));
    assert_eq!(context.generation, Some(2));
}
