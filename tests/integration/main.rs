//! End-to-end tests through a full session: requests in, cascades through
//! the rules, responses out.

mod summaries;

use weft_foundation::{Value, record};
use weft_runtime::{Response, Session, SessionConfig};

/// Fresh default session.
pub fn session() -> Session {
    Session::new(SessionConfig::default()).unwrap()
}

/// Registers a user and returns their id.
pub fn register(session: &Session, name: &str) -> Value {
    let outcome = session
        .handle_request("/register", record(&[("name", Value::from(name))]))
        .unwrap();
    match outcome.response.expect("registration got no response") {
        Response::Accepted { body, .. } => body,
        Response::Rejected { error, .. } => panic!("registration rejected: {error:?}"),
    }
}

/// The id of the user's automatically provisioned map.
pub fn map_of(session: &Session, user: &Value) -> Value {
    session
        .engine()
        .registry()
        .query(
            &weft_engine::OpRef::new("mapping", "maps_for"),
            record(&[("owner", user.clone())]),
        )
        .unwrap()
        .first()
        .and_then(|row| row.get("map"))
        .cloned()
        .expect("no map was provisioned")
}

/// The id of the user's automatically provisioned tracker.
pub fn tracker_of(session: &Session, user: &Value) -> Value {
    session
        .engine()
        .registry()
        .query(
            &weft_engine::OpRef::new("tracker", "trackers_for"),
            record(&[("owner", user.clone())]),
        )
        .unwrap()
        .first()
        .and_then(|row| row.get("tracker"))
        .cloned()
        .expect("no tracker was provisioned")
}
