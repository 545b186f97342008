//! The scheduled summary: a timer trigger joined across trackers.

use weft_engine::OpRef;
use weft_foundation::{Value, record};

use crate::{register, session, tracker_of};

fn log(session: &weft_runtime::Session, tracker: &Value, entry: &str) {
    session
        .handle_request(
            "/events",
            record(&[("tracker", tracker.clone()), ("entry", Value::from(entry))]),
        )
        .unwrap();
}

fn summaries_of(session: &weft_runtime::Session, owner: &Value) -> Vec<Value> {
    session
        .engine()
        .registry()
        .query(
            &OpRef::new("summary", "summaries_for"),
            record(&[("owner", owner.clone())]),
        )
        .unwrap()
        .iter()
        .filter_map(|row| row.get("body").cloned())
        .collect()
}

#[test]
fn the_daily_summary_fans_out_per_active_owner() {
    let session = session();
    let ada = register(&session, "ada");
    let grace = register(&session, "grace");
    let idle = register(&session, "idle");

    log(&session, &tracker_of(&session, &ada), "headache");
    log(&session, &tracker_of(&session, &ada), "fatigue");
    log(&session, &tracker_of(&session, &grace), "nausea");

    let report = session.fire_timer("daily-summary").unwrap();

    // One firing of the rule, fanned out over the two active owners.
    assert_eq!(report.trace.len(), 1);
    assert_eq!(report.trace.firings()[0].frames, 2);

    assert_eq!(summaries_of(&session, &ada), vec![Value::from("2 event(s) logged")]);
    assert_eq!(
        summaries_of(&session, &grace),
        vec![Value::from("1 event(s) logged")]
    );
    assert!(summaries_of(&session, &idle).is_empty());
}

#[test]
fn firing_the_timer_twice_composes_twice() {
    let session = session();
    let ada = register(&session, "ada");
    log(&session, &tracker_of(&session, &ada), "headache");

    session.fire_timer("daily-summary").unwrap();
    session.fire_timer("daily-summary").unwrap();

    // Summaries are append-only snapshots; the rule itself is stateless.
    assert_eq!(summaries_of(&session, &ada).len(), 2);
}

#[test]
fn a_timer_with_no_active_trackers_composes_nothing() {
    let session = session();
    register(&session, "ada");

    let report = session.fire_timer("daily-summary").unwrap();
    assert!(report.trace.is_empty());

    let rows = session
        .engine()
        .registry()
        .query(&OpRef::new("tracker", "roster"), record(&[]))
        .unwrap();
    assert_eq!(rows.len(), 1);
}
