//! Scripted demo: register a user, score some regions, log events, then
//! fire the daily summary, printing each cascade trace.

use weft_engine::OpRef;
use weft_foundation::{Record, Result, Value, record};
use weft_runtime::{Response, Session, SessionConfig};

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let session = Session::new(SessionConfig::default())?;

    let user = request(&session, "/register", record(&[("name", Value::from("ada"))]))?;
    println!("registered: {user}");

    let maps = session
        .engine()
        .registry()
        .query(&OpRef::new("mapping", "maps_for"), record(&[("owner", user.clone())]))?;
    let map = maps
        .first()
        .and_then(|row| row.get("map"))
        .cloned()
        .unwrap_or(Value::Nil);
    println!("provisioned map: {map}");

    for (region, level) in [("neck", 4i64), ("back", 7), ("knees", 11)] {
        let outcome = session.handle_request(
            "/scores",
            record(&[
                ("map", map.clone()),
                ("region", Value::from(region)),
                ("level", Value::Int(level)),
            ]),
        )?;
        match outcome.response {
            Some(Response::Accepted { body, .. }) => println!("scored {region}: {body}"),
            Some(Response::Rejected { error, .. }) => println!("rejected {region}: {error}"),
            None => println!("no rule answered for {region}"),
        }
        print!("{}", outcome.report.trace);
    }

    let trackers = session
        .engine()
        .registry()
        .query(&OpRef::new("tracker", "trackers_for"), record(&[("owner", user.clone())]))?;
    let tracker = trackers
        .first()
        .and_then(|row| row.get("tracker"))
        .cloned()
        .unwrap_or(Value::Nil);
    for entry in ["headache", "fatigue"] {
        request(
            &session,
            "/events",
            record(&[("tracker", tracker.clone()), ("entry", Value::from(entry))]),
        )?;
    }

    let report = session.fire_timer("daily-summary")?;
    println!("daily summary cascade:");
    print!("{}", report.trace);

    let summaries = session
        .engine()
        .registry()
        .query(&OpRef::new("summary", "summaries_for"), record(&[("owner", user)]))?;
    for row in summaries {
        if let Some(body) = row.get("body") {
            println!("summary: {body}");
        }
    }
    Ok(())
}

/// Handles a request and returns the accepted body, treating anything else
/// as fatal for the script.
fn request(session: &Session, path: &str, payload: Record) -> Result<Value> {
    let outcome = session.handle_request(path, payload)?;
    print!("{}", outcome.report.trace);
    match outcome.response {
        Some(Response::Accepted { body, .. }) => Ok(body),
        Some(Response::Rejected { error, .. }) => Err(weft_foundation::Error::internal(format!(
            "request to {path} rejected: {error}"
        ))),
        None => Err(weft_foundation::Error::internal(format!(
            "no rule answered {path}"
        ))),
    }
}
