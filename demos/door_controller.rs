//! Door Controller
//!
//! This example demonstrates a hierarchical machine guarding a door.
//!
//! Key concepts:
//! - Composite states (Closed contains Locked and Unlocked)
//! - Explicit initial state of a composite
//! - Event bubbling (Emergency is handled once, on Closed)
//! - Guarded transitions alongside guarded activities
//! - Snapshots of the active path
//!
//! Run with: RUST_LOG=hierarch=debug cargo run --example door_controller

use hierarch::builder::{activity, ActivityBuilder, TransitionBuilder};
use hierarch::{impl_event, Event, Hsm};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Unlock {
    code: u32,
}
#[derive(Debug)]
struct Lock;
#[derive(Debug)]
struct OpenDoor;
#[derive(Debug)]
struct CloseDoor;
#[derive(Debug)]
struct Emergency;

impl_event!(Unlock, Lock, OpenDoor, CloseDoor, Emergency);

#[derive(Debug)]
struct Door {
    code: u32,
    failed_attempts: u32,
    openings: u32,
}

fn entered_code(event: &dyn Event) -> Option<u32> {
    event.downcast_ref::<Unlock>().map(|unlock| unlock.code)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Door Controller ===\n");

    let mut hsm = Hsm::new(Door {
        code: 1234,
        failed_attempts: 0,
        openings: 0,
    });
    let top = hsm.root();
    let closed = hsm.add_composite("Closed", top)?;
    let unlocked = hsm.add_state("Unlocked", closed)?;
    let locked = hsm.add_state("Locked", closed)?;
    let open = hsm.add_state("Open", top)?;

    // Doors come back locked: Closed starts in Locked, not its first child.
    hsm.set_initial_state(closed, locked)?;

    hsm.add_transition::<Unlock>(
        locked,
        TransitionBuilder::new()
            .to(unlocked)
            .when_named("code_matches", |door: &Door, event| {
                entered_code(event) == Some(door.code)
            })
            .run(|door: &mut Door, _| door.failed_attempts = 0)
            .build()?,
    )?;
    hsm.add_activity::<Unlock>(
        locked,
        ActivityBuilder::new()
            .when(|door: &Door, event| entered_code(event) != Some(door.code))
            .run_named("count_failure", |door: &mut Door, _| {
                door.failed_attempts += 1;
                tracing::warn!(attempts = door.failed_attempts, "wrong code entered");
            })
            .build()?,
    )?;
    hsm.add_transition::<Lock>(unlocked, TransitionBuilder::new().to(locked).build()?)?;
    hsm.add_transition::<OpenDoor>(unlocked, TransitionBuilder::new().to(open).build()?)?;
    hsm.add_transition::<CloseDoor>(open, TransitionBuilder::new().to(closed).build()?)?;
    hsm.add_transition::<Emergency>(closed, TransitionBuilder::new().to(open).build()?)?;

    hsm.add_enter_activity(open, activity(|door: &mut Door, _| door.openings += 1))?;
    hsm.add_on_transition_completed_activity(activity(|_: &mut Door, event| {
        tracing::info!(trigger = event.name(), "transition completed");
    }))?;

    println!("{}\n", hsm.describe());

    hsm.start()?;
    println!("Started in: {}", hsm.name(hsm.current()).unwrap_or("?"));

    let steps: [(&str, &dyn Event); 6] = [
        ("Unlock(1111)", &Unlock { code: 1111 }),
        ("Unlock(1234)", &Unlock { code: 1234 }),
        ("OpenDoor", &OpenDoor),
        ("CloseDoor", &CloseDoor),
        ("Emergency", &Emergency),
        ("CloseDoor", &CloseDoor),
    ];
    for (label, event) in steps {
        let outcome = hsm.dispatch(event)?;
        println!(
            "  {label:<14} -> {:<9} handled={} transitions={}",
            hsm.name(hsm.current()).unwrap_or("?"),
            outcome.handled(),
            outcome.transitions_taken(),
        );
    }

    let door = hsm.context();
    println!(
        "\nDoor opened {} times, {} failed attempts pending",
        door.openings, door.failed_attempts
    );

    println!("\nSnapshot:\n{}", hsm.snapshot().to_json()?);

    hsm.stop()?;
    println!("\nStopped: running={}", hsm.is_running());

    println!("\n=== Example Complete ===");
    Ok(())
}
