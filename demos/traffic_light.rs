//! Traffic Light State Machine
//!
//! This example demonstrates a flat cyclic machine with a fault mode.
//!
//! Key concepts:
//! - Cyclic state transitions driven by a timer event
//! - Enter activities counting cycles
//! - Unconditional (unnamed) transitions chained after a repair
//! - Stop activities and transition history
//!
//! Run with: RUST_LOG=hierarch=trace cargo run --example traffic_light

use hierarch::builder::{activity, simple_transition};
use hierarch::{impl_event, Event, Fsm};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Timer;
#[derive(Debug)]
struct Fault;
#[derive(Debug)]
struct Repair;

impl_event!(Timer, Fault, Repair);

#[derive(Debug, Default)]
struct Intersection {
    cycles: u32,
    faults: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Traffic Light State Machine ===\n");

    let mut fsm = Fsm::new(Intersection::default());
    let red = fsm.add_state("Red")?;
    let green = fsm.add_state("Green")?;
    let yellow = fsm.add_state("Yellow")?;
    let flashing = fsm.add_state("Flashing")?;
    let self_test = fsm.add_state("SelfTest")?;

    fsm.add_transition::<Timer>(red, simple_transition(green))?;
    fsm.add_transition::<Timer>(green, simple_transition(yellow))?;
    fsm.add_transition::<Timer>(yellow, simple_transition(red))?;
    for state in [red, green, yellow] {
        fsm.add_transition::<Fault>(state, simple_transition(flashing))?;
    }
    fsm.add_transition::<Repair>(flashing, simple_transition(self_test))?;
    // The self test passes immediately and hands control back to Red.
    fsm.add_unnamed_transition(self_test, simple_transition(red))?;

    fsm.add_enter_activity(red, activity(|crossing: &mut Intersection, _| crossing.cycles += 1))?;
    fsm.add_enter_activity(
        flashing,
        activity(|crossing: &mut Intersection, _| {
            crossing.faults += 1;
            tracing::warn!(faults = crossing.faults, "signal fault, flashing yellow");
        }),
    )?;
    fsm.add_stop_activity(activity(|crossing: &mut Intersection, _| {
        tracing::info!(cycles = crossing.cycles, "intersection shut down");
    }))?;

    fsm.start()?;
    println!("Initial state: {}\n", fsm.name(fsm.current()).unwrap_or("?"));

    println!("Transition sequence:");
    let events: [&dyn Event; 7] = [&Timer, &Timer, &Timer, &Timer, &Fault, &Timer, &Repair];
    for event in events {
        let outcome = fsm.process_event(event)?;
        println!(
            "  {:<6} -> {:<8} (transitions: {})",
            event.name(),
            fsm.name(fsm.current()).unwrap_or("?"),
            outcome.transitions_taken()
        );
    }

    println!("\nHistory:");
    for record in fsm.history().transitions() {
        println!("  {} -> {} on {}", record.from_name, record.to_name, record.trigger);
    }

    fsm.stop()?;
    let crossing = fsm.into_context();
    println!(
        "\nCompleted {} red phases with {} fault(s)",
        crossing.cycles, crossing.faults
    );

    println!("\n=== Example Complete ===");
    Ok(())
}
