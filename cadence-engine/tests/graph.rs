mod common;

use cadence_behavior::{BehaviorProfile, RandomSource};
use cadence_engine::{build_machine, names, Context, GraphOptions, ProfileScope, StateMachine};
use common::{init_test_tracing, FlagSignal, ScriptedAutomation};
use std::sync::Arc;
use std::time::Duration;

fn wired(automation: &Arc<ScriptedAutomation>, signal: &Arc<FlagSignal>, options: GraphOptions) -> StateMachine {
    let rng = RandomSource::seeded(9).shared();
    let mut machine = build_machine(rng.clone(), options).unwrap();
    let ctx = machine.context_mut();
    ctx.automation = Some(automation.clone());
    ctx.cancellation = Some(signal.clone());
    ctx.behavior = Some(BehaviorProfile::new(rng));
    machine
}

#[tokio::test(start_paused = true)]
async fn full_cycle_processes_items_until_cancelled() {
    init_test_tracing();
    let signal = FlagSignal::new();
    let automation = ScriptedAutomation::new()
        .script("evaluate_item", [true, false])
        .with_budget(2, signal.clone())
        .shared();
    let mut machine = wired(&automation, &signal, GraphOptions::default());

    machine.start().await.unwrap();

    assert_eq!(machine.current_state(), Some(names::SHUTDOWN));
    assert_eq!(automation.count("act_positive"), 1);
    assert_eq!(automation.count("act_negative"), 1);
    assert_eq!(automation.count("cleanup"), 1);
    assert_eq!(signal.cleanups(), 1);
    assert_eq!(
        machine.context().behavior.as_ref().unwrap().items_processed(),
        2
    );

    let calls = automation.calls();
    let positive = calls.iter().position(|c| c == "act_positive").unwrap();
    let negative = calls.iter().position(|c| c == "act_negative").unwrap();
    assert!(positive < negative);
    assert_eq!(calls.last().map(String::as_str), Some("cleanup"));
}

#[tokio::test(start_paused = true)]
async fn persistent_failures_exhaust_recovery() {
    let signal = FlagSignal::new();
    let automation = ScriptedAutomation::new()
        .always("evaluate_item", true)
        .always("act_positive", false)
        .shared();
    let mut machine = wired(&automation, &signal, GraphOptions::default());

    machine.start().await.unwrap();

    assert_eq!(machine.current_state(), Some(names::SHUTDOWN));
    assert_eq!(automation.count("act_positive"), 4);
    assert_eq!(automation.count("act_negative"), 0);
    assert_eq!(machine.context().error_retry_count, 4);
    assert_eq!(automation.count("cleanup"), 1);
}

#[tokio::test(start_paused = true)]
async fn completed_item_between_failures_resets_the_streak() {
    let signal = FlagSignal::new();
    // Fail, fail, succeed, then fail until recovery runs out.
    let automation = ScriptedAutomation::new()
        .always("evaluate_item", true)
        .script("act_positive", [false, false, true, false, false, false, false])
        .shared();
    let mut machine = wired(&automation, &signal, GraphOptions::default());

    machine.start().await.unwrap();

    assert_eq!(machine.current_state(), Some(names::SHUTDOWN));
    assert_eq!(automation.count("act_positive"), 7);
    assert_eq!(machine.context().error_retry_count, 4);
}

#[tokio::test(start_paused = true)]
async fn item_scope_runs_without_a_preinstalled_profile() {
    let signal = FlagSignal::new();
    let automation = ScriptedAutomation::new()
        .always("evaluate_item", false)
        .with_budget(3, signal.clone())
        .shared();
    let options = GraphOptions {
        profile_scope: ProfileScope::Item,
        breaks_enabled: true,
        ..GraphOptions::default()
    };
    let mut machine = build_machine(RandomSource::seeded(3).shared(), options).unwrap();
    let ctx = machine.context_mut();
    ctx.automation = Some(automation.clone());
    ctx.cancellation = Some(signal.clone());

    machine.start().await.unwrap();

    assert_eq!(automation.count("act_negative"), 3);
    assert_eq!(
        machine.context().behavior.as_ref().unwrap().items_processed(),
        3
    );
}

#[tokio::test(start_paused = true)]
async fn replaced_context_still_reaches_a_terminal_shutdown() {
    let signal = FlagSignal::raised();
    let automation = ScriptedAutomation::new().shared();
    let mut machine = build_machine(RandomSource::seeded(4).shared(), GraphOptions::default()).unwrap();
    *machine.context_mut() = Context::new()
        .with_automation(automation.clone())
        .with_cancellation(signal.clone());

    tokio::time::timeout(Duration::from_secs(5), machine.start())
        .await
        .expect("shutdown ends the run")
        .unwrap();

    assert_eq!(machine.current_state(), Some(names::SHUTDOWN));
    assert!(!machine.is_running());
    assert!(machine.context().stop_handle().is_stopped());
    assert_eq!(automation.calls(), vec!["cleanup".to_string()]);
    assert_eq!(signal.cleanups(), 1);
}
