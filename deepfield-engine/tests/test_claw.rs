extern crate deepfield_engine;
use deepfield_engine::core::fieldstate::{FieldEvent, FieldStateBuilder};
use deepfield_engine::core::input::InputFrame;
use deepfield_engine::core::model::*;
use rstest::rstest;

#[rstest]
#[case(0.0, true)]
#[case(0.19, true)]
#[case(0.2, false)]
#[case(0.21, false)]
#[case(1.0, false)]
fn grab_window_after_close(#[case] elapsed: Seconds, #[case] grabbed: bool) {
    let mut state = FieldStateBuilder::new().add_samples(1).build();
    assert!(state.close_claw().is_some());

    let summary = state.tick(
        elapsed,
        &InputFrame::idle(),
        &[ContactEvent::enter(0, Region::claw())],
    );
    assert_eq!(summary.events.contains(&FieldEvent::Grabbed(0)), grabbed);
    let sample = state.get_element(0).unwrap();
    assert_eq!(sample.is_grabbed(), grabbed);
    assert_eq!(sample.is_kinematic(), grabbed);
}

#[test]
fn open_claw_never_grabs() {
    let mut state = FieldStateBuilder::new().add_samples(1).build();
    assert!(state.claw().is_open());
    let summary = state.tick(
        0.02,
        &InputFrame::idle(),
        &[ContactEvent::enter(0, Region::claw())],
    );
    assert!(summary.events.is_empty());
    assert!(!state.get_element(0).unwrap().is_grabbed());
}

#[test]
fn grab_issues_reparent_and_kinematic() {
    let mut state = FieldStateBuilder::new().add_samples(1).build();
    state.close_claw();
    state.drain_commands();
    state.tick(0.05, &InputFrame::idle(), &[ContactEvent::enter(0, Region::claw())]);
    assert_eq!(
        state.drain_commands(),
        vec![
            PhysicsCommand::Reparent {
                object: 0,
                parent: Attachment::Claw
            },
            PhysicsCommand::SetKinematic {
                object: 0,
                kinematic: true
            },
        ]
    );
}

#[test]
fn claw_toggles_wait_for_cooldown() {
    let mut state = FieldStateBuilder::new().build();
    let close = InputFrame {
        a_button_2: 1.0,
        ..Default::default()
    };
    let open = InputFrame {
        x_button_2: 1.0,
        ..Default::default()
    };
    let summary = state.tick(0.1, &close, &[]);
    assert_eq!(summary.events, vec![FieldEvent::Claw(deepfield_engine::core::claw::ClawToggle::Closed)]);
    assert!(!state.claw().can_toggle());

    // 0.2s after the close, still cooling down
    let summary = state.tick(0.2, &open, &[]);
    assert!(summary.events.is_empty());
    assert!(!state.claw().is_open());

    // cooldown task fires at 0.6
    let summary = state.tick(0.4, &open, &[]);
    assert_eq!(summary.events, vec![FieldEvent::Claw(deepfield_engine::core::claw::ClawToggle::Opened)]);
    assert!(state.claw().is_open());
}

#[test]
fn controls_ignored_outside_game() {
    let mut state = FieldStateBuilder::new()
        .set_phase(deepfield_engine::core::match_state::ProjectPhase::Settings)
        .build();
    let close = InputFrame {
        a_button_2: 1.0,
        ..Default::default()
    };
    state.tick(0.1, &close, &[]);
    assert!(state.claw().is_open());
}
