extern crate deepfield_engine;
use deepfield_engine::core::elements::ElementState;
use deepfield_engine::core::fieldstate::FieldStateBuilder;
use deepfield_engine::core::input::InputFrame;
use deepfield_engine::core::model::*;

#[test]
fn specimen_hangs_and_drops() {
    let mut state = FieldStateBuilder::new().add_specimens(1).build();
    let rung = Region::rung(1);

    let summary = state.tick(0.02, &InputFrame::idle(), &[ContactEvent::enter(0, rung)]);
    assert_eq!(summary.score, SPECIMEN_POINTS);
    let specimen = state.get_element(0).unwrap();
    assert!(specimen.is_hanging());
    assert!(!specimen.can_score());
    assert!(!specimen.has_gravity());
    assert_eq!(specimen.attachment(), Attachment::Rung(1));
    assert_eq!(state.registry().slot_of(0), Some(0));

    let commands = state.drain_commands();
    assert!(commands.contains(&PhysicsCommand::SetGravity {
        object: 0,
        enabled: false
    }));
    assert!(commands.contains(&PhysicsCommand::ZeroVelocity { object: 0 }));

    let summary = state.tick(0.02, &InputFrame::idle(), &[ContactEvent::exit(0, rung)]);
    assert_eq!(summary.score, 0);
    let specimen = state.get_element(0).unwrap();
    assert!(!specimen.is_hanging());
    assert!(specimen.can_score());
    assert_eq!(specimen.state(), ElementState::SpecimenFree);
    assert_eq!(state.registry().slot_of(0), None);
}

#[test]
fn second_rung_contact_does_not_double_count() {
    let mut state = FieldStateBuilder::new().add_specimens(1).build();
    let summary = state.tick(
        0.02,
        &InputFrame::idle(),
        &[
            ContactEvent::enter(0, Region::rung(0)),
            ContactEvent::enter(0, Region::rung(1)),
            ContactEvent::exit(0, Region::rung(1)),
        ],
    );
    assert_eq!(summary.score, SPECIMEN_POINTS);
    assert!(summary.errors.is_empty());
    assert!(state.get_element(0).unwrap().is_hanging());
}

#[test]
fn mixed_score() {
    let mut state = FieldStateBuilder::new().add_samples(3).add_specimens(2).build();
    let summary = state.tick(
        0.02,
        &InputFrame::idle(),
        &[
            ContactEvent::enter(0, Region::basket(0)),
            ContactEvent::enter(1, Region::basket(1)),
            ContactEvent::enter(3, Region::rung(0)),
        ],
    );
    assert_eq!(summary.score, 2 * SAMPLE_POINTS + SPECIMEN_POINTS);
    assert_eq!(summary.score, state.compute_score());
}
