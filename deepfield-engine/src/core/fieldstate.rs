use derivative::Derivative;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::claw::{Claw, ClawToggle};
use super::config::SimConfig;
use super::conversion::ConversionController;
use super::elements::{ElementState, ScoringElement, StateChange};
use super::input::InputFrame;
use super::match_state::{MatchState, PhaseChange, ProjectPhase};
use super::model::*;
use super::registry::ScoringRegistry;
use super::robot::Robot;
use super::scheduler::{ScheduledTask, Scheduler, TaskHandle, TaskKind};
use super::sim_errors::SimError;

/// Something observable that happened during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldEvent {
    Phase(PhaseChange),
    Claw(ClawToggle),
    Element(StateChange),
    ConversionStarted(ObjectId),
    ConversionCancelled(ObjectId),
    Converted { sample: ObjectId, specimen: ObjectId },
    Grabbed(ObjectId),
    Released(ObjectId),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSummary {
    pub time: Seconds,
    pub events: Vec<FieldEvent>,
    pub errors: Vec<SimError>,
    pub score: u32,
}

/// The whole simulated field. Owns every controller and is advanced by `tick`.
#[derive(Derivative)]
#[derivative(PartialEq)]
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FieldState {
    pub info: MatchState,
    config: SimConfig,
    elements: Vec<Option<ScoringElement>>,
    registry: ScoringRegistry,
    claw: Claw,
    conversions: ConversionController,
    scheduler: Scheduler,
    robot: Robot,
    score: u32,

    #[serde(skip)]
    #[derivative(PartialEq = "ignore")]
    outbox: Vec<PhysicsCommand>,
}

impl FieldState {
    pub fn new(config: SimConfig) -> FieldState {
        FieldState {
            info: MatchState::new(config.match_clock),
            elements: Vec::new(),
            registry: ScoringRegistry::with_capacity(config.registry_capacity),
            claw: Claw::new(config.claw),
            conversions: ConversionController::new(config.conversion_time),
            scheduler: Scheduler::new(),
            robot: Robot::new(config.drivetrain, config.arm, config.extension),
            score: 0,
            outbox: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
    pub fn registry(&self) -> &ScoringRegistry {
        &self.registry
    }
    pub fn claw(&self) -> &Claw {
        &self.claw
    }
    pub fn conversions(&self) -> &ConversionController {
        &self.conversions
    }
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
    pub fn robot(&self) -> &Robot {
        &self.robot
    }
    pub fn now(&self) -> Seconds {
        self.scheduler.now()
    }
    /// Score as of the end of the last tick.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Adds an element and returns its id. Ids are never reused.
    pub fn add_element(&mut self, role: Role, pose: Pose) -> ObjectId {
        let id = self.elements.len();
        self.elements.push(Some(ScoringElement::new(id, role, pose)));
        id
    }

    pub fn get_element(&self, id: ObjectId) -> Result<&ScoringElement> {
        match self.elements.get(id) {
            Some(Some(element)) => Ok(element),
            _ => Err(SimError::UnknownObject(id)),
        }
    }
    fn get_element_mut(&mut self, id: ObjectId) -> Result<&mut ScoringElement> {
        match self.elements.get_mut(id) {
            Some(Some(element)) => Ok(element),
            _ => Err(SimError::UnknownObject(id)),
        }
    }
    pub fn elements(&self) -> impl Iterator<Item = &ScoringElement> {
        self.elements.iter().flatten()
    }
    pub fn count_in_state(&self, state: ElementState) -> usize {
        self.elements().filter(|e| e.state() == state).count()
    }

    /// Pose reported back by the physics collaborator.
    pub fn set_pose(&mut self, id: ObjectId, pose: Pose) -> Result<()> {
        self.get_element_mut(id)?.pose = pose;
        Ok(())
    }

    pub fn commands(&self) -> &[PhysicsCommand] {
        &self.outbox
    }
    pub fn drain_commands(&mut self) -> Vec<PhysicsCommand> {
        std::mem::take(&mut self.outbox)
    }

    pub fn compute_score(&self) -> u32 {
        self.registry
            .compute_score(|id| self.get_element(id).ok().map(|e| e.role))
    }

    /// Closes the claw directly. Does nothing outside of a running match.
    pub fn close_claw(&mut self) -> Option<FieldEvent> {
        if !self.info.is_active() {
            return None;
        }
        let command = self.claw.request_close(&mut self.scheduler)?;
        self.outbox.push(command);
        Some(FieldEvent::Claw(ClawToggle::Closed))
    }
    pub fn open_claw(&mut self) -> Option<FieldEvent> {
        if !self.info.is_active() {
            return None;
        }
        let command = self.claw.request_open(&mut self.scheduler)?;
        self.outbox.push(command);
        Some(FieldEvent::Claw(ClawToggle::Opened))
    }

    /// Starts converting a sample. A conversion already running for the object is kept.
    pub fn begin_conversion(&mut self, object: ObjectId) -> Result<TaskHandle> {
        if !self.info.is_active() {
            return Err(SimError::MatchInactive(self.info.project_phase()));
        }
        let element = self.get_element_mut(object)?;
        element.expect_reacts_to(RegionTag::Observation)?;
        element.start_conversion();
        Ok(self.conversions.begin(object, &mut self.scheduler))
    }

    /// Stops the pending conversion of `object`, if any. Nothing is spawned or destroyed and
    /// the sample may convert again.
    pub fn cancel_conversion(&mut self, object: ObjectId) -> bool {
        if !self.conversions.cancel(object, &mut self.scheduler) {
            return false;
        }
        if let Ok(element) = self.get_element_mut(object) {
            element.reset_conversion();
        }
        true
    }

    /// Applies one enter/exit event from the physics collaborator.
    pub fn handle_contact(&mut self, event: ContactEvent) -> Result<Vec<FieldEvent>> {
        let mut events = Vec::new();
        let now = self.scheduler.now();
        let object = event.object;
        let region = event.region;
        let element = match self.elements.get_mut(object) {
            Some(Some(element)) => element,
            _ => return Err(SimError::UnknownObject(object)),
        };

        match (region.tag, event.kind) {
            (RegionTag::Basket, ContactKind::Enter) => {
                if let Some(change) = element.enter_basket(region, &mut self.registry)? {
                    events.push(FieldEvent::Element(change));
                }
            }
            (RegionTag::Basket, ContactKind::Exit) => {
                if let Some(change) = element.leave_basket(region, &mut self.registry) {
                    events.push(FieldEvent::Element(change));
                }
            }
            (RegionTag::Rung, ContactKind::Enter) => {
                let mut parking = PhysicsCommands::new();
                if let Some(change) = element.enter_rung(region, &mut self.registry, &mut parking)? {
                    self.outbox.extend(parking);
                    events.push(FieldEvent::Element(change));
                }
            }
            (RegionTag::Rung, ContactKind::Exit) => {
                if let Some(change) = element.leave_rung(region, &mut self.registry) {
                    events.push(FieldEvent::Element(change));
                }
            }
            (RegionTag::Observation, ContactKind::Enter) => {
                if element.role == Role::Sample && element.start_conversion() {
                    self.conversions.begin(object, &mut self.scheduler);
                    events.push(FieldEvent::ConversionStarted(object));
                }
            }
            (RegionTag::Observation, ContactKind::Exit) => {
                element.reset_conversion();
                if self.conversions.cancel(object, &mut self.scheduler) {
                    events.push(FieldEvent::ConversionCancelled(object));
                }
            }
            (RegionTag::Claw, ContactKind::Enter) => {
                if !element.is_grabbed() && self.claw.try_grab(object, now) {
                    element.set_grabbed();
                    self.outbox.push(PhysicsCommand::Reparent {
                        object,
                        parent: Attachment::Claw,
                    });
                    self.outbox.push(PhysicsCommand::SetKinematic {
                        object,
                        kinematic: true,
                    });
                    debug!(object, at = now, "grabbed");
                    events.push(FieldEvent::Grabbed(object));
                }
            }
            (RegionTag::Claw, ContactKind::Exit) => {}
        }
        Ok(events)
    }

    /// Advances the field by `dt` seconds, in the order given in the crate docs.
    pub fn tick(&mut self, dt: Seconds, input: &InputFrame, contacts: &[ContactEvent]) -> TickSummary {
        let mut summary = TickSummary::default();

        if let Some(change) = self.info.tick(dt) {
            summary.events.push(FieldEvent::Phase(change));
            if change == PhaseChange::Project(ProjectPhase::End) {
                self.robot.stop();
                self.outbox.push(PhysicsCommand::StopRobot);
            }
        }
        if !self.info.is_active() {
            if !contacts.is_empty() {
                debug!(count = contacts.len(), "contacts dropped outside of a match");
            }
            summary.time = self.now();
            summary.score = self.score;
            return summary;
        }

        for task in self.scheduler.advance(dt) {
            self.run_task(task, &mut summary);
        }

        let camera = self.info.select_camera(input.dpad_1);
        if let Some((toggle, command)) = self.claw.update(input, &mut self.scheduler) {
            self.outbox.push(command);
            summary.events.push(FieldEvent::Claw(toggle));
        }
        self.robot.update(input, camera, dt);

        for contact in contacts {
            match self.handle_contact(*contact) {
                Ok(events) => summary.events.extend(events),
                Err(err) => {
                    warn!(?contact, %err, "contact rejected");
                    summary.errors.push(err);
                }
            }
        }

        self.upkeep(&mut summary);

        self.score = self.compute_score();
        summary.time = self.now();
        summary.score = self.score;
        summary
    }

    fn run_task(&mut self, task: ScheduledTask, summary: &mut TickSummary) {
        match task.kind {
            TaskKind::ClawCooldown => self.claw.finish_cooldown(),
            TaskKind::ConvertToSpecimen(sample) => {
                if !self.conversions.complete(sample, task.handle) {
                    debug!(sample, "stale conversion ignored");
                    return;
                }
                if let Some(specimen) = self.convert(sample) {
                    summary.events.push(FieldEvent::Converted { sample, specimen });
                }
            }
        }
    }

    /// Replaces a sample by a fresh specimen at the same pose.
    fn convert(&mut self, sample: ObjectId) -> Option<ObjectId> {
        let old = self.elements.get_mut(sample)?.take()?;
        self.registry.release(sample);
        self.claw.forget(sample);

        let specimen = self.add_element(Role::Specimen, old.pose);
        self.outbox.push(PhysicsCommand::Destroy { object: sample });
        self.outbox.push(PhysicsCommand::Spawn {
            object: specimen,
            role: Role::Specimen,
            pose: old.pose,
        });
        info!(sample, specimen, "sample converted to specimen");
        Some(specimen)
    }

    fn upkeep(&mut self, summary: &mut TickSummary) {
        for object in self.claw.release_all() {
            if let Ok(element) = self.get_element_mut(object) {
                element.set_released();
                self.outbox.push(PhysicsCommand::Reparent {
                    object,
                    parent: Attachment::Free,
                });
                self.outbox.push(PhysicsCommand::SetKinematic {
                    object,
                    kinematic: false,
                });
                summary.events.push(FieldEvent::Released(object));
            }
        }
        let hanging: Vec<PhysicsCommand> = self
            .elements()
            .filter(|e| e.is_hanging())
            .map(|e| PhysicsCommand::ZeroLinearVelocity { object: e.id })
            .collect();
        self.outbox.extend(hanging);
    }
}

/// Builds a field with elements placed up front, for tests and demos.
pub struct FieldStateBuilder {
    config: SimConfig,
    samples: Vec<Pose>,
    specimens: Vec<Pose>,
    phase: ProjectPhase,
}

impl FieldStateBuilder {
    pub fn new() -> FieldStateBuilder {
        FieldStateBuilder {
            config: SimConfig::default(),
            samples: Vec::new(),
            specimens: Vec::new(),
            phase: ProjectPhase::Game,
        }
    }
    pub fn set_config(&mut self, config: SimConfig) -> &mut FieldStateBuilder {
        self.config = config;
        self
    }
    pub fn add_sample(&mut self, pose: Pose) -> &mut FieldStateBuilder {
        self.samples.push(pose);
        self
    }
    pub fn add_samples(&mut self, count: usize) -> &mut FieldStateBuilder {
        for i in 0..count {
            self.samples.push(Pose::at(i as f32 * 0.1, 0.0, 0.0));
        }
        self
    }
    pub fn add_specimen(&mut self, pose: Pose) -> &mut FieldStateBuilder {
        self.specimens.push(pose);
        self
    }
    pub fn add_specimens(&mut self, count: usize) -> &mut FieldStateBuilder {
        for i in 0..count {
            self.specimens.push(Pose::at(i as f32 * 0.1, 0.0, 1.0));
        }
        self
    }
    pub fn set_phase(&mut self, phase: ProjectPhase) -> &mut FieldStateBuilder {
        self.phase = phase;
        self
    }

    /// Samples get the lowest ids, in insertion order, followed by specimens.
    pub fn build(&mut self) -> FieldState {
        let mut state = FieldState::new(self.config);
        for pose in &self.samples {
            state.add_element(Role::Sample, *pose);
        }
        for pose in &self.specimens {
            state.add_element(Role::Specimen, *pose);
        }
        match self.phase {
            ProjectPhase::Menu => state.info.load_menu(),
            ProjectPhase::Server => state.info.load_server(),
            ProjectPhase::Settings => state.info.load_settings(),
            ProjectPhase::Game => state.info.load_game(),
            ProjectPhase::End => state.info.load_end(),
        }
        state
    }
}

impl Default for FieldStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod fieldstate_tests {
    use super::*;

    const DT: Seconds = 0.02;

    fn tick_with(state: &mut FieldState, contacts: &[ContactEvent]) -> TickSummary {
        state.tick(DT, &InputFrame::idle(), contacts)
    }

    #[test]
    fn basket_contact_scores_and_unscores() {
        let mut state = FieldStateBuilder::new().add_samples(2).build();
        let basket = Region::basket(0);

        let summary = tick_with(
            &mut state,
            &[ContactEvent::enter(0, basket), ContactEvent::enter(1, basket)],
        );
        assert_eq!(summary.score, 2 * SAMPLE_POINTS);
        assert_eq!(state.count_in_state(ElementState::SampleClaimed), 2);

        let summary = tick_with(&mut state, &[ContactEvent::exit(0, basket)]);
        assert_eq!(summary.score, SAMPLE_POINTS);
        assert_eq!(state.get_element(0).unwrap().state(), ElementState::SampleFree);
    }

    #[test]
    fn nothing_happens_outside_game() {
        let mut state = FieldStateBuilder::new()
            .add_samples(1)
            .set_phase(ProjectPhase::Menu)
            .build();
        let summary = tick_with(&mut state, &[ContactEvent::enter(0, Region::basket(0))]);
        assert_eq!(summary.score, 0);
        assert_eq!(state.now(), 0.0);
        assert_eq!(state.registry().occupied_count(), 0);
    }

    #[test]
    fn wrong_role_contacts_are_ignored() {
        let mut state = FieldStateBuilder::new().add_samples(1).add_specimens(1).build();
        let summary = tick_with(
            &mut state,
            &[
                ContactEvent::enter(0, Region::rung(0)),
                ContactEvent::enter(1, Region::basket(0)),
                ContactEvent::enter(1, Region::observation(0)),
            ],
        );
        assert!(summary.events.is_empty());
        assert!(summary.errors.is_empty());
        assert_eq!(state.conversions().pending_count(), 0);
    }

    #[test]
    fn unknown_object_is_reported_not_fatal() {
        let mut state = FieldStateBuilder::new().add_samples(1).build();
        let summary = tick_with(
            &mut state,
            &[ContactEvent::enter(7, Region::basket(0)), ContactEvent::enter(0, Region::basket(0))],
        );
        assert_eq!(summary.errors, vec![SimError::UnknownObject(7)]);
        assert_eq!(summary.score, SAMPLE_POINTS);
    }

    #[test]
    fn conversion_replaces_sample() {
        let mut state = FieldStateBuilder::new().add_sample(Pose::at(1.0, 2.0, 3.0)).build();
        let summary = tick_with(&mut state, &[ContactEvent::enter(0, Region::observation(0))]);
        assert_eq!(summary.events, vec![FieldEvent::ConversionStarted(0)]);
        state.drain_commands();

        let summary = state.tick(3.0, &InputFrame::idle(), &[]);
        assert_eq!(summary.events, vec![FieldEvent::Converted { sample: 0, specimen: 1 }]);
        assert_eq!(state.get_element(0), Err(SimError::UnknownObject(0)));

        let specimen = state.get_element(1).unwrap();
        assert_eq!(specimen.state(), ElementState::SpecimenFree);
        assert_eq!(specimen.pose, Pose::at(1.0, 2.0, 3.0));
        assert_eq!(
            state.drain_commands(),
            vec![
                PhysicsCommand::Destroy { object: 0 },
                PhysicsCommand::Spawn {
                    object: 1,
                    role: Role::Specimen,
                    pose: Pose::at(1.0, 2.0, 3.0)
                }
            ]
        );
    }

    #[test]
    fn begin_conversion_rejects_specimens() {
        let mut state = FieldStateBuilder::new().add_specimens(1).build();
        assert!(matches!(
            state.begin_conversion(0),
            Err(SimError::InvalidTransition {
                object: 0,
                state: ElementState::SpecimenFree,
                region: RegionTag::Observation
            })
        ));
        assert_eq!(state.begin_conversion(3), Err(SimError::UnknownObject(3)));
    }

    #[test]
    fn direct_controls_ignored_outside_a_match() {
        let mut state = FieldStateBuilder::new()
            .add_samples(1)
            .set_phase(ProjectPhase::Menu)
            .build();
        assert_eq!(state.close_claw(), None);
        assert_eq!(state.open_claw(), None);
        assert_eq!(
            state.begin_conversion(0),
            Err(SimError::MatchInactive(ProjectPhase::Menu))
        );
        assert_eq!(state.scheduler().pending().count(), 0);
        assert!(state.get_element(0).unwrap().can_convert());
        assert!(state.commands().is_empty());
    }

    #[test]
    fn grabbed_object_released_when_claw_opens() {
        let mut state = FieldStateBuilder::new().add_samples(1).build();
        let close = InputFrame {
            a_button_2: 1.0,
            ..Default::default()
        };
        let summary = state.tick(DT, &close, &[ContactEvent::enter(0, Region::claw())]);
        assert!(summary.events.contains(&FieldEvent::Grabbed(0)));
        let sample = state.get_element(0).unwrap();
        assert!(sample.is_grabbed());
        assert!(sample.is_kinematic());

        // cooldown has to run out before the claw opens again
        let open = InputFrame {
            x_button_2: 1.0,
            ..Default::default()
        };
        let summary = state.tick(DT, &open, &[]);
        assert!(!summary.events.contains(&FieldEvent::Released(0)));
        state.tick(0.5, &InputFrame::idle(), &[]);
        let summary = state.tick(DT, &open, &[]);
        assert!(summary.events.contains(&FieldEvent::Released(0)));
        let sample = state.get_element(0).unwrap();
        assert_eq!(sample.attachment(), Attachment::Free);
        assert!(!sample.is_kinematic());
    }

    #[test]
    fn hanging_specimens_are_held_still() {
        let mut state = FieldStateBuilder::new().add_specimens(1).build();
        tick_with(&mut state, &[ContactEvent::enter(0, Region::rung(2))]);
        state.drain_commands();
        tick_with(&mut state, &[]);
        assert_eq!(state.drain_commands(), vec![PhysicsCommand::ZeroLinearVelocity { object: 0 }]);
    }

    #[test]
    fn match_end_stops_robot() {
        let mut state = FieldStateBuilder::new().build();
        let mut stopped = false;
        for _ in 0..400 {
            let summary = state.tick(1.0, &InputFrame::idle(), &[]);
            if summary.events.contains(&FieldEvent::Phase(PhaseChange::Project(ProjectPhase::End))) {
                stopped = true;
                break;
            }
        }
        assert!(stopped);
        assert!(state.commands().contains(&PhysicsCommand::StopRobot));
        assert!(state.info.is_over());
    }

    #[test]
    fn state_survives_json() {
        let mut state = FieldStateBuilder::new().add_samples(2).add_specimens(1).build();
        state.tick(
            0.5,
            &InputFrame::idle(),
            &[ContactEvent::enter(0, Region::basket(0)), ContactEvent::enter(2, Region::rung(0))],
        );
        let json = serde_json::to_string(&state).unwrap();
        let restored: FieldState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
        assert_eq!(restored.score(), SAMPLE_POINTS + SPECIMEN_POINTS);
    }
}
