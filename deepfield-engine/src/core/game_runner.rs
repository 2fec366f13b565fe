use std::{fs, io::Write, path::Path, path::PathBuf};

use json_patch::Patch;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::drivers::{Driver, RandomDriver};

use super::{
    config::SimConfig,
    fieldstate::{FieldState, TickSummary},
    model::{PhysicsCommand, Seconds},
    sim_errors::StorageError,
};

/// Fixed step used when none is configured.
pub const DEFAULT_DT: Seconds = 1.0 / 64.0;

pub trait SimRunner {
    fn step(&mut self) -> Result<(), StorageError>;
    fn match_over(&self) -> bool;
    fn get_state(&self) -> &FieldState;
    fn get_state_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string(self.get_state())?)
    }
}

pub struct DriverSimRunner {
    pub driver: Box<dyn Driver>,
    state: FieldState,
    dt: Seconds,
    save_file: Option<PathBuf>,
    recorder: Option<Recorder>,
    last_summary: TickSummary,
    last_commands: Vec<PhysicsCommand>,
}

impl SimRunner for DriverSimRunner {
    fn step(&mut self) -> Result<(), StorageError> {
        if self.save_file.is_some() && self.recorder.is_none() {
            self.recorder = Some(Recorder::start(&self.state)?);
        }

        let frame = self.driver.next_frame(&self.state);
        self.last_summary = self.state.tick(self.dt, &frame.input, &frame.contacts);
        self.last_commands = self.state.drain_commands();

        if let Some(recorder) = &mut self.recorder {
            recorder.push(&self.state)?;
        }
        Ok(())
    }
    fn match_over(&self) -> bool {
        self.state.info.is_over()
    }
    fn get_state(&self) -> &FieldState {
        &self.state
    }
}

impl DriverSimRunner {
    /// Steps until the match is over and returns the final score.
    pub fn run(&mut self) -> Result<u32, StorageError> {
        while !self.match_over() {
            self.step()?;
        }
        info!(score = self.state.score(), time = self.state.now(), "match finished");
        Ok(self.state.score())
    }
    pub fn dt(&self) -> Seconds {
        self.dt
    }
    pub fn state_mut(&mut self) -> &mut FieldState {
        &mut self.state
    }
    pub fn last_summary(&self) -> &TickSummary {
        &self.last_summary
    }
    /// Physics commands issued by the last step.
    pub fn last_commands(&self) -> &[PhysicsCommand] {
        &self.last_commands
    }
    pub fn save_to_file(&self) -> Result<(), StorageError> {
        let (Some(file), Some(recorder)) = (&self.save_file, &self.recorder) else {
            return Ok(());
        };
        recorder.recording.to_file(file)
    }
}

struct Recorder {
    recording: Recording,
    last: Value,
}

impl Recorder {
    fn start(state: &FieldState) -> Result<Recorder, StorageError> {
        let initial = serde_json::to_value(state)?;
        Ok(Recorder {
            recording: Recording {
                initial: initial.clone(),
                patches: Vec::new(),
            },
            last: initial,
        })
    }
    fn push(&mut self, state: &FieldState) -> Result<(), StorageError> {
        let next = serde_json::to_value(state)?;
        self.recording.patches.push(json_patch::diff(&self.last, &next));
        self.last = next;
        Ok(())
    }
}

/// A recorded match: the first state and one JSON patch per step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    initial: Value,
    patches: Vec<Patch>,
}

impl Recording {
    pub fn len(&self) -> usize {
        self.patches.len()
    }
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
    pub fn to_file<P: AsRef<Path>>(&self, file: P) -> Result<(), StorageError> {
        let json_str = serde_json::to_string(&self)?;
        let mut file = fs::File::create(file)?;
        file.write_all(json_str.as_bytes())?;
        Ok(())
    }
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Recording, StorageError> {
        let json_str = fs::read_to_string(file)?;
        Ok(serde_json::from_str(&json_str)?)
    }
    pub fn replay(self) -> Result<Replay, StorageError> {
        if self.initial.is_null() {
            return Err(StorageError::Empty);
        }
        let state = serde_json::from_value(self.initial.clone())?;
        Ok(Replay {
            doc: self.initial.clone(),
            recording: self,
            current: 0,
            state,
        })
    }
}

/// Plays a recording back one patch per step.
pub struct Replay {
    recording: Recording,
    doc: Value,
    current: usize,
    state: FieldState,
}

impl SimRunner for Replay {
    fn step(&mut self) -> Result<(), StorageError> {
        let Some(patch) = self.recording.patches.get(self.current) else {
            return Ok(());
        };
        json_patch::patch(&mut self.doc, &patch.0)?;
        self.state = serde_json::from_value(self.doc.clone())?;
        self.current += 1;
        debug!(step = self.current, "replayed step");
        Ok(())
    }
    fn match_over(&self) -> bool {
        self.current >= self.recording.patches.len()
    }
    fn get_state(&self) -> &FieldState {
        &self.state
    }
}

#[derive(Default)]
pub struct DriverSimRunnerBuilder {
    driver: Option<Box<dyn Driver>>,
    state: Option<FieldState>,
    config: Option<SimConfig>,
    dt: Option<Seconds>,
    replay_file: Option<PathBuf>,
}

impl DriverSimRunnerBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_driver(mut self, driver: Box<dyn Driver>) -> Self {
        self.driver = Some(driver);
        self
    }
    /// Starts from `state` instead of the standard field.
    pub fn set_state(mut self, state: FieldState) -> Self {
        self.state = Some(state);
        self
    }
    pub fn set_config(mut self, config: SimConfig) -> Self {
        self.config = Some(config);
        self
    }
    pub fn set_dt(mut self, dt: Seconds) -> Self {
        self.dt = Some(dt);
        self
    }
    pub fn set_replay_file<P: AsRef<Path>>(mut self, file: P) -> Self {
        self.replay_file = Some(file.as_ref().to_path_buf());
        self
    }
    pub fn build(self) -> DriverSimRunner {
        let config = self.config.unwrap_or_default();
        let state = self
            .state
            .unwrap_or_else(|| crate::standard_field(config));
        DriverSimRunner {
            driver: self
                .driver
                .unwrap_or_else(|| Box::new(RandomDriver::new())),
            state,
            dt: self.dt.filter(|dt| *dt > 0.0).unwrap_or(DEFAULT_DT),
            save_file: self.replay_file,
            recorder: None,
            last_summary: TickSummary::default(),
            last_commands: Vec::new(),
        }
    }
}

#[cfg(test)]
mod game_runner_tests {
    use super::*;
    use crate::drivers::RandomDriver;

    #[test]
    fn save_and_replay_match() -> Result<(), StorageError> {
        let file = std::env::temp_dir().join("deepfield_save_and_replay.json");
        let mut runner = DriverSimRunnerBuilder::new()
            .set_driver(Box::new(RandomDriver::with_seed(7)))
            .set_dt(0.25)
            .set_replay_file(&file)
            .build();

        let mut intermediate_states: Vec<FieldState> = vec![runner.get_state().clone()];
        while !runner.match_over() {
            runner.step()?;
            intermediate_states.push(runner.get_state().clone());
        }
        runner.save_to_file()?;

        let mut replay = Recording::from_file(&file)?.replay()?;
        for state in intermediate_states.iter() {
            assert_eq!(*state, *replay.get_state());
            replay.step()?;
        }
        assert!(replay.match_over());
        std::fs::remove_file(&file)?;
        Ok(())
    }

    #[test]
    fn empty_recording_is_rejected() {
        let recording: Recording =
            serde_json::from_str(r#"{"initial": null, "patches": []}"#).unwrap();
        assert!(matches!(recording.replay(), Err(StorageError::Empty)));
    }

    #[test]
    fn runner_without_file_records_nothing() -> Result<(), StorageError> {
        let mut runner = DriverSimRunnerBuilder::new().set_dt(1.0).build();
        runner.step()?;
        assert!(runner.recorder.is_none());
        runner.save_to_file()?;
        assert_eq!(runner.dt(), 1.0);
        Ok(())
    }
}
