use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use super::config::MatchClockConfig;
use super::input::Axis2;
use super::model::{Seconds, INPUT_THRESHOLD};

/// Which screen the simulator is on. Robot control only runs in `Game`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectPhase {
    Menu,
    Server,
    Settings,
    Game,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    Autonomous,
    Between,
    Teleop,
    Over,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraView {
    #[default]
    Driver,
    TopDown,
    Robot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseChange {
    Project(ProjectPhase),
    Game(GamePhase),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    clock: MatchClockConfig,
    project: ProjectPhase,
    game: GamePhase,
    timer: Seconds,
    between_timer: Seconds,
    camera: CameraView,
    audio_on: bool,
    extras_on: bool,
}

impl MatchState {
    pub fn new(clock: MatchClockConfig) -> MatchState {
        MatchState {
            clock,
            project: ProjectPhase::Menu,
            game: GamePhase::Autonomous,
            timer: clock.match_length,
            between_timer: clock.between_length,
            camera: CameraView::default(),
            audio_on: true,
            extras_on: false,
        }
    }

    pub fn project_phase(&self) -> ProjectPhase {
        self.project
    }
    pub fn game_phase(&self) -> GamePhase {
        self.game
    }
    pub fn timer(&self) -> Seconds {
        self.timer
    }
    pub fn between_timer(&self) -> Seconds {
        self.between_timer
    }
    pub fn camera(&self) -> CameraView {
        self.camera
    }
    pub fn audio_on(&self) -> bool {
        self.audio_on
    }
    pub fn extras_on(&self) -> bool {
        self.extras_on
    }
    pub fn is_active(&self) -> bool {
        self.project == ProjectPhase::Game
    }
    pub fn is_over(&self) -> bool {
        self.project == ProjectPhase::End
    }
    pub fn shows_score(&self) -> bool {
        self.is_active() && matches!(self.game, GamePhase::Autonomous | GamePhase::Teleop)
    }

    pub fn load_menu(&mut self) {
        self.set_project(ProjectPhase::Menu);
    }
    pub fn load_server(&mut self) {
        self.set_project(ProjectPhase::Server);
    }
    pub fn load_settings(&mut self) {
        self.set_project(ProjectPhase::Settings);
    }
    /// Resets both clocks and starts the autonomous period.
    pub fn load_game(&mut self) {
        self.timer = self.clock.match_length;
        self.between_timer = self.clock.between_length;
        self.game = GamePhase::Autonomous;
        self.set_project(ProjectPhase::Game);
    }
    pub fn load_end(&mut self) {
        self.set_project(ProjectPhase::End);
    }

    fn set_project(&mut self, phase: ProjectPhase) {
        if self.project != phase {
            info!(from = ?self.project, to = ?phase, "project phase changed");
        }
        self.project = phase;
    }
    fn set_game(&mut self, phase: GamePhase) -> Option<PhaseChange> {
        info!(from = ?self.game, to = ?phase, timer = self.timer, "game phase changed");
        self.game = phase;
        Some(PhaseChange::Game(phase))
    }

    pub fn toggle_audio(&mut self) -> bool {
        self.audio_on = !self.audio_on;
        self.audio_on
    }
    pub fn toggle_extras(&mut self) -> bool {
        self.extras_on = !self.extras_on;
        self.extras_on
    }

    /// D-pad up picks the driver view, right the top-down view, down the on-robot view.
    pub fn select_camera(&mut self, dpad: Axis2) -> CameraView {
        if dpad.y > INPUT_THRESHOLD {
            self.camera = CameraView::Driver;
        } else if dpad.x > INPUT_THRESHOLD {
            self.camera = CameraView::TopDown;
        } else if dpad.y < -INPUT_THRESHOLD {
            self.camera = CameraView::Robot;
        }
        self.camera
    }

    /// Advances the active clock by `dt` and applies at most one phase transition.
    pub fn tick(&mut self, dt: Seconds) -> Option<PhaseChange> {
        if !self.is_active() {
            return None;
        }
        match self.game {
            GamePhase::Autonomous => {
                self.timer -= dt;
                if self.timer.trunc() <= self.clock.teleop_start {
                    return self.set_game(GamePhase::Between);
                }
            }
            GamePhase::Between => {
                self.between_timer -= dt;
                if self.between_timer <= 0.0 {
                    return self.set_game(GamePhase::Teleop);
                }
            }
            GamePhase::Teleop => {
                self.timer -= dt;
                if self.timer < 0.0 {
                    return self.set_game(GamePhase::Over);
                }
            }
            GamePhase::Over => {
                self.load_end();
                return Some(PhaseChange::Project(ProjectPhase::End));
            }
        }
        None
    }

    /// The clock the driver sees: the between clock during the break, the match clock otherwise.
    pub fn display_time(&self) -> ClockDisplay {
        let active = match self.game {
            GamePhase::Between => self.between_timer,
            _ => self.timer,
        };
        ClockDisplay(active.max(0.0).trunc() as u32)
    }
}

/// Whole seconds rendered as `m:ss`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockDisplay(pub u32);

impl fmt::Display for ClockDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.0 / 60, self.0 % 60)
    }
}

#[cfg(test)]
mod match_state_tests {
    use super::*;

    fn started() -> MatchState {
        let mut state = MatchState::new(MatchClockConfig::default());
        state.load_game();
        state
    }

    #[test]
    fn clock_only_runs_in_game() {
        let mut state = MatchState::new(MatchClockConfig::default());
        assert_eq!(state.project_phase(), ProjectPhase::Menu);
        assert!(state.tick(50.0).is_none());
        assert_eq!(state.timer(), 150.0);
    }

    #[test]
    fn full_match_walks_every_phase() {
        let mut state = started();
        assert!(state.shows_score());

        assert!(state.tick(29.0).is_none());
        assert_eq!(state.tick(0.5), Some(PhaseChange::Game(GamePhase::Between)));
        assert!(!state.shows_score());
        assert_eq!(state.display_time().to_string(), "0:10");

        assert!(state.tick(9.0).is_none());
        assert_eq!(state.tick(1.0), Some(PhaseChange::Game(GamePhase::Teleop)));
        assert_eq!(state.display_time().to_string(), "2:00");

        assert!(state.tick(120.0).is_none());
        assert_eq!(state.tick(0.6), Some(PhaseChange::Game(GamePhase::Over)));
        assert_eq!(state.tick(0.1), Some(PhaseChange::Project(ProjectPhase::End)));
        assert!(state.is_over());
        assert!(state.tick(1.0).is_none());
    }

    #[test]
    fn large_step_still_leaves_autonomous() {
        let mut state = started();
        assert_eq!(state.tick(45.0), Some(PhaseChange::Game(GamePhase::Between)));
    }

    #[test]
    fn display_pads_seconds() {
        assert_eq!(ClockDisplay(129).to_string(), "2:09");
        assert_eq!(ClockDisplay(5).to_string(), "0:05");
        assert_eq!(ClockDisplay(150).to_string(), "2:30");
    }

    #[test]
    fn dpad_picks_camera() {
        let mut state = started();
        assert_eq!(state.select_camera(Axis2::new(1.0, 0.0)), CameraView::TopDown);
        assert_eq!(state.select_camera(Axis2::default()), CameraView::TopDown);
        assert_eq!(state.select_camera(Axis2::new(0.0, -1.0)), CameraView::Robot);
        assert_eq!(state.select_camera(Axis2::new(1.0, 1.0)), CameraView::Driver);
    }

    #[test]
    fn settings_toggles() {
        let mut state = MatchState::new(MatchClockConfig::default());
        state.load_settings();
        assert!(!state.toggle_audio());
        assert!(state.toggle_extras());
        state.load_menu();
        assert!(!state.audio_on());
        assert!(state.extras_on());
    }
}
