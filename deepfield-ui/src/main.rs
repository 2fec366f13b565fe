use std::{
    collections::VecDeque,
    fs::File,
    io::{self, Stdout},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use deepfield_engine::{
    core::{
        config::SimConfig,
        fieldstate::FieldState,
        input::Axis2,
        match_state::ProjectPhase,
        model::{ContactEvent, Region, Seconds},
    },
    drivers::{Driver, DriverFrame, RandomDriver},
    standard_field,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    text::Line,
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame, Terminal,
};
use tracing::{info, warn};

mod element_drawings;

use element_drawings::{element_row, event_text, status_line};

type Term = Terminal<CrosstermBackend<Stdout>>;

const EVENT_LOG_LEN: usize = 12;

#[derive(Parser, Debug)]
#[command(version, about = "Terminal front end for the field simulator")]
struct Cli {
    /// JSON file with simulator tunables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs to this file (the terminal is taken by the UI)
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// Seed for the autopilot
    #[arg(short, long)]
    seed: Option<u64>,

    /// Let a random driver play instead of the keyboard
    #[arg(short, long)]
    autopilot: bool,

    /// Seconds per tick
    #[arg(long, default_value_t = 1.0 / 30.0)]
    dt: Seconds,
}

struct App {
    config: SimConfig,
    state: FieldState,
    autopilot: Option<RandomDriver>,
    next_frame: DriverFrame,
    selected: usize,
    events: VecDeque<String>,
    quit: bool,
}

impl App {
    fn new(config: SimConfig, autopilot: Option<RandomDriver>) -> App {
        let mut state = standard_field(config);
        state.info.load_menu();
        App {
            config,
            state,
            autopilot,
            next_frame: DriverFrame::default(),
            selected: 0,
            events: VecDeque::new(),
            quit: false,
        }
    }

    fn restart(&mut self) {
        self.state = standard_field(self.config);
        self.selected = 0;
        self.events.clear();
    }

    fn log_event(&mut self, text: String) {
        if self.events.len() == EVENT_LOG_LEN {
            self.events.pop_front();
        }
        self.events.push_back(text);
    }

    fn select_next(&mut self) {
        let ids: Vec<usize> = self.state.elements().map(|e| e.id).collect();
        self.selected = ids
            .iter()
            .copied()
            .find(|id| *id > self.selected)
            .or_else(|| ids.first().copied())
            .unwrap_or(0);
    }

    fn touch(&mut self, contact: fn(usize, Region) -> ContactEvent, region: Region) {
        self.next_frame.contacts.push(contact(self.selected, region));
    }

    fn on_key(&mut self, code: KeyCode) {
        if code == KeyCode::Esc {
            self.quit = true;
            return;
        }
        match self.state.info.project_phase() {
            ProjectPhase::Game => self.on_game_key(code),
            ProjectPhase::Settings => match code {
                KeyCode::Char('a') => {
                    self.state.info.toggle_audio();
                }
                KeyCode::Char('e') => {
                    self.state.info.toggle_extras();
                }
                KeyCode::Backspace => self.state.info.load_menu(),
                _ => (),
            },
            ProjectPhase::End => match code {
                KeyCode::Enter => self.restart(),
                KeyCode::Backspace => self.state.info.load_menu(),
                _ => (),
            },
            ProjectPhase::Menu | ProjectPhase::Server => match code {
                KeyCode::Enter => self.restart(),
                KeyCode::F(2) => self.state.info.load_settings(),
                KeyCode::F(3) => self.state.info.load_server(),
                KeyCode::Backspace => self.state.info.load_menu(),
                _ => (),
            },
        }
    }

    /// A terminal can't report held keys, so every press is a full deflection for one tick.
    fn on_game_key(&mut self, code: KeyCode) {
        let input = &mut self.next_frame.input;
        match code {
            KeyCode::Char('w') => input.left_stick_1.x = 1.0,
            KeyCode::Char('s') => input.left_stick_1.x = -1.0,
            KeyCode::Char('a') => input.left_stick_1.y = -1.0,
            KeyCode::Char('d') => input.left_stick_1.y = 1.0,
            KeyCode::Char('q') => input.right_stick_1.x = -1.0,
            KeyCode::Char('e') => input.right_stick_1.x = 1.0,
            KeyCode::Char('[') => input.left_bumper_1 = 1.0,
            KeyCode::Char(']') => input.right_bumper_1 = 1.0,
            KeyCode::Up => input.dpad_1 = Axis2::new(0.0, 1.0),
            KeyCode::Right => input.dpad_1 = Axis2::new(1.0, 0.0),
            KeyCode::Down => input.dpad_1 = Axis2::new(0.0, -1.0),
            KeyCode::Char('c') => input.a_button_2 = 1.0,
            KeyCode::Char('o') => input.x_button_2 = 1.0,
            KeyCode::Char('r') => input.left_trigger_2 = 1.0,
            KeyCode::Char('f') => input.right_trigger_2 = 1.0,
            KeyCode::Char('t') => input.right_stick_2.y = 1.0,
            KeyCode::Char('g') => input.right_stick_2.y = -1.0,
            KeyCode::Tab => self.select_next(),
            KeyCode::Char('1') => self.touch(ContactEvent::enter, Region::basket(0)),
            KeyCode::Char('!') => self.touch(ContactEvent::exit, Region::basket(0)),
            KeyCode::Char('2') => self.touch(ContactEvent::enter, Region::rung(0)),
            KeyCode::Char('@') => self.touch(ContactEvent::exit, Region::rung(0)),
            KeyCode::Char('3') => self.touch(ContactEvent::enter, Region::observation(0)),
            KeyCode::Char('#') => self.touch(ContactEvent::exit, Region::observation(0)),
            KeyCode::Char('4') => self.touch(ContactEvent::enter, Region::claw()),
            _ => (),
        }
    }

    fn step(&mut self, dt: Seconds) {
        let frame = match &mut self.autopilot {
            Some(driver) if self.state.info.is_active() => driver.next_frame(&self.state),
            _ => std::mem::take(&mut self.next_frame),
        };
        let summary = self.state.tick(dt, &frame.input, &frame.contacts);
        // no physics engine behind the terminal, commands are only counted
        let commands = self.state.drain_commands();
        if !commands.is_empty() {
            tracing::debug!(count = commands.len(), "physics commands issued");
        }
        for event in &summary.events {
            self.log_event(event_text(event));
        }
        for err in &summary.errors {
            self.log_event(format!("! {}", err));
        }
    }
}

fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(EVENT_LOG_LEN as u16 + 2),
            Constraint::Length(3),
        ])
        .split(f.size());
    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[1]);

    let status = Paragraph::new(status_line(&app.state))
        .block(Block::default().borders(Borders::ALL).title("deepfield"));
    f.render_widget(status, rows[0]);

    let element_rows: Vec<Row> = app
        .state
        .elements()
        .map(|e| element_row(e, &app.state, e.id == app.selected))
        .collect();
    let widths = [
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(16),
        Constraint::Length(5),
        Constraint::Length(8),
        Constraint::Length(6),
    ];
    let table = Table::new(element_rows, widths)
        .header(Row::new(vec!["id", "", "state", "slot", "parent", "conv"]))
        .block(Block::default().borders(Borders::ALL).title("elements"));
    f.render_widget(table, middle[0]);

    let robot = app.state.robot();
    let claw = app.state.claw();
    let robot_lines = vec![
        Line::from(format!(
            "pos  {:>6.2} {:>6.2}",
            robot.drivetrain.position()[0],
            robot.drivetrain.position()[1]
        )),
        Line::from(format!("head {:>6.1}°", robot.drivetrain.heading())),
        Line::from(format!("gear {:>6.2}", robot.drivetrain.speed_scalar())),
        Line::from(format!("arm  {:>6.1}°", robot.arm.angle())),
        Line::from(format!("ext  {:>6.0} ticks", robot.extension.ticks())),
        Line::from(format!(
            "claw {}{}",
            if claw.is_open() { "open" } else { "closed" },
            if claw.can_toggle() { "" } else { " (cooldown)" }
        )),
        Line::from(format!("held {:?}", claw.grabbed())),
        Line::from(format!(
            "audio {} extras {}",
            app.state.info.audio_on(),
            app.state.info.extras_on()
        )),
    ];
    let robot_panel =
        Paragraph::new(robot_lines).block(Block::default().borders(Borders::ALL).title("robot"));
    f.render_widget(robot_panel, middle[1]);

    let event_lines: Vec<Line> = app.events.iter().map(|e| Line::from(e.as_str())).collect();
    let log = Paragraph::new(event_lines).block(Block::default().borders(Borders::ALL).title("events"));
    f.render_widget(log, rows[2]);

    let help = match app.state.info.project_phase() {
        ProjectPhase::Game => "wasd drive  q/e turn  [/] gear  c/o claw  r/f arm  t/g extend  arrows cam  tab select  1-4 touch (shift leaves)  esc quit",
        ProjectPhase::Settings => "a audio  e extras  backspace menu  esc quit",
        ProjectPhase::End => "enter play again  backspace menu  esc quit",
        _ => "enter play  F2 settings  F3 server  esc quit",
    };
    let help = Paragraph::new(help).block(Block::default().borders(Borders::ALL));
    f.render_widget(help, rows[3]);
}

/// Falls back to 1/30 s unless `requested` is a finite positive length.
fn tick_length(requested: Seconds) -> Seconds {
    if requested.is_finite() && requested > 0.0 {
        requested
    } else {
        warn!(dt = requested, "tick length must be finite and positive, using 1/30 s");
        1.0 / 30.0
    }
}

fn run(terminal: &mut Term, app: &mut App, dt: Seconds) -> io::Result<()> {
    let tick_rate = Duration::from_secs_f64(dt);
    let mut last_tick = Instant::now();
    while !app.quit {
        terminal.draw(|f| draw(f, app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key.code);
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            app.step(dt);
            last_tick = Instant::now();
        }
    }
    Ok(())
}

fn init_logging(path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log {
        init_logging(path)?;
    }

    let config = match &cli.config {
        Some(path) => SimConfig::from_file(path)?,
        None => SimConfig::default(),
    };
    let autopilot = cli.autopilot.then(|| match cli.seed {
        Some(seed) => RandomDriver::with_seed(seed),
        None => RandomDriver::new(),
    });
    let dt = tick_length(cli.dt);
    info!(?config, autopilot = cli.autopilot, dt, "starting");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut app = App::new(config, autopilot);
    let result = run(&mut terminal, &mut app, dt);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    info!(score = app.state.score(), "bye");
    Ok(())
}

#[cfg(test)]
mod main_tests {
    use super::*;

    #[test]
    fn tick_length_rejects_unusable_values() {
        assert_eq!(tick_length(0.25), 0.25);
        for bad in [0.0, -1.0, Seconds::INFINITY, Seconds::NAN] {
            assert_eq!(tick_length(bad), 1.0 / 30.0);
        }
    }
}
