use deepfield_engine::core::{
    elements::{ElementState, ScoringElement},
    fieldstate::{FieldEvent, FieldState},
    match_state::{GamePhase, ProjectPhase},
    model::{Attachment, Role},
};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Row},
};

fn element_style(element: &ScoringElement, selected: bool) -> Style {
    let fg = match (element.role, element.state()) {
        (Role::Sample, ElementState::SampleClaimed) => Color::Yellow,
        (Role::Sample, _) => Color::Indexed(136),
        (Role::Specimen, ElementState::SpecimenHanging) => Color::LightRed,
        (Role::Specimen, _) => Color::Red,
    };
    let style = Style::default().fg(fg);
    if selected {
        style.add_modifier(Modifier::REVERSED)
    } else {
        style
    }
}

fn glyph(element: &ScoringElement) -> &'static str {
    match (element.state(), element.is_grabbed()) {
        (_, true) => "⊐■⊏",
        (ElementState::SampleClaimed, _) => "\\■/",
        (ElementState::SpecimenHanging, _) => "═▼═",
        (ElementState::SampleFree, _) => " ■ ",
        (ElementState::SpecimenFree, _) => " ▲ ",
    }
}

fn attachment_text(attachment: Attachment) -> String {
    match attachment {
        Attachment::Free => "free".to_owned(),
        Attachment::Claw => "claw".to_owned(),
        Attachment::Rung(id) => format!("rung {}", id),
    }
}

pub fn element_row(element: &ScoringElement, state: &FieldState, selected: bool) -> Row<'static> {
    let slot = match state.registry().slot_of(element.id) {
        Some(slot) => format!("{:>2}", slot),
        None => " -".to_owned(),
    };
    let converting = match state.conversions().time_left(element.id, state.scheduler()) {
        Some(left) => format!("{:.1}s", left),
        None => String::new(),
    };
    Row::new(vec![
        Cell::from(format!("{:>3}", element.id)),
        Cell::from(glyph(element)),
        Cell::from(format!("{:?}", element.state())),
        Cell::from(slot),
        Cell::from(attachment_text(element.attachment())),
        Cell::from(converting),
    ])
    .style(element_style(element, selected))
}

pub fn status_line(state: &FieldState) -> Line<'static> {
    let info = &state.info;
    let phase = match info.project_phase() {
        ProjectPhase::Game => format!("{:?}", info.game_phase()),
        other => format!("{:?}", other),
    };
    let clock_style = match info.game_phase() {
        GamePhase::Between => Style::default().fg(Color::Cyan),
        _ => Style::default().fg(Color::White),
    };
    let mut spans = vec![
        Span::styled(format!(" {} ", phase), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(format!(" {} ", info.display_time()), clock_style),
    ];
    if info.shows_score() {
        spans.push(Span::styled(
            format!(" score {} ", state.score()),
            Style::default().fg(Color::Green),
        ));
    }
    spans.push(Span::raw(format!(" cam {:?} ", info.camera())));
    Line::from(spans)
}

pub fn event_text(event: &FieldEvent) -> String {
    match event {
        FieldEvent::Phase(change) => format!("phase -> {:?}", change),
        FieldEvent::Claw(toggle) => format!("claw {:?}", toggle),
        FieldEvent::Element(change) => {
            format!("#{} {:?} -> {:?}", change.object, change.from, change.to)
        }
        FieldEvent::ConversionStarted(id) => format!("#{} converting", id),
        FieldEvent::ConversionCancelled(id) => format!("#{} conversion cancelled", id),
        FieldEvent::Converted { sample, specimen } => {
            format!("#{} became specimen #{}", sample, specimen)
        }
        FieldEvent::Grabbed(id) => format!("#{} grabbed", id),
        FieldEvent::Released(id) => format!("#{} released", id),
    }
}
