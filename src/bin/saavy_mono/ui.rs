//! Parameter gauges, voice status and help bar.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};
use saavy_mono::{dsp::EnvelopeState, io::midi::note_name, synth::message::Param};

use crate::app::{App, SLIDERS};

pub fn render(frame: &mut Frame, app: &App) {
    let mut constraints = vec![Constraint::Length(3)];
    constraints.extend(SLIDERS.iter().map(|_| Constraint::Length(3)));
    constraints.push(Constraint::Length(3));
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(1));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    render_header(frame, chunks[0], app);
    for (i, slider_area) in chunks[1..=SLIDERS.len()].iter().enumerate() {
        render_slider(frame, *slider_area, app, i);
    }
    render_voice(frame, chunks[SLIDERS.len() + 1], app);
    render_help(frame, chunks[SLIDERS.len() + 3]);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let device = app.device();
    let mode = if app.key_releases() { "key release" } else { "auto gate" };
    let line = Line::from(vec![
        Span::styled(format!(" {}  ", device.name), Style::default().fg(Color::Cyan)),
        Span::styled(
            format!("{:.1}kHz  {}ch  ", device.sample_rate / 1000.0, device.channels),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Octave {}  ", app.octave()),
            Style::default().fg(Color::White),
        ),
        Span::styled(mode, Style::default().fg(Color::DarkGray)),
    ]);
    let block = Block::default().title(" saavy-mono ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_slider(frame: &mut Frame, area: Rect, app: &App, index: usize) {
    let slider = &SLIDERS[index];
    let value = app.value(slider.param);
    let derived = slider.param == Param::Resonance && app.resonance_tracks_cutoff();

    let label = match slider.unit {
        "Hz" => format!("{value:.0} Hz"),
        "s" => format!("{:.1} ms", value * 1000.0),
        _ => format!("{value:.2}"),
    };
    let title = if derived {
        format!(" {} (follows cutoff) ", slider.label)
    } else {
        format!(" {} ", slider.label)
    };

    let mut style = Style::default().fg(if derived { Color::DarkGray } else { Color::LightBlue });
    let mut block = Block::default().title(title).borders(Borders::ALL);
    if index == app.selected() {
        style = style.add_modifier(Modifier::BOLD);
        block = block.border_style(Style::default().fg(Color::Yellow));
    }

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(style)
        .ratio(slider.position(value) as f64)
        .label(label);
    frame.render_widget(gauge, area);
}

fn render_voice(frame: &mut Frame, area: Rect, app: &App) {
    let (note, stage, level) = match app.snapshot() {
        Some(s) => (s.note, s.stage, s.level),
        None => (None, EnvelopeState::Idle, 0.0),
    };
    let note = note.map(note_name).unwrap_or_else(|| String::from("--"));
    let held: Vec<String> = app.held_notes().iter().map(|&n| note_name(n)).collect();

    let title = format!(" {note}  {stage:?}  held [{}] ", held.join(" "));
    let gauge = Gauge::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .gauge_style(Style::default().fg(stage_color(stage)))
        .ratio(level.clamp(0.0, 1.0) as f64)
        .label(format!("{level:.2}"));
    frame.render_widget(gauge, area);
}

fn stage_color(stage: EnvelopeState) -> Color {
    match stage {
        EnvelopeState::Idle => Color::DarkGray,
        EnvelopeState::Attack => Color::LightRed,
        EnvelopeState::Decay => Color::LightYellow,
        EnvelopeState::Sustain => Color::LightGreen,
        EnvelopeState::Release => Color::LightMagenta,
    }
}

fn render_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(
        " [z..m, q..]] Play  [Up/Down] Select  [Left/Right] Adjust (Shift: fine)  [PgUp/PgDn] Octave  [Esc] Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, area);
}
