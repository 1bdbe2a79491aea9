//! Login view: sign-in / sign-up form centred on screen.

use ratatui::{
  Frame,
  layout::{Alignment, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use super::centered;
use crate::{app::App, form::LoginField};

fn field<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
  let style = if focused {
    Style::default().fg(Color::Yellow)
  } else {
    Style::default()
  };
  let cursor = if focused { "_" } else { "" };
  Line::from(vec![
    Span::styled(format!("{label:<7}"), style.add_modifier(Modifier::BOLD)),
    Span::styled(format!("{value}{cursor}"), style),
  ])
}

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let form = &app.login;
  let box_area = centered(area, 56, 14);

  let block = Block::default()
    .title(format!(" {} ", form.mode.heading()))
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(box_area);
  f.render_widget(block, box_area);

  let masked = "•".repeat(form.password.chars().count());
  let mut lines = vec![
    Line::from(Span::styled(
      "para gerenciar suas faltas",
      Style::default().fg(Color::Gray),
    ))
    .alignment(Alignment::Center),
    Line::from(""),
    field("Email", form.email.clone(), form.focus == LoginField::Email),
    field("Senha", masked, form.focus == LoginField::Password),
    Line::from(""),
    Line::from(Span::styled(
      format!("[Enter] {}", form.mode.submit_label()),
      Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center),
    Line::from(""),
    Line::from(Span::styled(
      format!("[Ctrl-T] {}", form.mode.toggle_prompt()),
      Style::default().fg(Color::Gray),
    ))
    .alignment(Alignment::Center),
  ];

  if let Some(error) = &form.error {
    lines.push(Line::from(""));
    lines.push(
      Line::from(Span::styled(
        error.clone(),
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
      ))
      .alignment(Alignment::Center),
    );
  }

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}
