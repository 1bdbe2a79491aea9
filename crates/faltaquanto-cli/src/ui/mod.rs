//! TUI rendering — orchestrates all panes.

pub mod login;
pub mod modal;
pub mod subject_detail;
pub mod subject_list;

use chrono::{Datelike as _, Local, NaiveDate};
use faltaquanto_core::{attendance::Standing, weekday::Weekday};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Flex, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::{App, Screen};

const MONTHS: [&str; 12] = [
  "janeiro",
  "fevereiro",
  "março",
  "abril",
  "maio",
  "junho",
  "julho",
  "agosto",
  "setembro",
  "outubro",
  "novembro",
  "dezembro",
];

/// Long pt-BR date, e.g. `quarta-feira, 14 de outubro de 2026`.
pub fn long_date(date: NaiveDate) -> String {
  format!(
    "{}, {} de {} de {}",
    Weekday::from(date.weekday()).long_label(),
    date.day(),
    MONTHS[date.month0() as usize],
    date.year()
  )
}

/// Colour of the absence progress bar.
pub fn standing_color(standing: Standing) -> Color {
  if standing.is_alarming() {
    Color::Red
  } else {
    Color::Green
  }
}

/// A `width` × `height` rectangle centred in `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
    .flex(Flex::Center)
    .areas(area);
  let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
    .flex(Flex::Center)
    .areas(row);
  cell
}

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  match app.screen {
    Screen::Login => login::draw(f, rows[1], app),
    Screen::Dashboard => {
      draw_body(f, rows[1], app);
      if let Some(m) = &app.modal {
        modal::draw(f, rows[1], app, m);
      }
    }
  }
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = long_date(Local::now().date_naive());

  let mut left = vec![
    Span::styled(
      " Falta",
      Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    Span::styled(
      "Quanto",
      Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD),
    ),
  ];
  let greeting = match &app.user {
    Some(user) => format!("  Olá, {}", user.email),
    None => format!("  {}", app.server_url()),
  };
  left.push(Span::styled(greeting, Style::default().fg(Color::Gray)));

  let right = Span::styled(format!("{date} "), Style::default().fg(Color::Gray));

  // Simple left-right header: pad the middle.
  let left_width: usize = left.iter().map(|s| s.content.chars().count()).sum();
  let pad = (area.width as usize)
    .saturating_sub(left_width)
    .saturating_sub(right.content.chars().count());

  left.push(Span::raw(" ".repeat(pad)));
  left.push(right);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(Line::from(left)), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
    .split(area);

  subject_list::draw(f, cols[0], app);
  subject_detail::draw(f, cols[1], app);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  use crate::app::Modal;

  let (mode_label, hints) = match (&app.screen, &app.modal) {
    (Screen::Login, _) => (
      "LOGIN",
      "Tab alterna campo  Enter envia  Ctrl-T login/cadastro  Esc sai",
    ),
    (Screen::Dashboard, Some(Modal::Form(_))) => (
      "FORM",
      "Tab próximo campo  ←→ dia  Espaço marca  Enter salvar  Esc cancelar",
    ),
    (Screen::Dashboard, Some(Modal::ConfirmDelete { .. })) => ("EXCLUIR", "s/y confirma  n/Esc cancela"),
    (Screen::Dashboard, Some(Modal::History { .. })) => ("HISTÓRICO", "↑↓/jk navega  x remove  Esc fecha"),
    (Screen::Dashboard, Some(Modal::Feedback { .. })) => ("SUCESSO", "qualquer tecla fecha"),
    (Screen::Dashboard, None) if app.filter_active => (
      "BUSCA",
      "Digite para filtrar  Esc cancela  Enter confirma",
    ),
    (Screen::Dashboard, None) => (
      "MATÉRIAS",
      "a nova  e editar  d excluir  p presente  f faltei  h histórico  P/F hoje  / busca  s sair  q",
    ),
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {status}"), Style::default().fg(Color::Gray));

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
