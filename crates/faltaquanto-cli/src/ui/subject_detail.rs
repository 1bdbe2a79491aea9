//! Subject detail pane — right panel.

use chrono::Local;
use faltaquanto_core::{attendance::Standing, subject::Subject};
use ratatui::{
  Frame,
  layout::{Constraint, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

use super::{long_date, standing_color};
use crate::app::App;

/// Render the detail pane into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let subject = app.cursor_subject();

  let title = subject.map_or_else(|| " Detalhes ".to_string(), |s| format!(" {} ", s.name));
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let inner = block.inner(area);
  f.render_widget(block, area);

  let Some(subject) = subject else {
    f.render_widget(
      Paragraph::new("Selecione uma matéria na lista.").style(Style::default().fg(Color::Gray)),
      inner,
    );
    return;
  };

  let [gauge_area, _, text_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Min(0),
  ])
  .areas(inner);

  let standing = subject.standing();
  let percent = subject.absence_percent();
  f.render_widget(
    Gauge::default()
      .gauge_style(Style::default().fg(standing_color(standing)).bg(Color::Black))
      .ratio((percent / 100.0).clamp(0.0, 1.0))
      .label(format!(
        "Faltas: {} de {} ({percent:.0}%)",
        subject.absences_committed, subject.absence_limit
      )),
    gauge_area,
  );

  f.render_widget(
    Paragraph::new(detail_lines(subject, standing)).wrap(Wrap { trim: false }),
    text_area,
  );
}

fn label(text: &str) -> Span<'static> {
  Span::styled(
    format!("{text:<18}"),
    Style::default()
      .fg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  )
}

fn detail_lines(subject: &Subject, standing: Standing) -> Vec<Line<'static>> {
  let remaining = match standing {
    Standing::Exceeded => Span::styled(
      format!(
        "limite excedido em {}",
        subject.absences_committed - subject.absence_limit
      ),
      Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    ),
    Standing::Danger => Span::styled(
      subject.remaining_absences().to_string(),
      Style::default().fg(Color::Red),
    ),
    Standing::Safe => Span::raw(subject.remaining_absences().to_string()),
  };

  let last_absence = subject.absences.last().map_or_else(
    || "nenhuma".to_string(),
    |a| long_date(a.recorded_at.with_timezone(&Local).date_naive()),
  );

  vec![
    Line::from(vec![
      label("Aulas assistidas"),
      Span::raw(subject.classes_attended.to_string()),
    ]),
    Line::from(vec![label("Faltas restantes"), remaining]),
    Line::from(vec![label("Dias"), Span::raw(subject.weekdays.labels())]),
    Line::from(vec![label("Última falta"), Span::raw(last_absence)]),
    Line::from(vec![
      label("Cadastrada em"),
      Span::raw(long_date(subject.created_at.with_timezone(&Local).date_naive())),
    ]),
    Line::from(""),
    Line::from(Span::styled(
      "[p] presente  [f] faltei  [h] histórico  [e] editar  [d] excluir",
      Style::default().fg(Color::DarkGray),
    )),
  ]
}
