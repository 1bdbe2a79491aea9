//! Subject list pane — left panel.

use faltaquanto_core::{attendance::Standing, subject::Subject};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use super::standing_color;
use crate::app::App;

const BAR_WIDTH: usize = 12;

/// A text progress bar, e.g. `█████░░░░░`. Clamped to full.
pub fn progress_bar(percent: f64, width: usize) -> String {
  let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
  format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn entry(subject: &Subject) -> ListItem<'static> {
  let standing = subject.standing();
  let percent = subject.absence_percent();

  let mut title = vec![Span::styled(
    subject.name.clone(),
    Style::default().add_modifier(Modifier::BOLD),
  )];
  if standing == Standing::Exceeded {
    title.push(Span::styled("  limite excedido", Style::default().fg(Color::Red)));
  }

  ListItem::new(vec![
    Line::from(title),
    Line::from(vec![
      Span::raw(format!(
        "  Faltas: {} de {}  ",
        subject.absences_committed, subject.absence_limit
      )),
      Span::styled(
        progress_bar(percent, BAR_WIDTH),
        Style::default().fg(standing_color(standing)),
      ),
      Span::raw(format!(" {percent:.0}%")),
    ]),
    Line::from(vec![
      Span::raw(format!("  Aulas assistidas: {}", subject.classes_attended)),
      Span::styled(
        format!("  {}", subject.weekdays.labels()),
        Style::default().fg(Color::Gray),
      ),
    ]),
  ])
}

/// Render the subject list into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let filtered = app.filtered_subjects();
  let total = app.subjects.len();

  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" Minhas Matérias ({}/{}) ", filtered.len(), total)
  } else {
    format!(" Minhas Matérias ({total}) ")
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  // Filter bar at the bottom of the inner area.
  if (app.filter_active || !app.filter.is_empty()) && inner_area.height > 2 {
    let filter_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let filter_text = if app.filter_active {
      format!("/{}_", app.filter)
    } else {
      format!("/{}", app.filter)
    };
    f.render_widget(
      Paragraph::new(filter_text).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  if total == 0 {
    f.render_widget(
      Paragraph::new(vec![
        Line::from("Nenhuma matéria cadastrada ainda."),
        Line::from("Pressione [a] para adicionar uma."),
      ])
      .style(Style::default().fg(Color::Gray)),
      inner_area,
    );
    return;
  }

  let items: Vec<ListItem> = filtered.iter().map(|s| entry(s)).collect();

  let mut state = ListState::default();
  state.select(if filtered.is_empty() {
    None
  } else {
    Some(app.list_cursor)
  });

  f.render_stateful_widget(
    List::new(items)
      .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
      .highlight_symbol("▌"),
    inner_area,
    &mut state,
  );
}
