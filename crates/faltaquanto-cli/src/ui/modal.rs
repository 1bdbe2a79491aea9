//! Overlays drawn above the dashboard: subject form, delete confirmation,
//! absence history and batch feedback.

use chrono::Local;
use faltaquanto_core::weekday::Weekday;
use ratatui::{
  Frame,
  layout::{Alignment, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use strum::IntoEnumIterator as _;

use super::{centered, long_date};
use crate::{
  app::{App, Modal},
  form::{FormKind, SubjectField, SubjectForm},
};

fn frame(f: &mut Frame, area: Rect, title: &str, width: u16, height: u16) -> Rect {
  let rect = centered(area, width, height);
  let block = Block::default()
    .title(title.to_owned())
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(rect);
  f.render_widget(Clear, rect);
  f.render_widget(block, rect);
  inner
}

fn dim() -> Style { Style::default().fg(Color::Gray) }

pub fn draw(f: &mut Frame, area: Rect, app: &App, modal: &Modal) {
  match modal {
    Modal::Form(form) => draw_form(f, area, form),
    Modal::ConfirmDelete { name, .. } => {
      let inner = frame(f, area, " Excluir Matéria ", 52, 7);
      let lines = vec![
        Line::from(format!("Excluir \"{name}\"?")),
        Line::from(Span::styled(
          "O histórico de faltas também será apagado.",
          dim(),
        )),
        Line::from(""),
        Line::from(Span::styled(
          "[s] sim   [n] não",
          Style::default().add_modifier(Modifier::BOLD),
        )),
      ];
      f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
    }
    Modal::History { subject_id, cursor } => {
      let subject = app.subject(*subject_id);
      let title = match subject {
        Some(s) => format!(" Histórico de Faltas: {} ", s.name),
        None => " Histórico de Faltas ".to_string(),
      };
      let inner = frame(f, area, &title, 60, 16);
      let absences = subject.map(|s| s.absences.as_slice()).unwrap_or_default();

      if absences.is_empty() {
        f.render_widget(
          Paragraph::new("Nenhuma falta registrada ainda. Continue assim!").style(dim()),
          inner,
        );
        return;
      }

      let items: Vec<ListItem> = absences
        .iter()
        .enumerate()
        .map(|(i, a)| {
          ListItem::new(format!(
            "{:>2}. {}",
            i + 1,
            long_date(a.recorded_at.with_timezone(&Local).date_naive())
          ))
        })
        .collect();
      let mut state = ListState::default();
      state.select(Some(*cursor));
      f.render_stateful_widget(
        List::new(items)
          .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
          .highlight_symbol("▌"),
        inner,
        &mut state,
      );
    }
    Modal::Feedback { headline, names } => {
      let height = u16::try_from(names.len()).unwrap_or(u16::MAX).saturating_add(7);
      let inner = frame(f, area, " Sucesso! ", 60, height);
      let mut lines = vec![
        Line::from(Span::styled(
          headline.clone(),
          Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
      ];
      lines.extend(names.iter().map(|n| Line::from(format!("  • {n}"))));
      lines.push(Line::from(""));
      lines.push(Line::from(Span::styled("Pressione qualquer tecla.", dim())).alignment(Alignment::Right));
      f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }
  }
}

fn draw_form(f: &mut Frame, area: Rect, form: &SubjectForm) {
  let inner = frame(f, area, form.title(), 64, 12);

  let focus_style = |field: SubjectField| {
    if form.focus == field {
      Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
      Style::default().add_modifier(Modifier::BOLD)
    }
  };
  let cursor = |field: SubjectField| if form.focus == field { "_" } else { "" };

  let mut days = vec![Span::styled("Dias:    ", focus_style(SubjectField::Weekdays))];
  for day in Weekday::iter() {
    let checked = if form.weekdays.contains(day) { "x" } else { " " };
    let mut style = if form.weekdays.contains(day) {
      Style::default().fg(Color::Cyan)
    } else {
      Style::default()
    };
    if form.focus == SubjectField::Weekdays && form.day_cursor == day {
      style = style.add_modifier(Modifier::REVERSED);
    }
    days.push(Span::styled(format!("[{checked}] {}", day.label()), style));
    days.push(Span::raw(" "));
  }

  let mut lines = vec![
    Line::from(vec![
      Span::styled("Nome:    ", focus_style(SubjectField::Name)),
      Span::raw(format!("{}{}", form.name, cursor(SubjectField::Name))),
    ]),
    Line::from(Span::styled("         Ex: Direito Penal", dim())),
    Line::from(""),
    Line::from(days),
    Line::from(""),
    Line::from(vec![
      Span::styled("Limite:  ", focus_style(SubjectField::Limit)),
      Span::raw(format!("{}{}", form.limit, cursor(SubjectField::Limit))),
      Span::styled(
        if form.limit.is_empty() && matches!(form.kind, FormKind::Add) {
          "  faltas permitidas (vazio: padrão do servidor)"
        } else {
          "  faltas permitidas"
        },
        dim(),
      ),
    ]),
  ];

  if let Some(error) = form.error {
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
      error,
      Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )));
  }

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
