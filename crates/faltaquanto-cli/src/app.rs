//! Application state machine and event dispatcher.

use std::time::{Duration, Instant};

use chrono::{Datelike as _, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use faltaquanto_core::{
  account::{AuthErrorCode, User},
  attendance::{BatchOutcome, BatchRequest, Mark},
  subject::Subject,
  weekday::Weekday,
};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use uuid::Uuid;

use crate::{
  client::{ApiClient, ClientError},
  form::{FormAction, LoginForm, LoginMode, SubjectForm, SubjectSubmit},
};

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// No session yet; the login form has focus.
  Login,
  /// Subject list and detail of the subject under the cursor.
  Dashboard,
}

/// Overlay drawn on top of the dashboard. While one is open it receives all
/// keys.
#[derive(Debug, Clone)]
pub enum Modal {
  Form(SubjectForm),
  ConfirmDelete { subject_id: Uuid, name: String },
  /// Absence history of one subject; the events are read from
  /// [`App::subjects`] so that refreshes show up immediately.
  History { subject_id: Uuid, cursor: usize },
  Feedback { headline: String, names: Vec<String> },
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub screen: Screen,

  pub login: LoginForm,

  /// The signed-in user, if any.
  pub user: Option<User>,

  /// The user's subjects as of the last refresh, oldest first.
  pub subjects: Vec<Subject>,

  /// Current fuzzy-filter string (only edited when `filter_active`).
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor position within the *filtered* subject list.
  pub list_cursor: usize,

  pub modal: Option<Modal>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  client: ApiClient,

  refresh_every: Duration,

  last_refresh: Option<Instant>,
}

impl App {
  pub fn new(client: ApiClient, email: String, refresh_every: Duration) -> Self {
    Self {
      screen: Screen::Login,
      login: LoginForm::new(email),
      user: None,
      subjects: Vec::new(),
      filter: String::new(),
      filter_active: false,
      list_cursor: 0,
      modal: None,
      status_msg: String::new(),
      client,
      refresh_every,
      last_refresh: None,
    }
  }

  pub fn server_url(&self) -> &str { self.client.base_url() }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Re-fetch the subject list.
  pub async fn refresh(&mut self) {
    self.last_refresh = Some(Instant::now());
    match self.client.list_subjects().await {
      Ok(subjects) => {
        self.subjects = subjects;
        self.clamp_cursor();
      }
      Err(e) => self.report(e, "Não foi possível carregar as matérias."),
    }
  }

  /// Called once per event-loop iteration; refreshes when the polling interval
  /// has elapsed.
  pub async fn tick(&mut self) {
    if self.screen != Screen::Dashboard {
      return;
    }
    let due = self
      .last_refresh
      .is_none_or(|at| at.elapsed() >= self.refresh_every);
    if due {
      self.refresh().await;
    }
  }

  /// Surface a failed call in the status bar, or return to the login view when
  /// the session is gone.
  fn report(&mut self, e: ClientError, context: &str) {
    tracing::warn!("{context} {e}");
    if e.is_session_expired() {
      self.end_session(Some(AuthErrorCode::InvalidSession.message().to_owned()));
    } else {
      self.status_msg = format!("{context} ({e})");
    }
  }

  fn clamp_cursor(&mut self) {
    let len = self.filtered_subjects().len();
    self.list_cursor = self.list_cursor.min(len.saturating_sub(1));

    if let Some(Modal::History { subject_id, cursor }) = &mut self.modal {
      let len = self
        .subjects
        .iter()
        .find(|s| s.subject_id == *subject_id)
        .map_or(0, |s| s.absences.len());
      *cursor = (*cursor).min(len.saturating_sub(1));
    }
  }

  // ── Lookups ───────────────────────────────────────────────────────────────

  /// Returns subjects whose name matches the current filter query.
  pub fn filtered_subjects(&self) -> Vec<&Subject> {
    if self.filter.is_empty() {
      return self.subjects.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .subjects
      .iter()
      .filter(|s| matcher.fuzzy_match(&s.name, &self.filter).is_some())
      .collect()
  }

  /// The subject under the list cursor in the filtered view, if any.
  pub fn cursor_subject(&self) -> Option<&Subject> {
    self.filtered_subjects().get(self.list_cursor).copied()
  }

  pub fn subject(&self, id: Uuid) -> Option<&Subject> {
    self.subjects.iter().find(|s| s.subject_id == id)
  }

  // ── Session ───────────────────────────────────────────────────────────────

  async fn submit_login(&mut self) {
    let credentials = self.login.credentials();
    let result = match self.login.mode {
      LoginMode::SignIn => self.client.sign_in(&credentials).await,
      LoginMode::SignUp => self.client.sign_up(&credentials).await,
    };
    match result {
      Ok(grant) => {
        tracing::info!(user_id = %grant.user.user_id, "session started");
        self.client.set_token(Some(grant.token));
        self.user = Some(grant.user);
        self.login.error = None;
        self.login.password.clear();
        self.screen = Screen::Dashboard;
        self.status_msg.clear();
        self.refresh().await;
      }
      Err(e) => {
        tracing::warn!("login failed: {e}");
        self.login.error = Some(e.login_message().to_owned());
      }
    }
  }

  async fn sign_out(&mut self) {
    if let Err(e) = self.client.sign_out().await {
      tracing::warn!("sign-out failed: {e}");
    }
    self.end_session(None);
  }

  fn end_session(&mut self, message: Option<String>) {
    self.client.set_token(None);
    self.user = None;
    self.subjects.clear();
    self.modal = None;
    self.filter.clear();
    self.filter_active = false;
    self.list_cursor = 0;
    self.last_refresh = None;
    self.status_msg.clear();
    self.screen = Screen::Login;
    self.login.reset();
    self.login.error = message;
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    match self.screen {
      Screen::Login => match self.login.handle_key(key) {
        FormAction::Cancel => return Ok(false),
        FormAction::Submit => self.submit_login().await,
        FormAction::Continue => {}
      },
      Screen::Dashboard => {
        if let Some(modal) = self.modal.take() {
          self.handle_modal_key(modal, key).await;
        } else if self.filter_active {
          self.handle_filter_key(key);
        } else {
          return Ok(self.handle_list_key(key).await);
        }
      }
    }
    Ok(true)
  }

  fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
  }

  async fn handle_list_key(&mut self, key: KeyEvent) -> bool {
    self.status_msg.clear();
    let cursor = self.cursor_subject().cloned();

    match key.code {
      KeyCode::Char('q') => return false,

      // Navigation
      KeyCode::Down | KeyCode::Char('j') => {
        if self.list_cursor + 1 < self.filtered_subjects().len() {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }
      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Char('r') => self.refresh().await,

      // Records
      KeyCode::Char('a') => self.modal = Some(Modal::Form(SubjectForm::add())),
      KeyCode::Char('e') => {
        if let Some(subject) = &cursor {
          self.modal = Some(Modal::Form(SubjectForm::edit(subject)));
        }
      }
      KeyCode::Char('d') | KeyCode::Delete => {
        if let Some(subject) = cursor {
          self.modal = Some(Modal::ConfirmDelete {
            subject_id: subject.subject_id,
            name:       subject.name,
          });
        }
      }
      KeyCode::Enter | KeyCode::Char('h') => {
        if let Some(subject) = &cursor {
          self.modal = Some(Modal::History {
            subject_id: subject.subject_id,
            cursor:     0,
          });
        }
      }

      // Attendance
      KeyCode::Char('p') => {
        if let Some(subject) = &cursor {
          self.mark(subject.subject_id, Mark::Attended).await;
        }
      }
      KeyCode::Char('f') => {
        if let Some(subject) = &cursor {
          self.mark(subject.subject_id, Mark::Absent).await;
        }
      }
      KeyCode::Char('P') => self.mark_today(Mark::Attended).await,
      KeyCode::Char('F') => self.mark_today(Mark::Absent).await,

      KeyCode::Char('s') => self.sign_out().await,

      _ => {}
    }
    true
  }

  async fn handle_modal_key(&mut self, modal: Modal, key: KeyEvent) {
    match modal {
      Modal::Form(mut form) => match form.handle_key(key) {
        FormAction::Continue => self.modal = Some(Modal::Form(form)),
        FormAction::Cancel => {}
        FormAction::Submit => self.submit_form(form).await,
      },

      Modal::ConfirmDelete { subject_id, name } => match key.code {
        KeyCode::Char('y') | KeyCode::Char('s') => self.delete(subject_id, &name).await,
        KeyCode::Char('n') | KeyCode::Esc => {}
        _ => self.modal = Some(Modal::ConfirmDelete { subject_id, name }),
      },

      Modal::History { subject_id, cursor } => {
        let len = self.subject(subject_id).map_or(0, |s| s.absences.len());
        match key.code {
          KeyCode::Esc | KeyCode::Char('q') => {}
          KeyCode::Down | KeyCode::Char('j') => {
            let cursor = if cursor + 1 < len { cursor + 1 } else { cursor };
            self.modal = Some(Modal::History { subject_id, cursor });
          }
          KeyCode::Up | KeyCode::Char('k') => {
            self.modal = Some(Modal::History {
              subject_id,
              cursor: cursor.saturating_sub(1),
            });
          }
          KeyCode::Char('x') | KeyCode::Char('d') | KeyCode::Delete => {
            self.modal = Some(Modal::History { subject_id, cursor });
            self.remove_absence(subject_id, cursor).await;
          }
          _ => self.modal = Some(Modal::History { subject_id, cursor }),
        }
      }

      // Any key dismisses the feedback.
      Modal::Feedback { .. } => {}
    }
  }

  // ── Actions ───────────────────────────────────────────────────────────────

  async fn submit_form(&mut self, mut form: SubjectForm) {
    let Some(submit) = form.submit() else {
      self.modal = Some(Modal::Form(form));
      return;
    };
    let result = match submit {
      SubjectSubmit::Unchanged => return,
      SubjectSubmit::Create(new) => self
        .client
        .create_subject(&new)
        .await
        .map(|s| format!("Matéria \"{}\" cadastrada.", s.name))
        .map_err(|e| (e, "Não foi possível adicionar a matéria. Tente novamente.")),
      SubjectSubmit::Update(id, patch) => self
        .client
        .update_subject(id, &patch)
        .await
        .map(|s| format!("Matéria \"{}\" atualizada.", s.name))
        .map_err(|e| (e, "Não foi possível salvar as alterações. Tente novamente.")),
    };
    match result {
      Ok(message) => {
        self.refresh().await;
        self.status_msg = message;
      }
      Err((e, context)) => {
        self.modal = Some(Modal::Form(form));
        self.report(e, context);
      }
    }
  }

  async fn delete(&mut self, subject_id: Uuid, name: &str) {
    match self.client.delete_subject(subject_id).await {
      Ok(()) => {
        self.refresh().await;
        self.status_msg = format!("Matéria \"{name}\" excluída.");
      }
      Err(e) => self.report(e, "Não foi possível excluir a matéria."),
    }
  }

  async fn mark(&mut self, subject_id: Uuid, mark: Mark) {
    let result = match mark {
      Mark::Attended => self.client.mark_attended(subject_id).await,
      Mark::Absent => self
        .client
        .mark_absent(subject_id)
        .await
        .map(|marked| marked.subject),
    };
    match result {
      Ok(subject) => {
        self.refresh().await;
        self.status_msg = match mark {
          Mark::Attended => format!("Presença registrada em \"{}\".", subject.name),
          Mark::Absent => format!(
            "Falta registrada em \"{}\" ({} de {}).",
            subject.name, subject.absences_committed, subject.absence_limit
          ),
        };
      }
      Err(e) => self.report(e, "Não foi possível registrar."),
    }
  }

  /// Mark every subject scheduled for the local weekday and show the outcome.
  async fn mark_today(&mut self, mark: Mark) {
    let request = BatchRequest {
      mark,
      weekday: Some(Weekday::from(Local::now().weekday())),
    };
    match self.client.mark_scheduled(&request).await {
      Ok(outcome) => {
        self.refresh().await;
        self.modal = Some(Modal::Feedback {
          headline: feedback_headline(&outcome),
          names:    outcome.affected.into_iter().map(|s| s.name).collect(),
        });
      }
      Err(e) => self.report(e, "Não foi possível registrar as aulas de hoje."),
    }
  }

  async fn remove_absence(&mut self, subject_id: Uuid, index: usize) {
    let Some(absence_id) = self
      .subject(subject_id)
      .and_then(|s| s.absences.get(index))
      .map(|a| a.absence_id)
    else {
      return;
    };
    match self.client.remove_absence(subject_id, absence_id).await {
      Ok(_) => {
        self.refresh().await;
        self.status_msg = "Falta removida.".into();
      }
      Err(e) => self.report(e, "Não foi possível remover a falta."),
    }
  }
}

/// Headline of the feedback modal shown after a batch mark.
pub fn feedback_headline(outcome: &BatchOutcome) -> String {
  let day = outcome.weekday.long_label();
  if outcome.affected.is_empty() {
    return format!("Nenhuma matéria agendada para hoje ({day}).");
  }
  let n = outcome.affected.len();
  let subjects = if n == 1 { "matéria" } else { "matérias" };
  match outcome.mark {
    Mark::Attended => format!("Presença registrada em {n} {subjects} de hoje ({day}):"),
    Mark::Absent => format!("Falta registrada em {n} {subjects} de hoje ({day}):"),
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use faltaquanto_core::weekday::WeekdaySet;

  use super::*;

  fn subject(name: &str) -> Subject {
    Subject {
      subject_id:         Uuid::new_v4(),
      owner_id:           Uuid::new_v4(),
      name:               name.into(),
      weekdays:           WeekdaySet::from_iter([Weekday::Monday]),
      absence_limit:      7,
      absences_committed: 0,
      classes_attended:   0,
      absences:           Vec::new(),
      created_at:         Utc::now(),
    }
  }

  fn app() -> App {
    let client = ApiClient::new("http://localhost:5240").unwrap();
    App::new(client, String::new(), Duration::from_secs(5))
  }

  #[test]
  fn headline_for_nothing_scheduled() {
    let outcome = BatchOutcome {
      mark:     Mark::Attended,
      weekday:  Weekday::Sunday,
      affected: Vec::new(),
    };
    assert_eq!(
      feedback_headline(&outcome),
      "Nenhuma matéria agendada para hoje (domingo)."
    );
  }

  #[test]
  fn headline_counts_affected_subjects() {
    let outcome = BatchOutcome {
      mark:     Mark::Absent,
      weekday:  Weekday::Monday,
      affected: vec![subject("Direito Penal"), subject("Direito Civil")],
    };
    assert_eq!(
      feedback_headline(&outcome),
      "Falta registrada em 2 matérias de hoje (segunda-feira):"
    );

    let outcome = BatchOutcome {
      mark:     Mark::Attended,
      weekday:  Weekday::Monday,
      affected: vec![subject("Direito Penal")],
    };
    assert_eq!(
      feedback_headline(&outcome),
      "Presença registrada em 1 matéria de hoje (segunda-feira):"
    );
  }

  #[test]
  fn filter_matches_names_fuzzily() {
    let mut app = app();
    app.subjects = vec![subject("Direito Penal"), subject("Cálculo I"), subject("Direito Civil")];

    app.filter = "dpen".into();
    let names: Vec<&str> = app.filtered_subjects().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Direito Penal"]);

    app.filter.clear();
    assert_eq!(app.filtered_subjects().len(), 3);
  }

  #[test]
  fn end_session_returns_to_login() {
    let mut app = app();
    app.screen = Screen::Dashboard;
    app.subjects = vec![subject("Direito Penal")];
    app.modal = Some(Modal::Feedback {
      headline: String::new(),
      names:    Vec::new(),
    });

    app.end_session(Some(AuthErrorCode::InvalidSession.message().to_owned()));
    assert_eq!(app.screen, Screen::Login);
    assert!(app.subjects.is_empty());
    assert!(app.modal.is_none());
    assert_eq!(
      app.login.error.as_deref(),
      Some("Sua sessão expirou. Faça login novamente.")
    );
  }

  #[tokio::test]
  async fn list_keys_open_modals_without_network() {
    let mut app = app();
    app.screen = Screen::Dashboard;
    app.subjects = vec![subject("Direito Penal"), subject("Direito Civil")];

    let press = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);

    assert!(app.handle_key(press('j')).await.unwrap());
    assert_eq!(app.cursor_subject().unwrap().name, "Direito Civil");

    app.handle_key(press('e')).await.unwrap();
    let Some(Modal::Form(form)) = &app.modal else {
      panic!("expected the edit form");
    };
    assert_eq!(form.name, "Direito Civil");

    app.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)).await.unwrap();
    assert!(app.modal.is_none());

    app.handle_key(press('d')).await.unwrap();
    assert!(matches!(app.modal, Some(Modal::ConfirmDelete { .. })));
    app.handle_key(press('n')).await.unwrap();
    assert!(app.modal.is_none());

    assert!(!app.handle_key(press('q')).await.unwrap());
  }
}
