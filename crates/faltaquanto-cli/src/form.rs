//! Editable form state for the login view and the subject add/edit modal.
//!
//! Key handling here is pure: forms only mutate their own fields and report
//! what the caller should do next.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use faltaquanto_core::{
  account::Credentials,
  subject::{Subject, SubjectDraft, SubjectPatch},
  weekday::{Weekday, WeekdaySet},
};
use uuid::Uuid;

/// Shown when the add form is submitted without a name or a weekday.
pub const ADD_REQUIRED: &str = "Preencha o nome e selecione pelo menos um dia da semana.";
/// Shown when the edit form is submitted without a name or a weekday.
pub const EDIT_REQUIRED: &str = "O nome e pelo menos um dia da semana são obrigatórios.";

const MAX_LIMIT_DIGITS: usize = 4;

/// What the owner of a form should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
  Continue,
  Submit,
  Cancel,
}

fn is_ctrl(key: &KeyEvent, c: char) -> bool {
  key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
  SignIn,
  SignUp,
}

impl LoginMode {
  pub fn heading(self) -> &'static str {
    match self {
      Self::SignIn => "Faça login",
      Self::SignUp => "Crie sua conta",
    }
  }

  pub fn submit_label(self) -> &'static str {
    match self {
      Self::SignIn => "Entrar",
      Self::SignUp => "Cadastrar",
    }
  }

  /// The prompt offering the other mode.
  pub fn toggle_prompt(self) -> &'static str {
    match self {
      Self::SignIn => "Não tem uma conta? Cadastre-se",
      Self::SignUp => "Já tem uma conta? Faça login",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
  Email,
  Password,
}

#[derive(Debug, Clone)]
pub struct LoginForm {
  pub mode:     LoginMode,
  pub email:    String,
  pub password: String,
  pub focus:    LoginField,
  /// Localized error from the last attempt.
  pub error:    Option<String>,
}

impl LoginForm {
  pub fn new(email: impl Into<String>) -> Self {
    let email = email.into();
    let focus = if email.is_empty() {
      LoginField::Email
    } else {
      LoginField::Password
    };
    Self {
      mode: LoginMode::SignIn,
      email,
      password: String::new(),
      focus,
      error: None,
    }
  }

  pub fn credentials(&self) -> Credentials { Credentials::new(self.email.trim(), &self.password) }

  pub fn toggle_mode(&mut self) {
    self.mode = match self.mode {
      LoginMode::SignIn => LoginMode::SignUp,
      LoginMode::SignUp => LoginMode::SignIn,
    };
    self.error = None;
  }

  /// Forget the typed password, e.g. after signing out.
  pub fn reset(&mut self) {
    self.password.clear();
    self.focus = LoginField::Password;
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
    if is_ctrl(&key, 't') {
      self.toggle_mode();
      return FormAction::Continue;
    }
    match key.code {
      KeyCode::Esc => return FormAction::Cancel,
      KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
        self.focus = match self.focus {
          LoginField::Email => LoginField::Password,
          LoginField::Password => LoginField::Email,
        };
      }
      KeyCode::Enter => match self.focus {
        LoginField::Email => self.focus = LoginField::Password,
        LoginField::Password => return FormAction::Submit,
      },
      KeyCode::Backspace => {
        self.field_mut().pop();
      }
      KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.field_mut().push(c);
      }
      _ => {}
    }
    FormAction::Continue
  }

  fn field_mut(&mut self) -> &mut String {
    match self.focus {
      LoginField::Email => &mut self.email,
      LoginField::Password => &mut self.password,
    }
  }
}

// ─── Subject form ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectField {
  Name,
  Weekdays,
  Limit,
}

impl SubjectField {
  fn next(self) -> Self {
    match self {
      Self::Name => Self::Weekdays,
      Self::Weekdays => Self::Limit,
      Self::Limit => Self::Name,
    }
  }

  fn prev(self) -> Self {
    match self {
      Self::Name => Self::Limit,
      Self::Weekdays => Self::Name,
      Self::Limit => Self::Weekdays,
    }
  }
}

/// Whether the form creates a subject or edits an existing one.
#[derive(Debug, Clone)]
pub enum FormKind {
  Add,
  /// Holds the record as it was when the form opened.
  Edit(Box<Subject>),
}

/// A validated submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectSubmit {
  Create(SubjectDraft),
  Update(Uuid, SubjectPatch),
  /// An edit that changed nothing.
  Unchanged,
}

#[derive(Debug, Clone)]
pub struct SubjectForm {
  pub kind:       FormKind,
  pub name:       String,
  pub weekdays:   WeekdaySet,
  /// Weekday under the cursor while the weekday row has focus.
  pub day_cursor: Weekday,
  /// Digits only. Empty leaves the limit to the server on add and unchanged
  /// on edit.
  pub limit:      String,
  pub focus:      SubjectField,
  pub error:      Option<&'static str>,
}

impl SubjectForm {
  pub fn add() -> Self {
    Self {
      kind:       FormKind::Add,
      name:       String::new(),
      weekdays:   WeekdaySet::empty(),
      day_cursor: Weekday::Monday,
      limit:      String::new(),
      focus:      SubjectField::Name,
      error:      None,
    }
  }

  /// A form pre-populated from `subject`.
  pub fn edit(subject: &Subject) -> Self {
    Self {
      kind:       FormKind::Edit(Box::new(subject.clone())),
      name:       subject.name.clone(),
      weekdays:   subject.weekdays,
      day_cursor: subject.weekdays.iter().next().unwrap_or(Weekday::Monday),
      limit:      subject.absence_limit.to_string(),
      focus:      SubjectField::Name,
      error:      None,
    }
  }

  pub fn title(&self) -> &'static str {
    match self.kind {
      FormKind::Add => " Cadastrar Nova Matéria ",
      FormKind::Edit(_) => " Editar Matéria ",
    }
  }

  fn required_message(&self) -> &'static str {
    match self.kind {
      FormKind::Add => ADD_REQUIRED,
      FormKind::Edit(_) => EDIT_REQUIRED,
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
    match key.code {
      KeyCode::Esc => return FormAction::Cancel,
      KeyCode::Enter => return FormAction::Submit,
      KeyCode::Tab => self.focus = self.focus.next(),
      KeyCode::BackTab => self.focus = self.focus.prev(),
      _ => match self.focus {
        SubjectField::Name => match key.code {
          KeyCode::Backspace => {
            self.name.pop();
          }
          KeyCode::Char(c) => self.name.push(c),
          _ => {}
        },
        SubjectField::Weekdays => self.handle_weekday_key(key.code),
        SubjectField::Limit => match key.code {
          KeyCode::Backspace => {
            self.limit.pop();
          }
          KeyCode::Char(c) if c.is_ascii_digit() && self.limit.len() < MAX_LIMIT_DIGITS => {
            self.limit.push(c);
          }
          _ => {}
        },
      },
    }
    FormAction::Continue
  }

  fn handle_weekday_key(&mut self, code: KeyCode) {
    match code {
      KeyCode::Left | KeyCode::Char('h') => self.day_cursor = shift(self.day_cursor, 6),
      KeyCode::Right | KeyCode::Char('l') => self.day_cursor = shift(self.day_cursor, 1),
      KeyCode::Char(' ') => self.weekdays.toggle(self.day_cursor),
      KeyCode::Char(c) => {
        if let Some(day) = c
          .to_digit(10)
          .and_then(|d| u8::try_from(d).ok())
          .and_then(Weekday::from_repr)
        {
          self.day_cursor = day;
          self.weekdays.toggle(day);
        }
      }
      _ => {}
    }
  }

  fn parsed_limit(&self) -> Option<u32> { self.limit.parse().ok() }

  /// Validate the fields. On failure the message is stored in
  /// [`SubjectForm::error`] and `None` is returned.
  pub fn submit(&mut self) -> Option<SubjectSubmit> {
    let name = self.name.trim();
    if name.is_empty() || self.weekdays.is_empty() {
      self.error = Some(self.required_message());
      return None;
    }
    self.error = None;
    let absence_limit = self.parsed_limit();

    let submit = match &self.kind {
      FormKind::Add => SubjectSubmit::Create(SubjectDraft {
        name: name.to_owned(),
        weekdays: self.weekdays,
        absence_limit,
      }),
      FormKind::Edit(original) => {
        let patch = SubjectPatch {
          name:          (name != original.name).then(|| name.to_owned()),
          weekdays:      (self.weekdays != original.weekdays).then_some(self.weekdays),
          absence_limit: absence_limit.filter(|limit| *limit != original.absence_limit),
        };
        if patch.is_empty() {
          SubjectSubmit::Unchanged
        } else {
          SubjectSubmit::Update(original.subject_id, patch)
        }
      }
    };
    Some(submit)
  }
}

/// `day` moved forward by `offset` days, wrapping around the week.
fn shift(day: Weekday, offset: u8) -> Weekday {
  Weekday::from_repr((day.index() + offset) % 7).unwrap_or(day)
}
