// app.rs
use crate::filter::filter;
use crate::remote::{HttpCollection, RemoteCollection};
use crate::sync::{Confirm, Deletion, ListKind, Mirrors, SyncEngine, SyncError};
use crate::todo::{ArchivedTodo, NewArchivedTodo, NewTodo, Todo};
use chrono::{DateTime, Local};
use log::{error, warn};
use std::collections::VecDeque;

const MAX_NOTICES: usize = 20;

pub type HttpEngine =
    SyncEngine<HttpCollection<Todo, NewTodo>, HttpCollection<ArchivedTodo, NewArchivedTodo>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    EditingAnswer,
    EditingQuestionNumber,
    Searching,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub at: DateTime<Local>,
}

/// Everything the UI shows, plus the engine that changes it.
pub struct App<A, D> {
    engine: SyncEngine<A, D>,
    pub mirrors: Mirrors,
    pub focus: ListKind,
    pub input_mode: InputMode,
    pub active_query: String,
    pub archived_query: String,
    pub dialog_open: bool,
    pub input_answer: String,
    pub input_question_number: String,
    pub selected_active: usize,
    pub selected_archived: usize,
    pub notices: VecDeque<Notice>,
}

impl<A, D> App<A, D>
where
    A: RemoteCollection<Record = Todo, Draft = NewTodo>,
    D: RemoteCollection<Record = ArchivedTodo, Draft = NewArchivedTodo>,
{
    pub fn new(engine: SyncEngine<A, D>) -> Self {
        Self {
            engine,
            mirrors: Mirrors::default(),
            focus: ListKind::Active,
            input_mode: InputMode::Normal,
            active_query: String::new(),
            archived_query: String::new(),
            dialog_open: false,
            input_answer: String::new(),
            input_question_number: String::new(),
            selected_active: 0,
            selected_archived: 0,
            notices: VecDeque::new(),
        }
    }

    pub fn notify<S: Into<String>>(&mut self, level: NoticeLevel, text: S) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            level,
            text: text.into(),
            at: Local::now(),
        });
    }

    pub fn latest_notice(&self) -> Option<&Notice> {
        self.notices.back()
    }

    fn report(&mut self, err: &SyncError) {
        if err.is_validation() {
            warn!("{}", err);
            self.notify(NoticeLevel::Warning, err.to_string());
        } else {
            error!("{}", err);
            self.notify(NoticeLevel::Error, err.to_string());
        }
    }

    /// Initial fetch of both lists.
    pub fn load(&mut self) {
        if let Err(e) = self.engine.refresh_all(&mut self.mirrors) {
            self.report(&e);
        }
        self.clamp_selection();
    }

    pub fn refresh(&mut self) {
        match self.engine.refresh_all(&mut self.mirrors) {
            Ok(()) => self.notify(NoticeLevel::Success, "Lists refreshed"),
            Err(e) => self.report(&e),
        }
        self.clamp_selection();
    }

    pub fn visible_active(&self) -> Vec<&Todo> {
        filter(&self.mirrors.todos, &self.active_query)
    }

    pub fn visible_archived(&self) -> Vec<&ArchivedTodo> {
        filter(&self.mirrors.done_todos, &self.archived_query)
    }

    /// The search query of the list that has focus.
    pub fn focused_query_mut(&mut self) -> &mut String {
        match self.focus {
            ListKind::Active => &mut self.active_query,
            ListKind::Archived => &mut self.archived_query,
        }
    }

    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Searching;
    }

    pub fn finish_search(&mut self, keep: bool) {
        if !keep {
            self.focused_query_mut().clear();
        }
        self.input_mode = InputMode::Normal;
        self.clamp_selection();
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            ListKind::Active => ListKind::Archived,
            ListKind::Archived => ListKind::Active,
        };
    }

    pub fn select_next(&mut self) {
        match self.focus {
            ListKind::Active => {
                if self.selected_active + 1 < self.visible_active().len() {
                    self.selected_active += 1;
                }
            }
            ListKind::Archived => {
                if self.selected_archived + 1 < self.visible_archived().len() {
                    self.selected_archived += 1;
                }
            }
        }
    }

    pub fn select_prev(&mut self) {
        match self.focus {
            ListKind::Active => self.selected_active = self.selected_active.saturating_sub(1),
            ListKind::Archived => {
                self.selected_archived = self.selected_archived.saturating_sub(1)
            }
        }
    }

    pub fn clamp_selection(&mut self) {
        let active = self.visible_active().len();
        let archived = self.visible_archived().len();
        self.selected_active = self.selected_active.min(active.saturating_sub(1));
        self.selected_archived = self.selected_archived.min(archived.saturating_sub(1));
    }

    pub fn open_dialog(&mut self) {
        self.dialog_open = true;
        self.input_mode = InputMode::EditingAnswer;
    }

    /// Closes the dialog and keeps whatever was typed for next time.
    pub fn cancel_dialog(&mut self) {
        self.dialog_open = false;
        self.input_mode = InputMode::Normal;
    }

    pub fn next_dialog_field(&mut self) {
        self.input_mode = match self.input_mode {
            InputMode::EditingAnswer => InputMode::EditingQuestionNumber,
            InputMode::EditingQuestionNumber => InputMode::EditingAnswer,
            other => other,
        };
    }

    /// Submits the dialog. It only closes once the todo is stored.
    pub fn submit_new_todo(&mut self) -> bool {
        let result = self.engine.add_todo(
            &mut self.mirrors,
            &self.input_answer,
            &self.input_question_number,
        );
        match result {
            Ok(todo) => {
                self.notify(
                    NoticeLevel::Success,
                    format!("Added #{} to today's list", todo.question_number),
                );
                self.input_answer.clear();
                self.input_question_number.clear();
                self.dialog_open = false;
                self.input_mode = InputMode::Normal;
                true
            }
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    /// Marks the selected active todo as done.
    pub fn complete_selected(&mut self) {
        if self.focus != ListKind::Active {
            return;
        }
        let Some(todo) = self.visible_active().get(self.selected_active).map(|t| (*t).clone())
        else {
            return;
        };
        match self.engine.complete_todo(&mut self.mirrors, &todo) {
            Ok(_) => self.notify(
                NoticeLevel::Success,
                format!("#{} moved to completed", todo.question_number),
            ),
            Err(e) => self.report(&e),
        }
        self.clamp_selection();
    }

    /// Deletes the selected item of the focused list after asking `confirm`.
    pub fn delete_selected<C: Confirm>(&mut self, confirm: C) {
        let id = match self.focus {
            ListKind::Active => self
                .visible_active()
                .get(self.selected_active)
                .map(|t| t.id.clone()),
            ListKind::Archived => self
                .visible_archived()
                .get(self.selected_archived)
                .map(|t| t.id.clone()),
        };
        let Some(id) = id else {
            return;
        };
        match self
            .engine
            .delete_todo(&mut self.mirrors, &id, self.focus, confirm)
        {
            Ok(Deletion::Deleted) => self.notify(NoticeLevel::Success, "Deleted"),
            Ok(Deletion::Declined) => {}
            Err(e) => self.report(&e),
        }
        self.clamp_selection();
    }
}
