//! A [`MonitorView`] that records what the monitor asked for.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::app::{AuditRow, MonitorView, ViewCommand};

/// Thread-safe command recorder; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    commands: Arc<Mutex<Vec<ViewCommand>>>,
}

impl RecordingView {
    pub fn commands(&self) -> Vec<ViewCommand> {
        self.commands.lock().clone()
    }

    /// Rows appended so far, in order.
    pub fn rows(&self) -> Vec<AuditRow> {
        self.commands
            .lock()
            .iter()
            .filter_map(|c| match c {
                ViewCommand::AppendRow(row) => Some(row.clone()),
                _ => None,
            })
            .collect()
    }

    /// Text of every modal message shown.
    pub fn messages(&self) -> Vec<String> {
        self.commands
            .lock()
            .iter()
            .filter_map(|c| match c {
                ViewCommand::ShowMessage { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Latest status bar text.
    pub fn status(&self) -> Option<String> {
        self.commands.lock().iter().rev().find_map(|c| match c {
            ViewCommand::SetStatus(text) => Some(text.clone()),
            _ => None,
        })
    }

    /// Latest login control state.
    pub fn login_enabled(&self) -> Option<bool> {
        self.commands.lock().iter().rev().find_map(|c| match c {
            ViewCommand::SetLoginEnabled(enabled) => Some(*enabled),
            _ => None,
        })
    }

    fn push(&self, command: ViewCommand) {
        self.commands.lock().push(command);
    }
}

impl MonitorView for RecordingView {
    fn show_columns(&mut self, columns: &[&'static str]) {
        self.push(ViewCommand::ShowColumns(columns.to_vec()));
    }

    fn append_row(&mut self, row: AuditRow) {
        self.push(ViewCommand::AppendRow(row));
    }

    fn set_status(&mut self, text: &str) {
        self.push(ViewCommand::SetStatus(text.to_string()));
    }

    fn show_message(&mut self, title: &str, text: &str) {
        self.push(ViewCommand::ShowMessage {
            title: title.to_string(),
            text: text.to_string(),
        });
    }

    fn set_login_enabled(&mut self, enabled: bool) {
        self.push(ViewCommand::SetLoginEnabled(enabled));
    }

    fn close(&mut self) {
        self.push(ViewCommand::Close);
    }
}
