//! Monitor presentation capability.
//!
//! The order monitor never touches the terminal itself. It drives a
//! [`MonitorView`]; in the binary that view is a [`UiHandle`] which posts
//! [`ViewCommand`]s to the thread that owns the terminal.

use tokio::sync::mpsc;
use tracing::debug;

use super::audit::AuditRow;

/// One rendering task for the UI owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    ShowColumns(Vec<&'static str>),
    AppendRow(AuditRow),
    SetStatus(String),
    ShowMessage { title: String, text: String },
    SetLoginEnabled(bool),
    Close,
}

/// What the order monitor can do to its form.
pub trait MonitorView {
    fn show_columns(&mut self, columns: &[&'static str]);

    fn append_row(&mut self, row: AuditRow);

    /// Replace the status bar text.
    fn set_status(&mut self, text: &str);

    /// Modal message, e.g. a login failure.
    fn show_message(&mut self, title: &str, text: &str);

    fn set_login_enabled(&mut self, enabled: bool);

    fn close(&mut self) {}
}

/// Thread-safe view that marshals every call onto the UI owner.
#[derive(Debug, Clone)]
pub struct UiHandle {
    tx: mpsc::UnboundedSender<ViewCommand>,
}

impl UiHandle {
    /// Create a handle and the receiver the UI owner drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ViewCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn post(&self, command: ViewCommand) {
        if self.tx.send(command).is_err() {
            debug!("UI owner gone, dropping view command");
        }
    }
}

impl MonitorView for UiHandle {
    fn show_columns(&mut self, columns: &[&'static str]) {
        self.post(ViewCommand::ShowColumns(columns.to_vec()));
    }

    fn append_row(&mut self, row: AuditRow) {
        self.post(ViewCommand::AppendRow(row));
    }

    fn set_status(&mut self, text: &str) {
        self.post(ViewCommand::SetStatus(text.to_string()));
    }

    fn show_message(&mut self, title: &str, text: &str) {
        self.post(ViewCommand::ShowMessage {
            title: title.to_string(),
            text: text.to_string(),
        });
    }

    fn set_login_enabled(&mut self, enabled: bool) {
        self.post(ViewCommand::SetLoginEnabled(enabled));
    }

    fn close(&mut self) {
        self.post(ViewCommand::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ui_handle_posts_in_call_order() {
        let (mut ui, mut rx) = UiHandle::channel();
        ui.set_status("Login Status: Success");
        ui.set_login_enabled(false);
        ui.close();

        assert_eq!(
            rx.try_recv().unwrap(),
            ViewCommand::SetStatus("Login Status: Success".into())
        );
        assert_eq!(rx.try_recv().unwrap(), ViewCommand::SetLoginEnabled(false));
        assert_eq!(rx.try_recv().unwrap(), ViewCommand::Close);
    }

    #[test]
    fn marshals_from_another_thread() {
        let (ui, mut rx) = UiHandle::channel();
        let mut remote = ui.clone();
        std::thread::spawn(move || remote.set_status("from worker"))
            .join()
            .unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            ViewCommand::SetStatus("from worker".into())
        );
    }

    #[test]
    fn dropped_owner_is_tolerated() {
        let (mut ui, rx) = UiHandle::channel();
        drop(rx);
        ui.set_status("nobody listening");
    }
}
