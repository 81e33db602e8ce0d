//! Handler for the `monitor` command.
//!
//! The terminal is owned by a dedicated thread. It renders the commands the
//! order monitor posts through its [`UiHandle`] and turns login prompts into
//! [`MonitorMessage::Login`] posts back onto the monitor's loop.

use std::sync::Arc;
use std::time::Duration;

use dialoguer::{Input, Password};
use parking_lot::Mutex;
use tokio::signal;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::app::{run_monitor, AuditLog, MonitorMessage, UiHandle, ViewCommand};
use crate::cli::{connector_for, output, MonitorArgs};
use crate::config::Config;
use crate::dispatcher::{Dispatcher, DispatcherHandle};
use crate::domain::Credentials;
use crate::error::Result;

/// How long to wait for the terminal thread to drain after close.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Terminal side of the monitor form.
pub struct Terminal<P> {
    dispatcher: DispatcherHandle<MonitorMessage>,
    prompt: P,
    log: Arc<Mutex<AuditLog>>,
    login_enabled: bool,
    awaiting_reply: bool,
}

impl<P> Terminal<P>
where
    P: FnMut() -> Result<Credentials>,
{
    pub fn new(
        dispatcher: DispatcherHandle<MonitorMessage>,
        prompt: P,
        log: Arc<Mutex<AuditLog>>,
    ) -> Self {
        Self {
            dispatcher,
            prompt,
            log,
            login_enabled: false,
            awaiting_reply: false,
        }
    }

    /// Render commands until the monitor closes or goes away.
    ///
    /// The login prompt is shown only once every queued command has been
    /// rendered, so status lines are never hidden behind it.
    pub fn run(mut self, mut commands: UnboundedReceiver<ViewCommand>) {
        loop {
            let command = match commands.try_recv() {
                Ok(command) => command,
                Err(TryRecvError::Empty) => {
                    if self.login_enabled && !self.awaiting_reply {
                        self.login();
                        continue;
                    }
                    match commands.blocking_recv() {
                        Some(command) => command,
                        None => break,
                    }
                }
                Err(TryRecvError::Disconnected) => break,
            };
            if !self.apply(command) {
                break;
            }
        }
    }

    /// Render one command. Returns `false` on close.
    fn apply(&mut self, command: ViewCommand) -> bool {
        match command {
            ViewCommand::ShowColumns(columns) => output::audit_header(&columns),
            ViewCommand::AppendRow(row) => {
                println!("{}", output::audit_line(&row.cells()));
                self.log.lock().append(row);
            }
            ViewCommand::SetStatus(text) => output::status(&text),
            ViewCommand::ShowMessage { title, text } => {
                output::message(&title, &text);
                self.awaiting_reply = false;
            }
            ViewCommand::SetLoginEnabled(enabled) => {
                self.login_enabled = enabled;
                self.awaiting_reply = false;
            }
            ViewCommand::Close => return false,
        }
        true
    }

    fn login(&mut self) {
        self.awaiting_reply = true;
        match (self.prompt)() {
            Ok(credentials) => {
                self.dispatcher.post(MonitorMessage::Login(credentials));
            }
            Err(e) => {
                warn!(error = %e, "Login prompt failed, closing");
                self.dispatcher.post(MonitorMessage::Close);
            }
        }
    }
}

/// Interactive username and password prompt.
fn prompt_login(default_username: Option<String>) -> impl FnMut() -> Result<Credentials> {
    move || {
        let mut input = Input::<String>::new()
            .with_prompt("Username")
            .allow_empty(true);
        if let Some(username) = &default_username {
            input = input.default(username.clone());
        }
        let username = input.interact_text()?;
        let password = Password::new()
            .with_prompt("Password")
            .allow_empty_password(true)
            .interact()?;
        Ok(Credentials::new(username, password))
    }
}

/// Execute the monitor command.
pub async fn execute(args: &MonitorArgs) -> Result<()> {
    let mut config = Config::load_or_default(&args.config)?;
    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }
    config.init_logging();

    let connector = connector_for(&config)?;
    info!(gateway = connector.name(), "gatewire monitor starting");
    output::header(env!("CARGO_PKG_VERSION"));

    let dispatcher = Dispatcher::new();
    let handle = dispatcher.handle();
    let (ui, commands) = UiHandle::channel();
    let log = Arc::new(Mutex::new(AuditLog::new()));

    let terminal = Terminal::new(
        handle.clone(),
        prompt_login(config.credentials.username.clone()),
        Arc::clone(&log),
    );
    let (done_tx, done_rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        terminal.run(commands);
        let _ = done_tx.send(());
    });

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            handle.post(MonitorMessage::Close);
        }
    });

    let rows = run_monitor(dispatcher, connector, ui).await;

    // A thread blocked in a prompt never finishes; it holds no rows.
    if done_rx.recv_timeout(DRAIN_TIMEOUT).is_err() {
        warn!("Terminal did not finish, skipping final drain");
    }
    let log = log.lock();
    if !log.is_empty() {
        output::section("Audit log");
        println!("{}", log.render());
    }
    info!(rows, "gatewire monitor stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::audit::rows_for;
    use crate::app::MonitorView;
    use crate::domain::{OrderEvent, OrderEventKind};
    use crate::error::Error;
    use crate::testkit::domain::order;
    use tokio::sync::mpsc;

    fn setup<P>(prompt: P) -> (Dispatcher<MonitorMessage>, Terminal<P>, Arc<Mutex<AuditLog>>)
    where
        P: FnMut() -> Result<Credentials>,
    {
        let dispatcher = Dispatcher::new();
        let log = Arc::new(Mutex::new(AuditLog::new()));
        let terminal = Terminal::new(dispatcher.handle(), prompt, Arc::clone(&log));
        (dispatcher, terminal, log)
    }

    /// Everything the terminal posted back to the monitor's loop.
    ///
    /// The terminal is gone by now, so the loop ends once the queue drains.
    async fn posted(dispatcher: Dispatcher<MonitorMessage>) -> Vec<MonitorMessage> {
        let mut seen = Vec::new();
        dispatcher.run(|m| seen.push(m)).await;
        seen
    }

    #[tokio::test]
    async fn queued_close_wins_over_prompt() {
        let (dispatcher, terminal, _log) = setup(|| unreachable!());
        let (mut ui, commands) = UiHandle::channel();
        ui.set_login_enabled(true);
        ui.set_status("Gateway ready, please log in");
        ui.close();

        terminal.run(commands);
        dispatcher.handle().begin_shutdown();
        assert_eq!(dispatcher.run(|_| {}).await, 0);
    }

    #[test]
    fn rows_are_kept_for_the_final_table() {
        let (_dispatcher, terminal, log) = setup(|| unreachable!());
        let (tx, commands) = mpsc::unbounded_channel();
        for row in rows_for(&OrderEvent::BookDownload(vec![order("1"), order("2")])) {
            tx.send(ViewCommand::AppendRow(row)).unwrap();
        }
        tx.send(ViewCommand::Close).unwrap();

        terminal.run(commands);

        let log = log.lock();
        assert_eq!(log.len(), 2);
        assert_eq!(log.rows()[0].event, OrderEventKind::BookDownload.as_str());
    }

    #[tokio::test]
    async fn prompt_failure_closes_the_form() {
        let (tx, commands) = mpsc::unbounded_channel();
        let ui = tx.clone();
        let (dispatcher, terminal, _log) = setup(move || {
            ui.send(ViewCommand::Close).unwrap();
            Err(Error::Io(std::io::Error::other("not a terminal")))
        });
        tx.send(ViewCommand::SetLoginEnabled(true)).unwrap();

        terminal.run(commands);

        let messages = posted(dispatcher).await;
        assert!(matches!(messages.as_slice(), [MonitorMessage::Close]));
    }

    #[tokio::test]
    async fn message_re_arms_the_prompt() {
        let (tx, commands) = mpsc::unbounded_channel();
        let ui = tx.clone();
        let mut attempts = 0;
        let (dispatcher, terminal, _log) = setup(move || {
            attempts += 1;
            let next = if attempts == 1 {
                ViewCommand::ShowMessage {
                    title: "Login".into(),
                    text: "Please enter a password".into(),
                }
            } else {
                ViewCommand::Close
            };
            ui.send(next).unwrap();
            Ok(Credentials::new(format!("user{attempts}"), "pw"))
        });
        tx.send(ViewCommand::SetLoginEnabled(true)).unwrap();

        terminal.run(commands);

        let users: Vec<_> = posted(dispatcher)
            .await
            .into_iter()
            .filter_map(|m| match m {
                MonitorMessage::Login(credentials) => Some(credentials.username),
                _ => None,
            })
            .collect();
        assert_eq!(users, vec!["user1", "user2"]);
    }

    #[test]
    fn disabled_login_is_not_prompted() {
        let (_dispatcher, terminal, _log) = setup(|| unreachable!());
        let (tx, commands) = mpsc::unbounded_channel();
        tx.send(ViewCommand::SetLoginEnabled(true)).unwrap();
        tx.send(ViewCommand::SetLoginEnabled(false)).unwrap();
        tx.send(ViewCommand::Close).unwrap();

        terminal.run(commands);
    }
}
