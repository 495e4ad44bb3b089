//! Command dispatch: hands decoded relay commands to the caller's handler.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;

/// A command pushed by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// `command_name` from the envelope.
    pub name: String,
    /// `parameters` from the envelope, empty when the relay sent none.
    pub parameters: String,
}

/// Implement this trait to act on relay commands.
///
/// Handlers run inline on the connection's receive task: the next inbound
/// message is not read until `on_command` returns, so long-running work
/// should be handed off (e.g. to a channel or `tokio::spawn`).
///
/// Any `Fn(Command)` closure is a handler:
///
/// ```rust,no_run
/// # use relay_client::{Command, RelayClientBuilder};
/// let client = RelayClientBuilder::new()
///     .endpoint("/tmp/iotconnect-relay.sock")
///     .client_id("sensor-1")
///     .command_handler(|cmd: Command| println!("{} {}", cmd.name, cmd.parameters))
///     .build()
///     .unwrap();
/// ```
#[async_trait::async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    async fn on_command(&self, command: Command);
}

#[async_trait::async_trait]
impl<F> CommandHandler for F
where
    F: Fn(Command) + Send + Sync + 'static,
{
    async fn on_command(&self, command: Command) {
        self(command)
    }
}

/// Routes commands to the registered handler, if any.
#[derive(Clone, Default)]
pub struct CommandDispatcher {
    handler: Option<Arc<dyn CommandHandler>>,
}

impl CommandDispatcher {
    pub fn new(handler: Option<Arc<dyn CommandHandler>>) -> Self {
        Self { handler }
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Run the handler to completion.  Returns `false` when there is no
    /// handler or it panicked; a panic never escapes into the receive loop.
    pub async fn dispatch(&self, command: Command) -> bool {
        let Some(handler) = &self.handler else {
            tracing::debug!(command = %command.name, "no command handler registered");
            return false;
        };

        let name = command.name.clone();
        match AssertUnwindSafe(handler.on_command(command))
            .catch_unwind()
            .await
        {
            Ok(()) => true,
            Err(_panic) => {
                tracing::error!(command = %name, "command handler panicked");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<Command>>,
    }

    #[async_trait::async_trait]
    impl CommandHandler for Recorder {
        async fn on_command(&self, command: Command) {
            self.seen.lock().unwrap().push(command);
        }
    }

    struct Panicker;

    #[async_trait::async_trait]
    impl CommandHandler for Panicker {
        async fn on_command(&self, _command: Command) {
            panic!("intentional");
        }
    }

    fn cmd(name: &str, parameters: &str) -> Command {
        Command {
            name: name.into(),
            parameters: parameters.into(),
        }
    }

    #[tokio::test]
    async fn forwards_name_and_parameters() {
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let handler: Arc<dyn CommandHandler> = recorder.clone();
        let d = CommandDispatcher::new(Some(handler));
        assert!(d.dispatch(cmd("X", "Y")).await);
        assert!(d.dispatch(cmd("Z", "")).await);
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![cmd("X", "Y"), cmd("Z", "")]
        );
    }

    #[tokio::test]
    async fn closures_are_handlers() {
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = names.clone();
        let handler: Arc<dyn CommandHandler> = Arc::new(move |c: Command| {
            sink.lock().unwrap().push(c.name);
        });
        let d = CommandDispatcher::new(Some(handler));
        assert!(d.dispatch(cmd("reboot", "")).await);
        assert_eq!(*names.lock().unwrap(), vec!["reboot".to_string()]);
    }

    #[tokio::test]
    async fn missing_handler_is_a_no_op() {
        let d = CommandDispatcher::default();
        assert!(!d.has_handler());
        assert!(!d.dispatch(cmd("X", "Y")).await);
    }

    #[tokio::test]
    async fn panicking_handler_is_contained() {
        let handler: Arc<dyn CommandHandler> = Arc::new(Panicker);
        let d = CommandDispatcher::new(Some(handler));
        assert!(!d.dispatch(cmd("X", "Y")).await);
        // Still usable afterwards.
        assert!(!d.dispatch(cmd("X", "Y")).await);
    }
}
