use std::time::Duration;

use color_eyre::eyre::Result;
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::prelude::Backend;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};

use crate::application::Application;
use crate::command::{Action, Command};
use crate::subscription::SubscriptionManager;

/// The event loop driving an [`Application`].
///
/// Messages are handed to `update` one at a time in arrival order. Each
/// command returned from `new` or `update` runs on its own task and feeds
/// its actions back through a channel; subscriptions are re-synced after
/// every update. The view is redrawn at the configured frame rate.
pub struct Runtime<A: Application> {
    app: A,
    init: Option<Command<A::Message>>,
    frame_duration: Duration,
    tx: mpsc::UnboundedSender<Action<A::Message>>,
    rx: mpsc::UnboundedReceiver<Action<A::Message>>,
    subscriptions: SubscriptionManager<Action<A::Message>>,
}

impl<A: Application> Runtime<A> {
    /// Initializes the application with `flags`.
    ///
    /// The initial command is held until [`run`](Self::run) so that no task is
    /// spawned before the runtime is actually driven.
    pub fn new(flags: A::Flags, frame_rate: u32) -> Self {
        let (app, init) = A::new(flags);
        let (tx, rx) = mpsc::unbounded_channel();
        let subscriptions = SubscriptionManager::new(tx.clone());

        Self {
            app,
            init: Some(init),
            frame_duration: Duration::from_secs(1) / frame_rate.max(1),
            tx,
            rx,
            subscriptions,
        }
    }

    /// Returns the application state.
    pub const fn app(&self) -> &A {
        &self.app
    }

    /// Runs the application until a command emits [`Action::Quit`].
    ///
    /// On exit every running subscription is cancelled. Commands already in
    /// flight are left to finish on their own; their results are discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing to the terminal fails.
    pub async fn run<B: Backend>(mut self, terminal: &mut Terminal<B>) -> Result<()> {
        if let Some(init) = self.init.take() {
            self.execute(init);
        }
        self.sync_subscriptions();

        let mut frames = interval(self.frame_duration);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                action = self.rx.recv() => match action {
                    Some(Action::Message(msg)) => {
                        let cmd = self.app.update(msg);
                        self.execute(cmd);
                        self.sync_subscriptions();
                    }
                    Some(Action::Quit) | None => break,
                },
                _ = frames.tick() => {
                    terminal.draw(|frame| self.app.view(frame))?;
                }
            }
        }

        tracing::debug!("runtime stopping");
        self.subscriptions.shutdown();
        Ok(())
    }

    /// Spawns `cmd` and forwards everything it yields.
    fn execute(&self, cmd: Command<A::Message>) {
        let Some(mut stream) = cmd.stream else {
            return;
        };

        let tx = self.tx.clone();
        tokio::spawn(async move {
            while let Some(action) = stream.next().await {
                if tx.send(action).is_err() {
                    break;
                }
            }
        });
    }

    fn sync_subscriptions(&mut self) {
        let subscriptions = self
            .app
            .subscriptions()
            .into_iter()
            .map(|subscription| subscription.map(Action::Message))
            .collect();
        self.subscriptions.update(subscriptions);
    }
}
