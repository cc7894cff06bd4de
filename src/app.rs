//! The root application: a counter next to the posts list.
//!
//! The counter is client state and lives in a [`Store`]. The posts are
//! server state: the app only holds the latest [`QueryResult`] its query
//! subscription delivered, and the [`QueryClient`] owns the cache.

use std::io;
use std::sync::Arc;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::FutureExt;
use futures::future::BoxFuture;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::config::AppConfig;
use crate::posts::{POSTS_QUERY_KEY, PostPage, fetch_posts};
use crate::prelude::*;
use crate::store::counter::{CounterAction, CounterReducer, CounterState};
use crate::subscription::http::{Fetcher, Query, QueryClient, QueryError, QueryResult};
use crate::subscription::terminal::TerminalEvents;
use crate::subscription::time::Timer;
use crate::view::{AmountPrompt, CounterView, Panel, PostsView};

/// Everything [`App`] reacts to.
#[derive(Debug)]
pub enum Message {
    Terminal(Event),
    TerminalError(io::Error),
    Posts(QueryResult<PostPage>),
    SpinnerTick,
    Counter(CounterAction),
    OpenPrompt,
    PromptInput(char),
    PromptBackspace,
    PromptSubmit,
    PromptCancel,
    RetryPosts,
    ScrollUp,
    ScrollDown,
    Quit,
}

/// Startup data for [`App`].
#[derive(Clone)]
pub struct Flags {
    pub client: Arc<QueryClient>,
    pub fetcher: Fetcher<PostPage>,
    pub spinner_interval_ms: u64,
}

impl Flags {
    pub fn new(client: Arc<QueryClient>, fetcher: Fetcher<PostPage>) -> Self {
        Self {
            client,
            fetcher,
            spinner_interval_ms: AppConfig::default().spinner_interval_ms,
        }
    }

    /// Flags fetching from the live API with `config`.
    pub fn remote(config: &AppConfig) -> Self {
        let http = reqwest::Client::new();
        let fetcher: Fetcher<PostPage> =
            Arc::new(move || -> BoxFuture<'static, Result<PostPage, QueryError>> {
                let http = http.clone();
                async move { fetch_posts(&http).await }.boxed()
            });

        Self {
            client: Arc::new(QueryClient::with_config(config.query)),
            fetcher,
            spinner_interval_ms: config.spinner_interval_ms,
        }
    }
}

pub struct App {
    store: Store<CounterReducer>,
    prompt: Option<AmountPrompt>,
    posts: QueryResult<PostPage>,
    client: Arc<QueryClient>,
    fetcher: Fetcher<PostPage>,
    spinner_interval_ms: u64,
    spinner_tick: usize,
    scroll: u16,
}

impl App {
    pub const fn counter(&self) -> &CounterState {
        self.store.state()
    }

    pub const fn posts(&self) -> &QueryResult<PostPage> {
        &self.posts
    }

    pub const fn prompt(&self) -> Option<&AmountPrompt> {
        self.prompt.as_ref()
    }

    pub const fn scroll(&self) -> u16 {
        self.scroll
    }

    /// Whether the spinner is on screen.
    fn animating(&self) -> bool {
        self.posts.is_fetching() || matches!(Panel::of(&self.posts), Panel::Loading)
    }

    fn key_message(&self, key: KeyEvent) -> Option<Message> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Message::Quit);
        }

        if self.prompt.is_some() {
            return match key.code {
                KeyCode::Enter => Some(Message::PromptSubmit),
                KeyCode::Esc => Some(Message::PromptCancel),
                KeyCode::Backspace => Some(Message::PromptBackspace),
                KeyCode::Char(c) => Some(Message::PromptInput(c)),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Char('+' | '=') => Some(Message::Counter(CounterAction::Increment)),
            KeyCode::Char('-') => Some(Message::Counter(CounterAction::Decrement)),
            KeyCode::Char('r') => Some(Message::Counter(CounterAction::Reset)),
            KeyCode::Char('a') => Some(Message::OpenPrompt),
            KeyCode::Char('t') => Some(Message::RetryPosts),
            KeyCode::Up => Some(Message::ScrollUp),
            KeyCode::Down => Some(Message::ScrollDown),
            KeyCode::Char('q') | KeyCode::Esc => Some(Message::Quit),
            _ => None,
        }
    }
}

impl Application for App {
    type Message = Message;
    type Flags = Flags;

    fn new(flags: Flags) -> (Self, Command<Message>) {
        let mut store = Store::<CounterReducer>::new();
        store.subscribe(|state: &CounterState| {
            tracing::debug!(value = state.value, is_loading = state.is_loading, "counter changed");
        });

        let app = Self {
            store,
            prompt: None,
            posts: QueryResult::idle(),
            client: flags.client,
            fetcher: flags.fetcher,
            spinner_interval_ms: flags.spinner_interval_ms,
            spinner_tick: 0,
            scroll: 0,
        };
        (app, Command::none())
    }

    fn update(&mut self, msg: Message) -> Command<Message> {
        match msg {
            Message::Terminal(Event::Key(key)) => match self.key_message(key) {
                Some(msg) => self.update(msg),
                None => Command::none(),
            },
            Message::Terminal(Event::FocusGained) => self.client.window_focused(),
            Message::Terminal(_) => Command::none(),
            Message::TerminalError(e) => {
                tracing::error!(error = %e, "terminal input failed");
                Command::effect(Action::Quit)
            }
            Message::Posts(result) => {
                self.posts = result;
                Command::none()
            }
            Message::SpinnerTick => {
                self.spinner_tick = self.spinner_tick.wrapping_add(1);
                Command::none()
            }
            Message::Counter(action) => {
                self.store.dispatch(action);
                Command::none()
            }
            Message::OpenPrompt => {
                self.prompt = Some(AmountPrompt::new());
                Command::none()
            }
            Message::PromptInput(c) => {
                if let Some(prompt) = &mut self.prompt {
                    prompt.push(c);
                }
                Command::none()
            }
            Message::PromptBackspace => {
                if let Some(prompt) = &mut self.prompt {
                    prompt.backspace();
                }
                Command::none()
            }
            Message::PromptSubmit => {
                if let Some(amount) = self.prompt.take().and_then(|prompt| prompt.submit()) {
                    self.store.dispatch(CounterAction::IncrementByAmount(amount));
                }
                Command::none()
            }
            Message::PromptCancel => {
                self.prompt = None;
                Command::none()
            }
            Message::RetryPosts => self.client.refetch(&POSTS_QUERY_KEY),
            Message::ScrollUp => {
                self.scroll = self.scroll.saturating_sub(1);
                Command::none()
            }
            Message::ScrollDown => {
                self.scroll = self.scroll.saturating_add(1);
                Command::none()
            }
            Message::Quit => Command::effect(Action::Quit),
        }
    }

    fn view(&self, frame: &mut Frame<'_>) {
        let counter_height = if self.prompt.is_some() { 9 } else { 6 };
        let [title, counter, posts, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(counter_height),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        frame.render_widget(
            Paragraph::new("Client state and server state".bold()).centered(),
            title,
        );
        frame.render_widget(
            CounterView::new(self.store.state()).prompt(self.prompt.as_ref()),
            counter,
        );
        frame.render_widget(
            PostsView::new(&self.posts)
                .scroll(self.scroll)
                .tick(self.spinner_tick),
            posts,
        );
        frame.render_widget(
            Paragraph::new("q quit   t retry posts   Up/Down scroll".dark_gray()).centered(),
            footer,
        );
    }

    fn subscriptions(&self) -> Vec<Subscription<Message>> {
        let mut subs = vec![
            Subscription::new(TerminalEvents::new()).map(|result| match result {
                Ok(event) => Message::Terminal(event),
                Err(e) => Message::TerminalError(e),
            }),
            Subscription::new(Query::from_fetcher(
                &POSTS_QUERY_KEY,
                self.fetcher.clone(),
                self.client.clone(),
            ))
            .map(Message::Posts),
        ];

        if self.animating() {
            subs.push(
                Subscription::new(Timer::new(self.spinner_interval_ms)).map(|_| Message::SpinnerTick),
            );
        }

        subs
    }
}
