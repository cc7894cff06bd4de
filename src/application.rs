use ratatui::Frame;

use crate::{command::Command, subscription::Subscription};

/// A terminal application following the Elm Architecture.
///
/// The [`Runtime`](crate::runtime::Runtime) owns the value implementing this
/// trait and is the only caller of its methods: `update` and `view` are never
/// called concurrently, so implementations can hold plain owned state.
///
/// # Example
///
/// ```
/// use ratatui::Frame;
/// use ratatui::widgets::Paragraph;
/// use tally::prelude::*;
///
/// #[derive(Debug, Clone)]
/// enum Message {
///     Increment,
///     Decrement,
/// }
///
/// struct Counter {
///     value: i64,
/// }
///
/// impl Application for Counter {
///     type Message = Message;
///     type Flags = i64;
///
///     fn new(initial: i64) -> (Self, Command<Message>) {
///         (Counter { value: initial }, Command::none())
///     }
///
///     fn update(&mut self, msg: Message) -> Command<Message> {
///         match msg {
///             Message::Increment => self.value += 1,
///             Message::Decrement => self.value -= 1,
///         }
///         Command::none()
///     }
///
///     fn view(&self, frame: &mut Frame<'_>) {
///         frame.render_widget(Paragraph::new(self.value.to_string()), frame.area());
///     }
///
///     fn subscriptions(&self) -> Vec<Subscription<Message>> {
///         vec![]
///     }
/// }
/// ```
pub trait Application: Sized {
    /// Every event the application reacts to.
    ///
    /// Messages come from subscriptions (input, timers, queries) and from
    /// the commands returned by `new` and `update`.
    type Message: Send + 'static;

    /// Data handed to [`new`](Self::new). Use `()` if none is needed.
    type Flags: Clone + Send;

    /// Builds the initial state and a command to run once the runtime starts.
    fn new(flags: Self::Flags) -> (Self, Command<Self::Message>);

    /// Processes one message.
    ///
    /// All state changes happen here. The returned command runs in the
    /// background; use [`Command::none`] when there is nothing to do.
    fn update(&mut self, msg: Self::Message) -> Command<Self::Message>;

    /// Renders the current state. Must not change it.
    fn view(&self, frame: &mut Frame<'_>);

    /// The event sources the application currently wants.
    ///
    /// Called after every update. The runtime compares the result with the
    /// running set by [`SubscriptionId`](crate::subscription::SubscriptionId),
    /// so returning a subscription conditionally is how it is started and
    /// stopped:
    ///
    /// ```
    /// # use tally::prelude::*;
    /// # use ratatui::Frame;
    /// # use tally::subscription::time::Timer;
    /// # struct App { loading: bool }
    /// # enum Message { Tick }
    /// # impl Application for App {
    /// #     type Message = Message;
    /// #     type Flags = ();
    /// #     fn new(_: ()) -> (Self, Command<Message>) { (App { loading: true }, Command::none()) }
    /// #     fn update(&mut self, _: Message) -> Command<Message> { Command::none() }
    /// #     fn view(&self, _: &mut Frame<'_>) {}
    /// fn subscriptions(&self) -> Vec<Subscription<Message>> {
    ///     let mut subs = vec![];
    ///     if self.loading {
    ///         subs.push(Subscription::new(Timer::new(100)).map(|_| Message::Tick));
    ///     }
    ///     subs
    /// }
    /// # }
    /// ```
    fn subscriptions(&self) -> Vec<Subscription<Self::Message>>;
}
