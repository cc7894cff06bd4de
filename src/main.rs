use color_eyre::eyre::Result;
use crossterm::event::{DisableFocusChange, EnableFocusChange};
use crossterm::execute;

use tally::app::{App, Flags};
use tally::config::AppConfig;
use tally::logging::init_tracing;
use tally::runtime::Runtime;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let config = AppConfig::default();
    tracing::info!(?config, "starting");

    let mut terminal = ratatui::init();
    execute!(std::io::stdout(), EnableFocusChange)?;

    let result = Runtime::<App>::new(Flags::remote(&config), config.frame_rate)
        .run(&mut terminal)
        .await;

    // Restore the terminal before any error is reported.
    let _ = execute!(std::io::stdout(), DisableFocusChange);
    ratatui::restore();

    result
}
