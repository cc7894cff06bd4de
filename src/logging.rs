use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming the log file.
pub const LOG_ENV: &str = "TALLY_LOG";

/// Installs file logging if `TALLY_LOG` is set.
///
/// Without it nothing is installed, so no output can reach the terminal
/// the UI draws on. The file is named `{path}.{timestamp}.{pid}` so that
/// concurrent instances do not clobber each other. `RUST_LOG` selects the
/// filter and defaults to `info`.
pub fn init_tracing() {
    let Ok(log_path) = std::env::var(LOG_ENV) else {
        return;
    };

    let unique_path = unique_log_path(&log_path);
    let Ok(file) = std::fs::File::create(&unique_path) else {
        eprintln!("Warning: Failed to create log file: {unique_path}");
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();
    if installed.is_err() {
        eprintln!("Warning: a tracing subscriber is already installed");
    }
}

fn unique_log_path(base: &str) -> String {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{base}.{timestamp}.{}", std::process::id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_log_path() {
        let path = unique_log_path("/tmp/tally.log");
        let suffix = format!(".{}", std::process::id());
        assert!(path.starts_with("/tmp/tally.log."));
        assert!(path.ends_with(&suffix));
    }
}
