use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` selects the filter; `MOODMIX_LOG_JSON=1` (or `true`) switches
/// to one JSON object per line. Calling it twice is harmless: the second
/// install fails and is ignored.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let result = if json_logs_enabled() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_current_span(false))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_thread_ids(false))
            .try_init()
    };

    if let Err(err) = result {
        tracing::debug!(error = %err, "tracing subscriber already installed");
    }
}

fn json_logs_enabled() -> bool {
    std::env::var("MOODMIX_LOG_JSON")
        .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Stable label of an error variant for structured log fields.
pub const fn error_label(error: &moodmix_domain::MoodmixError) -> &'static str {
    use moodmix_domain::MoodmixError;

    match error {
        MoodmixError::Config(_) => "config",
        MoodmixError::Storage(_) => "storage",
        MoodmixError::Network(_) => "network",
        MoodmixError::Auth(_) => "auth",
        MoodmixError::NotFound(_) => "not_found",
        MoodmixError::InvalidInput(_) => "invalid_input",
        MoodmixError::Internal(_) => "internal",
    }
}
