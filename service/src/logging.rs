use crate::config::Config;
use log::{LevelFilter, SetLoggerError};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Module prefixes muted below `TRACE`. simplelog matches these as prefixes,
/// so `tower` also covers `tower_http` and `hyper` covers `hyper_util`.
const QUIET_DEPENDENCIES: &[&str] = &["axum", "h2", "hyper", "redis", "tower"];

/// Installs the terminal logger at the configured level.
pub fn init(config: &Config) -> Result<(), SetLoggerError> {
    TermLogger::init(
        config.log_level_filter,
        log_config(config.log_level_filter),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
}

fn log_config(level: LevelFilter) -> simplelog::Config {
    let mut builder = ConfigBuilder::new();
    builder.set_time_format_rfc3339();
    if level != LevelFilter::Trace {
        for module in QUIET_DEPENDENCIES {
            builder.add_filter_ignore_str(module);
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn muted(module: &str) -> bool {
        QUIET_DEPENDENCIES
            .iter()
            .any(|prefix| module.starts_with(prefix))
    }

    #[test]
    fn transport_and_relay_dependencies_are_muted() {
        for module in [
            "tower_http::cors",
            "hyper_util::client",
            "h2::codec",
            "axum::serve",
            "redis::aio",
        ] {
            assert!(muted(module), "{module} should be muted");
        }
    }

    #[test]
    fn workspace_crates_keep_their_logs() {
        for module in [
            "sse::manager",
            "relay",
            "domain::order",
            "web::sse::handler",
            "service",
            "rayex_platform",
        ] {
            assert!(!muted(module), "{module} must not be muted");
        }
    }

    #[test]
    fn log_config_builds_at_every_level() {
        for level in [LevelFilter::Info, LevelFilter::Debug, LevelFilter::Trace] {
            let _config = log_config(level);
        }
    }
}
