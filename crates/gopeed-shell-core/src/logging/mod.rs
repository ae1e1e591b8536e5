use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are shown when `RUST_LOG` is unset.
const SHELL_TARGETS: [&str; 2] = ["gopeed_shell", "gopeed_shell_core"];

/// Initialize JSON logging on stderr. Stdout stays reserved for command output.
///
/// `RUST_LOG` takes precedence when set. Otherwise the shell's own events
/// are emitted at info level, or only errors when `quiet` is true.
pub fn init_logging(quiet: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(shell_filter(rust_log.as_deref(), quiet))
        .init();
}

fn shell_filter(rust_log: Option<&str>, quiet: bool) -> EnvFilter {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("Ignoring invalid RUST_LOG '{}': {}", directives, e),
        }
    }

    let level = if quiet { "error" } else { "info" };
    let directives: Vec<String> = SHELL_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect();
    EnvFilter::new(directives.join(","))
}
