use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Logs go to stderr so stdout only carries results. `RUST_LOG` wins over
/// `verbose`.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "warn,buildtime_cli=debug,buildtime_core=debug,buildtime_watch=debug,buildtime_log_processor=debug,buildtime_build_index=debug"
    } else {
        "warn,buildtime_cli=info,buildtime_core=info,buildtime_watch=info,buildtime_log_processor=info,buildtime_build_index=info"
    };

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
