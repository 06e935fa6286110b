use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "arrangement=info,arrangement_engine=info";
const VERBOSE_FILTER: &str = "arrangement=debug,arrangement_engine=debug";

/// Log to stderr so stdout carries only command output. `RUST_LOG` wins
/// over `verbose`.
pub fn init(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // A second init (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
