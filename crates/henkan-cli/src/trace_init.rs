use std::sync::Once;

static INIT: Once = Once::new();

/// Log to stderr, filtered by `RUST_LOG` (default `henkan_core=info`).
/// Only the first call has an effect.
pub fn init_tracing(json: bool) {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("henkan_core=info,henkan_cli=info"));
        let builder = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_env_filter(filter);
        if json {
            builder.json().init();
        } else {
            builder.init();
        }
    });
}
