use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs the global tracing subscriber once; `RUST_LOG` refines the filter.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = "sales_forecast=info".parse() {
            filter = filter.add_directive(directive);
        }

        // Another subscriber may already be installed by the host application
        let _ = fmt().with_env_filter(filter).try_init();
    });
}
