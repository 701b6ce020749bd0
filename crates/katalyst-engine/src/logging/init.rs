use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "katalyst_engine=trace,wgpu_core=warn"). When unset, `RUST_LOG` is used,
/// then `default_level`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub default_level: log::LevelFilter,
    /// Caps wgpu/naga internals at `warn` unless a filter overrides them.
    pub quiet_gpu_backend: bool,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: log::LevelFilter::Info,
            quiet_gpu_backend: true,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

const GPU_BACKEND_MODULES: [&str; 4] = ["wgpu_core", "wgpu_hal", "naga", "wgpu"];

static INIT: Once = Once::new();

/// Initializes the global logger. Subsequent calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(config.default_level);

        if config.quiet_gpu_backend {
            for module in GPU_BACKEND_MODULES {
                builder.filter_module(module, log::LevelFilter::Warn);
            }
        }

        // Explicit filters are parsed last so they win over the defaults above.
        if let Some(filter) = config.env_filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        }

        builder.write_style(config.write_style);

        if builder.try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}
