//! Logger configuration.

use std::fs::{self, OpenOptions};
use std::str::FromStr;

use tracing::{debug, info, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{filter, Layer, Registry};

use crate::config::ApiConfig;

/// Sets the global tracing subscriber from the log fields of `config`.
/// * `log_level` - TRACE, DEBUG, INFO, WARN or ERROR (falls back to INFO).
/// * `log_to_stdout` - compact, colored console layer.
/// * `log_to_file` - plain compact layer appended to `log_dir/log_file`.
/// # Usage
/// Call once at the start of the application.
/// ```no_run
/// use leadrelay::{config::ApiConfig, logger::set_logger};
/// let config = ApiConfig::from_env().unwrap();
/// set_logger(&config).unwrap();
/// ```
/// # Errors
/// 1) Returns an error if the log directory cannot be created or the log file cannot be opened.
/// 2) Returns an error if the global subscriber cannot be set.
pub fn set_logger(config: &ApiConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ll = Level::from_str(&config.log_level).unwrap_or(Level::INFO);
    let lf = filter::LevelFilter::from_level(ll);

    let lys = config.log_to_stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi(true)
            .with_filter(lf)
    });

    let path = format!("{}/{}", config.log_dir, config.log_file);
    let lyf = if config.log_to_file {
        fs::create_dir_all(&config.log_dir)?;
        let f = OpenOptions::new().append(true).create(true).open(&path)?;
        Some(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(false)
                .with_writer(f)
                .with_filter(lf),
        )
    } else {
        None
    };

    const BANNER: &str = r#"
|-------------------------------------|
|  _                 _                |
| | | ___  __ _  __| |  _ __ ___| |   |
| | |/ _ \/ _` |/ _` | | '__/ _ \ |   |
| | |  __/ (_| | (_| | | | |  __/ |   |
| |_|\___|\__,_|\__,_| |_|  \___|_|   |
|----------- lead relay --------------|
    "#;
    let s = Registry::default().with(lys).with(lyf);
    tracing::subscriber::set_global_default(s)?;
    info!("{}", BANNER);
    info!("Logger initialized, log level set to: {}", ll);
    if config.log_to_stdout {
        debug!("Logging to stdout.")
    }
    if config.log_to_file {
        debug!("Logging to file: {}", path)
    }
    Ok(())
}
