//! Categorized logging on top of the `log` facade.
//!
//! Every crate registers the targets it logs to as categories, each with its
//! own verbosity. Records whose target is not a registered category fall back
//! to the `RUST_LOG` filter handled by `env_logger`.

use std::{
    collections::BTreeMap,
    sync::{
        OnceLock, PoisonError, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};

use log::{LevelFilter, Log, Metadata, Record};

static CATEGORIES: RwLock<BTreeMap<String, LevelFilter>> = RwLock::new(BTreeMap::new());
static ACTIVE: AtomicBool = AtomicBool::new(false);
static INSTALLED: OnceLock<()> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("unknown log category: {0}")]
    UnknownCategory(String),
    #[error("another logger is already installed: {0}")]
    AlreadyInstalled(#[from] log::SetLoggerError),
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Verbosity for targets that are not registered categories.
    pub level: LevelFilter,
    /// Verbosity overrides per category.
    pub categories: BTreeMap<String, LevelFilter>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            categories: BTreeMap::new(),
        }
    }
}

/// Registers a category. Registering an existing category keeps its current
/// verbosity.
pub fn register_category(name: &str, verbosity: LevelFilter) {
    CATEGORIES
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(name.to_owned())
        .or_insert(verbosity);
}

pub fn set_category_verbosity(name: &str, verbosity: LevelFilter) -> Result<(), LogError> {
    let mut categories = CATEGORIES.write().unwrap_or_else(PoisonError::into_inner);
    let level = categories
        .get_mut(name)
        .ok_or_else(|| LogError::UnknownCategory(name.to_owned()))?;

    *level = verbosity;
    Ok(())
}

pub fn category_verbosity(name: &str) -> Option<LevelFilter> {
    CATEGORIES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .copied()
}

/// Returns the verbosity of the category that owns `target`, if any.
///
/// A category owns its exact name and every `name::` sub-target.
fn resolve_target(target: &str) -> Option<LevelFilter> {
    let categories = CATEGORIES.read().unwrap_or_else(PoisonError::into_inner);

    categories
        .iter()
        .filter(|(name, _)| {
            target == name.as_str()
                || target
                    .strip_prefix(name.as_str())
                    .is_some_and(|rest| rest.starts_with("::"))
        })
        .max_by_key(|(name, _)| name.len())
        .map(|(_, level)| *level)
}

/// Installs the logger and applies `config`.
///
/// Safe to call more than once: later calls re-apply the category overrides
/// and re-activate a logger that was [`shutdown`]. The fallback filter is
/// fixed by the first call.
pub fn init(config: &LogConfig) -> Result<(), LogError> {
    for (name, level) in &config.categories {
        register_category(name, *level);
        set_category_verbosity(name, *level)?;
    }

    if INSTALLED.get().is_none() {
        let logger = CategoryLogger::new(config.level);
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(LevelFilter::Trace);
        let _ = INSTALLED.set(());
    }

    ACTIVE.store(true, Ordering::Release);
    Ok(())
}

/// Flushes pending output and stops emitting records until the next
/// [`init`].
pub fn shutdown() {
    log::logger().flush();
    ACTIVE.store(false, Ordering::Release);
}

pub fn is_active() -> bool {
    ACTIVE.load(Ordering::Acquire)
}

struct CategoryLogger {
    /// Formats and writes every record that passed filtering.
    writer: env_logger::Logger,
    /// Filters targets that are not categories.
    fallback: env_logger::Logger,
}

impl CategoryLogger {
    fn new(level: LevelFilter) -> Self {
        let writer = env_logger::Builder::new()
            .filter_level(LevelFilter::Trace)
            .build();
        // `RUST_LOG` directives win over the configured level.
        let fallback = env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .build();

        Self { writer, fallback }
    }
}

impl Log for CategoryLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if !is_active() {
            return false;
        }

        match resolve_target(metadata.target()) {
            Some(level) => metadata.level() <= level,
            None => self.fallback.enabled(metadata),
        }
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.writer.log(record);
        }
    }

    fn flush(&self) {
        self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_category_keeps_existing_verbosity() {
        register_category("test-keep", LevelFilter::Warn);
        set_category_verbosity("test-keep", LevelFilter::Trace).unwrap();
        register_category("test-keep", LevelFilter::Error);

        assert_eq!(category_verbosity("test-keep"), Some(LevelFilter::Trace));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let error = set_category_verbosity("test-never-registered", LevelFilter::Debug);
        assert!(matches!(error, Err(LogError::UnknownCategory(name)) if name == "test-never-registered"));
    }

    #[test]
    fn test_sub_targets_resolve_to_longest_category() {
        register_category("test-gpu", LevelFilter::Warn);
        register_category("test-gpu::alloc", LevelFilter::Trace);

        assert_eq!(resolve_target("test-gpu"), Some(LevelFilter::Warn));
        assert_eq!(resolve_target("test-gpu::swapchain"), Some(LevelFilter::Warn));
        assert_eq!(resolve_target("test-gpu::alloc"), Some(LevelFilter::Trace));
        assert_eq!(resolve_target("test-gpuish"), None);
    }

    #[test]
    fn test_init_is_idempotent_and_shutdown_deactivates() {
        let config = LogConfig {
            level: LevelFilter::Warn,
            categories: BTreeMap::from([("test-init".to_owned(), LevelFilter::Debug)]),
        };

        init(&config).unwrap();
        init(&config).unwrap();
        assert!(is_active());
        assert_eq!(category_verbosity("test-init"), Some(LevelFilter::Debug));

        let metadata = Metadata::builder()
            .target("test-init")
            .level(log::Level::Debug)
            .build();
        assert!(log::logger().enabled(&metadata));

        shutdown();
        assert!(!is_active());
        assert!(!log::logger().enabled(&metadata));

        init(&config).unwrap();
        assert!(is_active());
    }

    #[test]
    fn test_log_config_from_json() {
        let config: LogConfig =
            serde_json::from_str(r#"{ "categories": { "vulkan": "DEBUG" } }"#).unwrap();

        assert_eq!(config.level, LevelFilter::Info);
        assert_eq!(config.categories["vulkan"], LevelFilter::Debug);
    }
}
