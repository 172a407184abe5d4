//! Core traits for Berth applications.
//!
//! [`ConfigProvider`] abstracts where the yacht dataset and the fitted index
//! live, so command handlers can be written once against any configuration
//! source.

use std::path::PathBuf;

use crate::Result;

/// Trait for application configuration.
///
/// # Bounds
///
/// - `Send + Sync`: Configuration must be shareable across threads
/// - `Clone`: Configuration can be duplicated for passing to subsystems
/// - `'static`: Configuration lifetime is not borrowed
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use berth_core::traits::ConfigProvider;
/// use berth_core::Result;
///
/// #[derive(Clone)]
/// struct MarketplaceConfig {
///     data_dir: PathBuf,
/// }
///
/// impl ConfigProvider for MarketplaceConfig {
///     fn project_name(&self) -> &str {
///         "charter-marketplace"
///     }
///
///     fn base_path(&self) -> Result<PathBuf> {
///         Ok(self.data_dir.clone())
///     }
/// }
///
/// let config = MarketplaceConfig { data_dir: PathBuf::from("/srv") };
/// assert_eq!(
///     config.dataset_path().unwrap(),
///     PathBuf::from("/srv/data/yachts.csv")
/// );
/// ```
pub trait ConfigProvider: Send + Sync + Clone + 'static {
    /// The project name, used for display and env var prefixes.
    fn project_name(&self) -> &str;

    /// Base path for all project data.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be determined (e.g., the current
    /// directory is unavailable).
    fn base_path(&self) -> Result<PathBuf>;

    /// Path to the yacht dataset CSV.
    ///
    /// Defaults to `<base>/data/yachts.csv`.
    fn dataset_path(&self) -> Result<PathBuf> {
        Ok(self.base_path()?.join("data").join("yachts.csv"))
    }

    /// Path to the persisted index file.
    ///
    /// Defaults to `<base>/data/index/yacht_index.json`.
    fn index_path(&self) -> Result<PathBuf> {
        Ok(self
            .base_path()?
            .join("data")
            .join("index")
            .join("yacht_index.json"))
    }
}
