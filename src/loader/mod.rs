//! # On-Demand Component Loader
//!
//! Game components are large, separately built modules. This module loads
//! them lazily and keeps them around for a while.
//!
//! ## Features
//!
//! - **Allow-listed resolution**: module paths map to loaders through an
//!   explicit [`ModuleRegistry`]; unknown paths are rejected up front
//! - **TTL cache**: a loaded component is served from memory for five minutes
//! - **Request deduplication**: concurrent requests for the same game share
//!   one load and one outcome
//! - **Failure tracking**: consecutive failures are counted per game and
//!   retries stop at a ceiling until the game's state is cleared
//!
//! ## Example
//!
//! ```rust
//! use game_loader::loader::{ComponentLoader, GameDescriptor, LoadedModule, ModuleRegistry};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let registry = ModuleRegistry::new().with_module("./games/CoinFlip", || async {
//!     Ok(LoadedModule::with_default("coin flip component".to_string()))
//! });
//!
//! let loader = ComponentLoader::new(registry);
//! let game = GameDescriptor::new("coin-flip", "./games/CoinFlip");
//!
//! let component = loader.load_game(&game).await?;
//! assert_eq!(component.as_str(), "coin flip component");
//! assert!(loader.is_loaded("coin-flip").await);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod failure;
pub mod registry;
pub mod store;
pub mod types;

pub use config::{LoaderConfig, LoaderConfigBuilder, DEFAULT_MAX_RETRIES, DEFAULT_TTL};
pub use entry::CacheEntry;
pub use failure::FailureRecord;
pub use registry::{LoadedModule, ModuleLoaderFn, ModuleRegistry, DEFAULT_EXPORT};
pub use store::{start_auto_cleanup, ComponentLoader, PreloadHandle};
pub use types::{GameDescriptor, GameId, LoadState, LoaderStats};
