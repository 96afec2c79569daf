//! # game-loader
//!
//! Lazy loader for the mini-game components of a banking-gamification app.
//!
//! ## Features
//!
//! - Async-first design using tokio
//! - Explicit allow-list from module path to loader function
//! - Five-minute TTL cache of loaded components
//! - One shared load per game, however many callers ask for it
//! - Per-game failure tracking with a retry ceiling
//! - Fire-and-forget preloading
//!
//! ## Loading a Game
//!
//! ```no_run
//! use game_loader::{ComponentLoader, GameDescriptor, LoadedModule, ModuleRegistry};
//!
//! struct GameComponent {
//!     title: &'static str,
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = ModuleRegistry::new()
//!         .with_module("./games/SavingsQuiz", || async {
//!             Ok(LoadedModule::with_default(GameComponent { title: "Savings Quiz" }))
//!         });
//!
//!     let loader = ComponentLoader::new(registry);
//!     let quiz = GameDescriptor::new("savings-quiz", "./games/SavingsQuiz");
//!
//!     let component = loader.load_game(&quiz).await?;
//!     println!("Loaded {}", component.title);
//!     Ok(())
//! }
//! ```
//!
//! ## Retrying After a Failure
//!
//! ```no_run
//! use game_loader::{ComponentLoader, GameDescriptor, LoaderError};
//!
//! # async fn example(loader: ComponentLoader<String>, game: GameDescriptor) {
//! if let Err(e) = loader.load_game(&game).await {
//!     println!("Load failed: {}", e);
//!
//!     if loader.can_retry(&game.id).await {
//!         match loader.retry_load(&game).await {
//!             Ok(_) => println!("Loaded on retry"),
//!             Err(LoaderError::MaxRetriesExceeded { attempts, .. }) => {
//!                 println!("Giving up after {} attempts", attempts)
//!             }
//!             Err(e) => println!("Retry failed: {}", e),
//!         }
//!     }
//! }
//! # }
//! ```

pub mod error;
pub mod loader;

// Re-export main types for convenience
pub use error::{LoaderError, Result};
pub use loader::{
    CacheEntry, ComponentLoader, FailureRecord, GameDescriptor, GameId, LoadState,
    LoadedModule, LoaderConfig, LoaderConfigBuilder, LoaderStats, ModuleRegistry,
    PreloadHandle,
};
