//! Arcade Loader Demo
//!
//! Loads a small game catalog through the component loader, showing
//! preloading, request deduplication, failure tracking and retries.
//!
//! Usage:
//!   cargo run --example arcade_demo
//!
//! Environment variables (also read from `.env`):
//!   RUST_LOG                          - log filter (default: game_loader=info,arcade_demo=info)
//!   GAME_LOADER_TTL_SECS              - component TTL in seconds (default: 300)
//!   GAME_LOADER_MAX_RETRIES           - retry ceiling (default: 3)
//!   GAME_LOADER_AUTO_CLEANUP          - sweep stale components in the background (default: false)
//!   GAME_LOADER_CLEANUP_INTERVAL_SECS - sweep interval in seconds (default: 60)

use game_loader::{ComponentLoader, GameDescriptor, LoadedModule, LoaderConfig, ModuleRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CATALOG: &str = r#"[
    {"id": "coin-flip", "modulePath": "./games/CoinFlip", "title": "Coin Flip"},
    {"id": "savings-quiz", "modulePath": "./games/SavingsQuiz", "title": "Savings Quiz"},
    {"id": "budget-match", "modulePath": "./games/BudgetMatch", "title": "Budget Match"},
    {"id": "lucky-wheel", "modulePath": "./games/LuckyWheel", "title": "Lucky Wheel"}
]"#;

#[derive(Debug)]
struct GameComponent {
    title: &'static str,
    reward_points: u32,
}

fn build_registry() -> ModuleRegistry<GameComponent> {
    let budget_attempts = Arc::new(AtomicUsize::new(0));

    ModuleRegistry::new()
        .with_module("./games/CoinFlip", || async {
            tokio::time::sleep(Duration::from_millis(150)).await;
            Ok(LoadedModule::with_default(GameComponent {
                title: "Coin Flip",
                reward_points: 10,
            }))
        })
        .with_module("./games/SavingsQuiz", || async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(LoadedModule::with_default(GameComponent {
                title: "Savings Quiz",
                reward_points: 50,
            }))
        })
        // Fails on the first request, as a dropped chunk download would
        .with_module("./games/BudgetMatch", move || {
            let attempts = Arc::clone(&budget_attempts);
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    anyhow::bail!("chunk download interrupted");
                }
                Ok(LoadedModule::with_default(GameComponent {
                    title: "Budget Match",
                    reward_points: 25,
                }))
            }
        })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "game_loader=info,arcade_demo=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = LoaderConfig::from_env()?;
    let games = GameDescriptor::list_from_json(CATALOG)?;
    info!("Catalog has {} games", games.len());

    let loader = ComponentLoader::with_config(build_registry(), config)?;
    let _cleanup = loader.spawn_auto_cleanup();

    info!("--- Preloading the first game ---");
    let preload = loader.preload_game(&games[0]);

    info!("--- Three screens ask for the quiz at once ---");
    let quiz = &games[1];
    let (a, b, c) = tokio::join!(
        loader.load_game(quiz),
        loader.load_game(quiz),
        loader.load_game(quiz)
    );
    let a = a?;
    info!(
        "Quiz loaded once, shared by all callers: {}",
        Arc::ptr_eq(&a, &b?) && Arc::ptr_eq(&a, &c?)
    );

    let coin = preload.outcome().await?;
    info!("Preloaded {} ({} points)", coin.title, coin.reward_points);

    info!("--- A flaky game ---");
    let budget = &games[2];
    if let Err(e) = loader.load_game(budget).await {
        warn!("First load failed: {}", e);
        if loader.can_retry(&budget.id).await {
            let component = loader.retry_load(budget).await?;
            info!("Retry succeeded: {}", component.title);
        }
    }

    info!("--- A game missing from the allow-list ---");
    let wheel = &games[3];
    if let Err(e) = loader.load_game(wheel).await {
        warn!("{} cannot load: {}", wheel.id, e);
        info!(
            "Retry offered: {} (state: {})",
            loader.can_retry(&wheel.id).await,
            loader.load_state(&wheel.id).await
        );
    }

    for game in &games {
        info!("{:<14} {}", game.id, loader.load_state(&game.id).await);
    }
    info!("{}", loader.get_cache_stats().await);

    loader.destroy().await;
    Ok(())
}
