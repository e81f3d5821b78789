use tracing::{error, info, Level};

use battleballs::audio::NullAudio;
use battleballs::config::MatchConfig;
use battleballs::game::controller::{FighterSpec, MatchController};
use battleballs::recorder::NullRecorder;
use battleballs::render::NullRenderer;

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("battleballs v{}", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().collect();
    let weapon_a = args.get(1).cloned().unwrap_or_else(|| "katana".to_string());
    let weapon_b = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| "shuriken".to_string());

    let seed: u64 = std::env::var("BB_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let config = MatchConfig::load_or_default();
    if let Err(msg) = config.validate() {
        anyhow::bail!("invalid configuration: {msg}");
    }
    info!(
        "{} vs {} on {}x{} @ {} fps, seed {}",
        weapon_a, weapon_b, config.width, config.height, config.fps, seed
    );

    let specs = [
        FighterSpec {
            weapon: weapon_a,
            team: config.team_colors.first().copied().unwrap_or((0, 102, 204)),
        },
        FighterSpec {
            weapon: weapon_b,
            team: config.team_colors.get(1).copied().unwrap_or((255, 102, 0)),
        },
    ];

    // Headless run: rendering, audio and recording are stubbed out. Wire
    // real collaborators here to export video.
    let mut controller = MatchController::new(
        config,
        &specs,
        seed,
        Box::new(NullRenderer),
        Box::new(NullAudio),
        Box::new(NullRecorder),
    )?;

    match controller.run() {
        Ok(outcome) => {
            info!(
                "winner: {} after {:.1}s ({} frames)",
                outcome.winner_weapon.as_deref().unwrap_or("nobody"),
                outcome.duration,
                outcome.frames
            );
            Ok(())
        }
        Err(err) => {
            error!("match failed: {err}");
            Err(err.into())
        }
    }
}
