pub mod adbreak;
pub mod cli;
pub mod engine;
pub mod player;
pub mod recovery;
pub mod session;
pub mod settings;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::time::{self, Instant};

use cli::{Cli, Command, SimulateArgs, UrlArgs};
use engine::{scripted::load_script, MemoryMediaElement, ScriptedEngineFactory};
use player::{PlayControl, PlaybackSession, PlayerSnapshot};
use session::{PlaybackRequest, PlaybackUrlBuilder};
use settings::SettingsStore;

pub fn run(cli: Cli) -> Result<()> {
    // RUST_LOG overrides the level picked here.
    utils::logging::init(utils::logging::level_for(cli.verbose));

    match cli.command {
        Command::Url(args) => run_url(args),
        Command::Simulate(args) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start runtime")?;
            runtime.block_on(run_simulate(args))
        }
    }
}

fn run_url(args: UrlArgs) -> Result<()> {
    let request = PlaybackRequest::new(args.stitcher_url, args.origin_url);
    let resolved = PlaybackUrlBuilder::new().build(&request);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
    } else {
        println!("session: {}", resolved.session_id);
        println!("origin:  {}", resolved.effective_origin);
        println!("url:     {}", resolved.url);
    }
    Ok(())
}

async fn run_simulate(args: SimulateArgs) -> Result<()> {
    let store = match &args.config {
        Some(path) => SettingsStore::new(path.clone())?,
        None => SettingsStore::defaults(),
    };
    let mut settings = store.settings();
    if let Some(url) = args.stitcher_url {
        settings.stitcher_url = url;
    }
    if let Some(origin) = args.origin_url {
        settings.origin_url = origin;
    }

    let steps = load_script(&args.script)?;
    log::info!("replaying {} scripted engine steps", steps.len());

    let mut factory = ScriptedEngineFactory::new(steps);
    if args.native {
        factory = factory.unsupported();
    }

    let media = Arc::new(MemoryMediaElement::new());
    let mut session = PlaybackSession::new(factory, media, settings.session_options());
    let mut updates = session.subscribe();

    session.load(&settings.request());
    print_if_changed(&mut updates)?;

    let deadline = Instant::now() + Duration::from_millis(args.duration_ms);
    let mut pressed_play = false;
    while let Ok(true) = time::timeout_at(deadline, session.process_next()).await {
        if args.autoplay
            && !pressed_play
            && session.state().controls_enabled
            && session.state().play_control == PlayControl::Play
        {
            pressed_play = session.toggle_play();
        }
        print_if_changed(&mut updates)?;
    }

    session.shutdown();
    print_if_changed(&mut updates)?;
    Ok(())
}

fn print_if_changed(updates: &mut watch::Receiver<PlayerSnapshot>) -> Result<()> {
    if updates.has_changed().unwrap_or(false) {
        let snapshot = updates.borrow_and_update().clone();
        println!("{}", serde_json::to_string(&snapshot)?);
    }
    Ok(())
}
