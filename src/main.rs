//! MindWatch - mental wellness dashboard client
//!
//! A CLI client that aggregates music-listening and watch-history
//! analytics from the MindWatch backend into a single wellness score and
//! offers an assistant chat over the same data.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (auth failure, upload failure, config error, etc.)

mod address;
mod api;
mod chat;
mod cli;
mod config;
mod models;
mod orchestrator;
mod score;
mod session;
mod storage;

use address::Address;
use anyhow::{Context, Result};
use api::{HttpApi, WellnessApi};
use chat::ConversationManager;
use cli::{Args, Command};
use config::Config;
use orchestrator::SourceOrchestrator;
use score::{overall_score, Band};
use session::{consume_callback, AuthError, CallbackOutcome, Session};
use std::io::{BufRead, Write};
use storage::SessionStore;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    init_logging(&args);
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        Config::load(config_path)?
    } else {
        match Config::load_default() {
            Ok(Some(config)) => {
                info!("Loaded config from .mindwatch.toml");
                config
            }
            Ok(None) => Config::default(),
            Err(e) => {
                error!("Failed to load config: {}", e);
                Config::default()
            }
        }
    };

    config.merge_with_args(args);
    Ok(config)
}

/// Dispatch the subcommand. Returns the process exit code.
async fn run(args: Args) -> Result<i32> {
    let config = load_config(&args)?;
    let api = HttpApi::new(&config.api.base_url, config.api.timeout_seconds)?;
    let store = SessionStore::new(&config.storage.effective_dir());

    let mut session = store.load()?.unwrap_or_default();

    match args.command {
        Command::Login => {
            println!("Open this URL in your browser to sign in:\n");
            println!("  {}", api.login_url());
            Ok(0)
        }

        Command::Auth { callback_url } => handle_auth(&callback_url, &api, &store).await,

        Command::Logout => {
            session.clear();
            store.clear()?;
            println!("👋 Signed out. Session and local state cleared.");
            Ok(0)
        }

        Command::Connect => match session.token() {
            Some(token) => {
                println!("Open this URL in your browser to link Spotify:\n");
                println!("  {}", api.connect_url(token));
                println!("\nThen run: mindwatch status --callback \"<redirected-url>\"");
                Ok(0)
            }
            None => {
                println!("Not signed in. Run `mindwatch login` first.");
                Ok(0)
            }
        },

        Command::Status { callback } => {
            let mut address = callback
                .as_deref()
                .map(Address::parse)
                .unwrap_or_else(|| Address::parse("/dashboard"));

            let mut hub = SourceOrchestrator::new();
            hub.sync(&mut session, &mut address, &api).await;
            if session.is_authenticated() {
                store.save(&session)?;
            }

            print_status(&session, &hub);
            Ok(0)
        }

        Command::Analyze {
            watch_history,
            search_history,
        } => {
            let mut hub = SourceOrchestrator::new();
            let sent = hub
                .upload_watch_history(&session, &api, &watch_history, search_history.as_deref())
                .await
                .context("YouTube history analysis failed")?;

            if !sent {
                println!("Not signed in. Run `mindwatch login` first.");
                return Ok(0);
            }

            if let Some(content) = hub.content() {
                print_content_summary(content);
            }
            Ok(0)
        }

        Command::Chat { message } => handle_chat(message, &mut session, &api).await,
    }
}

/// Consume a sign-in callback and persist the resulting session.
async fn handle_auth(callback_url: &str, api: &HttpApi, store: &SessionStore) -> Result<i32> {
    let mut address = Address::parse(callback_url);

    match consume_callback(&mut address) {
        CallbackOutcome::SignedIn { token } => {
            let mut session = Session::new();
            session.initialize(&token);

            match api.fetch_profile(&token).await {
                Ok(profile) => {
                    println!("✅ Signed in as {} <{}>", profile.name, profile.email);
                    session.set_identity(profile);
                    store.save(&session)?;
                    Ok(0)
                }
                Err(e) => {
                    debug!("Profile fetch failed after sign-in: {}", e);
                    eprintln!("⚠️  {}", AuthError::SessionError);
                    Ok(1)
                }
            }
        }
        CallbackOutcome::Failed(e) => {
            eprintln!("⚠️  {}", e);
            Ok(1)
        }
    }
}

/// Chat once or interactively.
async fn handle_chat(
    message: Option<String>,
    session: &mut Session,
    api: &HttpApi,
) -> Result<i32> {
    if session.token().is_none() {
        println!("Not signed in. Run `mindwatch login` first.");
        return Ok(0);
    }

    // Fetch fresh snapshots so the assistant sees current data.
    let mut hub = SourceOrchestrator::new();
    let mut address = Address::parse("/dashboard");
    hub.sync(session, &mut address, api).await;

    let mut chat = ConversationManager::new();
    chat.ensure_starters(session, api).await;

    if let Some(text) = message {
        let sent = chat
            .send_message(&text, session, hub.music(), hub.content(), api)
            .await;
        if sent {
            if let Some(reply) = chat.transcript().last() {
                println!("🤖 {}", reply.content);
            }
        }
        return Ok(0);
    }

    // Interactive session.
    if let Some(greeting) = chat.transcript().first() {
        println!("🤖 {}", greeting.content);
    }
    let starters = chat.visible_starters().to_vec();
    if !starters.is_empty() {
        println!("\nTry asking:");
        for starter in &starters {
            println!("  • {}", starter);
        }
    }

    let stdin = std::io::stdin();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line == "exit" || line == "quit" {
            break;
        }

        let sent = chat
            .send_message(line, session, hub.music(), hub.content(), api)
            .await;
        if sent {
            if let Some(reply) = chat.transcript().last() {
                println!("🤖 {}", reply.content);
            }
        }
    }

    Ok(0)
}

/// Print the wellness overview.
fn print_status(session: &Session, hub: &SourceOrchestrator) {
    let Some(user) = session.user() else {
        println!("Not signed in. Run `mindwatch login` first.");
        return;
    };

    println!("\n🧠 Welcome back, {}", user.first_name());

    match overall_score(hub.music(), hub.content()) {
        Some(overall) => {
            let band = Band::of(overall);
            println!("\n   Overall Wellness Score: {}/100", overall);
            println!("   {}", band.headline());
        }
        None => {
            println!("\n   Overall Wellness Score: --/100");
            println!("   Connect data sources to get your score");
        }
    }

    if let Some(music) = hub.music() {
        println!("\n🎵 Music Mood ({} tracks analyzed)", music.total_tracks_analyzed);
        println!(
            "   Emotional tone: {} ({})",
            music.emotional_tone,
            score::valence_band(music.avg_valence)
        );
        println!(
            "   Happiness: {:.0}%  Energy: {:.0}%  Danceability: {:.0}%",
            models::display_percentage(music.avg_valence * 100.0),
            models::display_percentage(music.avg_energy * 100.0),
            models::display_percentage(music.avg_danceability * 100.0),
        );
        println!(
            "   Avg tempo: {:.0} BPM  Late night listening: {:.0}%",
            music.avg_tempo,
            models::display_percentage(music.late_night_listening_ratio * 100.0),
        );
        if let Some(at) = hub.music_fetched_at() {
            println!("   As of {}", at.format("%Y-%m-%d %H:%M UTC"));
        }
    } else if session.spotify_connected() {
        println!("\n🎵 Music analysis unavailable right now.");
    } else {
        println!("\n🎵 Spotify not connected. Run `mindwatch connect`.");
    }

    if let Some(content) = hub.content() {
        print_content_summary(content);
    } else {
        println!("\n📺 No content analysis yet. Run `mindwatch analyze <watch-history.html>`.");
    }
}

/// Print the content-diet section shared by `status` and `analyze`.
fn print_content_summary(content: &models::ContentAnalysis) {
    println!(
        "\n📺 Content Diet ({} videos analyzed)",
        content.total_videos_analyzed
    );
    println!(
        "   Emotional diet score: {:.0}/100  Dark content: {:.0}%",
        content.emotional_diet_score, content.dark_content_percentage
    );
    println!(
        "   Recovery vs rumination: {}",
        if content.recovery_score > content.rumination_score {
            "✅ Healthy"
        } else {
            "⚠️ Watch out"
        }
    );
    println!("   Mood: {}", content.content_mood);

    for insight in &content.insights {
        let marker = match insight.kind {
            models::InsightKind::Warning => "⚠️",
            models::InsightKind::Positive => "💡",
        };
        println!("   {} {}", marker, insight.message);
    }
}
