//! `plastey` – collaborative hand-gesture sculpting.
//!
//! This binary wires the sculpting session to its collaborators and keeps it
//! running:
//!
//! 1. Loads `~/.plastey/config.toml`, writing the defaults on first run.
//! 2. Connects to the peer as server or client when a network role is set.
//! 3. Plays a tracking recording (or the built-in demo script) through the
//!    session frame loop, echoing status messages to the terminal.
//! 4. Restarts the session when either side asks for it and saves the
//!    surface snapshot on the way out.
//! 5. Intercepts **Ctrl-C** to end the session cleanly.
//!
//! Console commands, one per line on stdin:
//!
//! | Command | Effect |
//! |---|---|
//! | `r`, `restart` | restart the session here and on the peer |
//! | `q`, `quit` | end the session |

mod config;
mod demo;

use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use colored::Colorize;
use plastey_hal::sim::{FixedHead, SimMesh, SimPivot};
use plastey_hal::{HandTracker, HeadTracker, MessageLog, ReplayTracker, SystemClock, TextSink};
use plastey_middleware::{TcpTransport, Transport};
use plastey_runtime::hand::{FingerAttribute, FingerView};
use plastey_runtime::{Collaborators, Session, Signals, VertexSnapshot};
use plastey_types::{FingerKind, HandSide, Interrupt, MountMode, PlasteyError};
use tracing::{debug, info, warn};

use crate::config::{Config, NetworkConfig, Origin, Role};

fn main() {
    let _telemetry = plastey_runtime::init_tracing("plastey");

    print_banner();

    // ── Shared shutdown and restart flags ─────────────────────────────────
    let signals = Arc::new(Signals::new());
    let handler_signals = signals.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – ending the session …".yellow().bold());
        handler_signals.request_shutdown();
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; use the `q` command to quit");
    }
    spawn_console(signals.clone());

    let cfg = load_config();
    let mut restore = true;

    // ── Session restart loop ──────────────────────────────────────────────
    loop {
        let mut session = match build_session(&cfg, &signals) {
            Ok(session) => session,
            Err(_) if signals.shutdown_requested() => break,
            Err(e) => {
                println!("{}: {}", "Failed to start session".red(), e);
                std::process::exit(1);
            }
        };
        if restore {
            restore_snapshot(&mut session);
            restore = false;
        }
        println!(
            "  Session {} started ({} vertices, {} mount, {})",
            session.id().to_string().bold(),
            session.scene().surface.len(),
            format!("{:?}", cfg.session.mount).to_lowercase(),
            cfg.network.role,
        );
        println!("  {}\n", "Type `r` to restart or `q` to quit.".dimmed());

        let interrupt = session.run(&signals);

        match session.finish() {
            Ok(Some(path)) => println!("  {} Snapshot saved to {}", "✓".green().bold(), path.display()),
            Ok(None) => {}
            Err(e) => println!("{}: {}", "Snapshot error".red(), e),
        }

        match interrupt {
            Interrupt::Restart if !signals.shutdown_requested() => {
                println!("{}", "  ↻ Restarting session …".cyan());
            }
            _ => break,
        }
    }

    println!("{}", "  ✓ Exiting Plastey.".green());
}

// ─────────────────────────────────────────────────────────────────────────────
// Setup
// ─────────────────────────────────────────────────────────────────────────────

fn load_config() -> Config {
    let path = config::config_path();
    let shown = path.display().to_string();
    let (cfg, origin) = config::resolve(&path);
    match origin {
        Origin::Loaded => println!("  Config loaded from {}", shown.bold()),
        Origin::Created(None) => println!("  {} Default config written to {}", "✓".green().bold(), shown.bold()),
        Origin::Created(Some(e)) => println!("{}: {}", "Error saving config".red(), e),
        Origin::Fallback(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
        }
    }
    cfg
}

/// Read console commands until stdin closes.
fn spawn_console(signals: Arc<Signals>) {
    let spawned = thread::Builder::new().name("console".to_string()).spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match line.trim() {
                "r" | "restart" => {
                    println!("{}", "  ↻ Restart requested".cyan());
                    signals.request_restart();
                }
                "q" | "quit" => signals.request_shutdown(),
                "" => {}
                other => println!("  Unknown command `{other}` (r = restart, q = quit)"),
            }
        }
        debug!("console input closed");
    });
    if let Err(e) = spawned {
        warn!(error = %e, "console commands unavailable");
    }
}

fn build_session(cfg: &Config, signals: &Signals) -> Result<Session, PlasteyError> {
    let tracker: Box<dyn HandTracker> = match &cfg.replay {
        Some(path) => {
            info!(path = %path.display(), "playing back recording");
            Box::new(ReplayTracker::open(path)?)
        }
        None => Box::new(ReplayTracker::from_frames(demo::script(&cfg.session.positioner))),
    };
    let head = (cfg.session.mount == MountMode::Head)
        .then(|| Box::new(FixedHead::default()) as Box<dyn HeadTracker>);

    let collaborators = Collaborators {
        mesh: Box::new(SimMesh::grid(cfg.mesh.cols, cfg.mesh.rows, cfg.mesh.spacing)),
        tracker,
        head,
        text: Box::new(Hud(MessageLog::new(Box::new(SystemClock::new()), cfg.hud_interval))),
        pivot: Box::new(SimPivot::new()),
        transport: connect(&cfg.network, signals)?,
    };
    let mut session = Session::new(cfg.session.clone(), collaborators)?;

    for side in [HandSide::Left, HandSide::Right] {
        session
            .hands_mut()
            .hand_mut(side)
            .state
            .finger_mut(FingerKind::Index)
            .observe(
                FingerAttribute::Color,
                Box::new(move |view: &FingerView| debug!(?side, color = ?view.color, "index tip recolored")),
            )?;
    }
    Ok(session)
}

fn connect(network: &NetworkConfig, signals: &Signals) -> Result<Option<Box<dyn Transport>>, PlasteyError> {
    let timeout = Duration::from_millis(network.timeout_ms);
    let patience = Duration::from_millis(network.connect_patience_ms);
    let transport = match network.role {
        Role::Offline => return Ok(None),
        Role::Server => {
            println!(
                "  Waiting for the other sculptor on {} …",
                format!("{}:{}", network.this_host, network.this_port).dimmed()
            );
            TcpTransport::serve_until(
                (network.this_host.as_str(), network.this_port),
                timeout,
                patience,
                &signals.shutdown,
            )?
        }
        Role::Client => {
            println!(
                "  Connecting to {} …",
                format!("{}:{}", network.other_host, network.other_port).dimmed()
            );
            TcpTransport::connect_until(
                (network.other_host.as_str(), network.other_port),
                timeout,
                patience,
                &signals.shutdown,
            )?
        }
    };
    println!("  {} peer {}", "connected".green(), transport.peer());
    Ok(Some(Box::new(transport.with_max_message_bytes(network.max_message_bytes))))
}

fn restore_snapshot(session: &mut Session) {
    let Some(path) = session.config().snapshot_path.clone() else {
        return;
    };
    if !path.exists() {
        return;
    }
    match VertexSnapshot::load(&path).and_then(|snapshot| session.restore(&snapshot)) {
        Ok(restored) => println!("  Restored {restored} vertices from {}", path.display()),
        Err(e) => println!("{}: {}", "Snapshot not restored".yellow(), e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HUD
// ─────────────────────────────────────────────────────────────────────────────

/// Echoes every status message to the terminal on top of the timed log.
struct Hud(MessageLog);

impl TextSink for Hud {
    fn write(&mut self, message: &str) {
        println!("  {} {}", "›".cyan(), message);
        self.0.write(message);
    }

    fn clear(&mut self) {
        self.0.clear();
    }

    fn refresh(&mut self) {
        self.0.refresh();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"     ___  __         __"#.bold().cyan());
    println!("{}", r#"    / _ \/ /__ ____ / /____ __ __"#.bold().cyan());
    println!("{}", r#"   / ___/ / _ `(_-</ __/ -_) // /"#.bold().cyan());
    println!("{}", r#"  /_/  /_/\_,_/___/\__/\__/\_, /"#.bold().cyan());
    println!("{}", r#"                          /___/"#.bold().cyan());
    println!();
    println!("  {} {}", "Plastey".bold(), format!("v{}", env!("CARGO_PKG_VERSION")).dimmed());
    println!("  Collaborative hand-gesture sculpting");
    println!();
}
