use beocontrol::config::BeoConfig;
use beocontrol::data::{PlayerCommand, PlayerEvent};
use beocontrol::logging::initialize_logging;
use beocontrol::players::{BeoPlayerController, PlayerController, PlayerStateListener};
use clap::Parser;
use log::{error, info, warn};
use std::any::Any;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

/// Volume change per key press
const VOLUME_STEP: u8 = 5;

#[derive(Parser, Debug)]
#[command(name = "beocontrol", version, about = "Control a Bang & Olufsen network speaker")]
struct Args {
    /// IP address of the speaker
    #[arg(long)]
    ip: Option<String>,

    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// JSON file with the device configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file with the logging configuration
    #[arg(long)]
    log_config: Option<PathBuf>,

    /// Global log level
    #[arg(long)]
    log_level: Option<String>,

    /// Debug logging for the player
    #[arg(short, long)]
    debug: bool,
}

/// Logs every event a player reports
struct EventLogger {
    name: String,
}

impl PlayerStateListener for EventLogger {
    fn on_event(&self, event: PlayerEvent) {
        match event {
            PlayerEvent::ConnectionChanged { state, .. } => info!("[{}] Connection: {}", self.name, state),
            PlayerEvent::StateChanged { state, .. } => info!("[{}] State: {}", self.name, state),
            PlayerEvent::PowerChanged { power, .. } => info!("[{}] Power: {}", self.name, power),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn load_config(args: &Args) -> Result<BeoConfig, String> {
    let mut config = match (&args.config, &args.ip) {
        (Some(path), _) => BeoConfig::from_file(path).map_err(|e| e.to_string())?,
        (None, Some(ip)) => BeoConfig::from_value(&serde_json::json!({ "ip": ip })).map_err(|e| e.to_string())?,
        (None, None) => return Err("either --ip or --config is required".to_string()),
    };
    if let Some(ip) = &args.ip {
        config.ip = ip.clone();
    }
    if args.config.is_none() || args.port != 8080 {
        config.port = args.port;
    }
    Ok(config)
}

/// Translate a key press into a player action
fn handle_key(player: &BeoPlayerController, key: u8) {
    let result = match key {
        b' ' => player.send_command(PlayerCommand::Play),
        b's' => player.send_command(PlayerCommand::Pause),
        b'x' => player.send_command(PlayerCommand::Stop),
        b'n' => player.send_command(PlayerCommand::Next),
        b'p' => player.send_command(PlayerCommand::Previous),
        b'+' | b'-' => {
            let current = player.get_player_state().volume.unwrap_or(0);
            let level = if key == b'+' {
                current.saturating_add(VOLUME_STEP).min(100)
            } else {
                current.saturating_sub(VOLUME_STEP)
            };
            player.send_command(PlayerCommand::SetVolume(level))
        }
        b'm' => player.send_command(PlayerCommand::ToggleMute),
        b'o' => player.send_command(PlayerCommand::PowerOn),
        b'f' => player.send_command(PlayerCommand::PowerOff) && player.enter_standby(),
        b'd' => player.disconnect(),
        b'c' => player.connect(),
        _ => return,
    };
    if !result {
        warn!("Key '{}' had no effect", key as char);
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = initialize_logging(args.log_config.as_deref(), args.log_level.as_deref(), args.debug) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    let mut player = BeoPlayerController::new(config);
    let logger: Arc<dyn PlayerStateListener> = Arc::new(EventLogger { name: player.friendly_name().to_string() });
    player.register_state_listener(Arc::downgrade(&logger) as Weak<dyn PlayerStateListener>);

    if !player.start() {
        error!("Failed to start player");
        std::process::exit(1);
    }
    let player = Arc::new(player);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("\nReceived Ctrl+C, shutting down...");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Error setting Ctrl+C handler: {}", e);
    }

    let keyboard_player = player.clone();
    let keyboard_running = running.clone();
    thread::spawn(move || {
        println!("Keyboard controls:");
        println!("  Space: play   s: pause   x: stop   n/p: next/previous");
        println!("  +/-: volume   m: mute    o: power on   f: standby");
        println!("  d: disconnect c: connect Ctrl+C: exit");

        let mut stdin = io::stdin();
        let mut buffer = [0u8; 1];
        while keyboard_running.load(Ordering::SeqCst) {
            match stdin.read(&mut buffer) {
                Ok(1) => handle_key(&keyboard_player, buffer[0]),
                Ok(_) => break,
                Err(_) => thread::sleep(Duration::from_millis(10)),
            }
        }
    });

    while running.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    player.stop();
    // Let the engine close the subscription
    tokio::time::sleep(Duration::from_millis(200)).await;
    info!("Exiting application");
}
