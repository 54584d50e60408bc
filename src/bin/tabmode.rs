// Tabmode CLI
// Reports SW_TABLET_MODE from keyboard presence and relays volume keys

use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use log::{error, info};

use tabmode_core::{
    Config, Daemon, DaemonError, DeviceMonitor, ModeState, ModeTracker, VirtualSwitchDevice,
};

/// Tablet-mode switch daemon for convertibles with detachable keyboards
#[derive(Parser, Debug)]
#[command(name = "tabmode")]
#[command(version)]
#[command(about = "Synthesizes SW_TABLET_MODE from keyboard presence", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Validate config and exit
    #[arg(long)]
    check_config: bool,

    /// List input devices with their classification and exit
    #[arg(long)]
    list_devices: bool,

    /// Pin the switch to a fixed state instead of following keyboards
    #[arg(long, value_name = "MODE")]
    force: Option<ModeState>,
}

/// Main application state
struct Application {
    config: Config,
    args: Args,
}

impl Application {
    fn new(args: Args) -> Result<Self, DaemonError> {
        let config = Config::load(args.config.as_deref())?;
        Ok(Self { config, args })
    }

    fn describe_config(&self) {
        match self.config.source {
            Some(ref path) => info!("Config: {}", path.display()),
            None => info!("Config: built-in defaults"),
        }
    }

    /// Validate configuration
    fn validate(&self) {
        println!("Configuration is valid");
        println!("  virtual device: {}", self.config.device_name);
        println!("  relay keys: {:?}", self.config.relay_keys);
        for entry in &self.config.relay_matches {
            println!("  relay match: {:?}", entry);
        }
    }

    /// List input devices and how they would be classified
    fn list_devices(&self) -> anyhow::Result<()> {
        let devices = DeviceMonitor::list_devices(self.config.classifier())
            .map_err(DaemonError::from)?;
        println!("Found {} input device(s):", devices.len());
        for device in &devices {
            println!(
                "  {:<20} {:<13} [{}] {}",
                device.path,
                device.class.as_str(),
                device.id,
                device.name
            );
        }
        Ok(())
    }

    /// Run until SIGINT/SIGTERM
    fn run(&self) -> anyhow::Result<()> {
        self.describe_config();

        let device =
            VirtualSwitchDevice::new(&self.config.device_name, &self.config.relay_keys)
                .map_err(DaemonError::from)?;

        // Signals wake the monitor's poll through this socket pair
        let (shutdown_rx, shutdown_tx) =
            UnixStream::pair().context("Failed to create shutdown socket")?;
        for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
            let writer = shutdown_tx
                .try_clone()
                .context("Failed to clone shutdown socket")?;
            signal_hook::low_level::pipe::register(signal, writer)
                .with_context(|| format!("Failed to register handler for signal {}", signal))?;
        }

        let classifier = self
            .config
            .classifier()
            .with_virtual_paths(device.dev_nodes().to_vec());
        let mut monitor =
            DeviceMonitor::new(classifier, Some(shutdown_rx)).map_err(DaemonError::from)?;

        let tracker = match self.args.force {
            Some(state) => {
                info!("Switch pinned to {}", state);
                ModeTracker::pinned(state)
            }
            None => ModeTracker::new(),
        };

        info!("tabmode is running");
        let daemon = Daemon::new(tracker, device);
        let device = daemon.run(monitor.by_ref());

        if let Some(err) = monitor.take_error() {
            return Err(DaemonError::from(err).into());
        }

        drop(device);
        info!("Virtual device released, exiting");
        Ok(())
    }
}

/// Exit code for an error, falling back to 1 for anything not classified
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<DaemonError>()
        .map(DaemonError::exit_code)
        .unwrap_or(1)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let app = match Application::new(args) {
        Ok(app) => app,
        Err(e) => {
            error!("{}", e);
            process::exit(e.exit_code());
        }
    };

    if app.args.check_config {
        app.validate();
        return;
    }

    let result = if app.args.list_devices {
        app.list_devices()
    } else {
        app.run()
    };

    if let Err(e) = result {
        error!("{:#}", e);
        if let Some(DaemonError::VirtualDevice(_)) = e.downcast_ref::<DaemonError>() {
            error!("Is the uinput module loaded and /dev/uinput writable?");
        }
        if let Some(DaemonError::Hotplug(_)) = e.downcast_ref::<DaemonError>() {
            error!("Is udev running and /dev/input readable?");
        }
        process::exit(exit_code(&e));
    }
}
