use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use eframe::{
    egui::{ViewportBuilder, Visuals},
    run_native,
};
use log::{error, info};
use roosty_notifier::{audio::AudioHandle, chime, config::Config, Notifier, APP_TITLE};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// settings file to use instead of the one in the config directory
    #[arg(long)]
    config: Option<PathBuf>,
    /// ring with this sound, it is remembered for next time
    #[arg(long)]
    sound: Option<PathBuf>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write a fresh settings file and the default chime, then exit
    Init {
        #[clap(long, short)]
        force: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    simple_file_logger::init_logger!("roosty_notifier").expect("couldn't initialize logger");

    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(Config::config_path);
    let chime_path = Config::default_chime_path();

    if let Some(Command::Init { force }) = args.command {
        if force || !Config::is_config_present(&config_path) {
            Config::new().save(&config_path)?;
            info!("wrote config to {}", config_path.display());
        }
        chime::write_default_chime(&chime_path)?;
        return Ok(());
    }

    match chime::write_default_chime(&chime_path) {
        Ok(true) => info!("wrote default chime to {}", chime_path.display()),
        Ok(false) => {}
        Err(e) => error!("couldn't write default chime {}: {e}", chime_path.display()),
    }

    let config = Config::load(&config_path);
    let audio = AudioHandle::spawn();
    let sound = args.sound;

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([500.0, 400.0])
            .with_min_inner_size([500.0, 400.0]),
        ..Default::default()
    };
    // run the gui
    run_native(
        APP_TITLE,
        native_options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(Visuals::light());
            let mut app = Notifier::new(cc.egui_ctx.clone(), config, config_path, audio);
            if let Some(sound) = sound {
                app.set_sound(sound);
            }
            Ok(Box::new(app))
        }),
    )?;
    Ok(())
}
