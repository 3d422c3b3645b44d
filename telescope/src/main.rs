#![warn(clippy::pedantic)]

pub mod script;
pub mod session;
pub mod settings;
pub mod touch;

use anyhow::{Context, Result as AnyResult};
use telescope_core::{CanvasConfig, DVec2};

fn main() -> AnyResult<()> {
    let has_term = std::io::IsTerminal::is_terminal(&std::io::stdin());
    // Log to a terminal, if available. Else, log to "log.out" in the working directory.
    if has_term {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        let _ = simple_logging::log_to_file("log.out", log::LevelFilter::Debug);
    }

    let settings = settings::Settings::load_or_default();
    // Args: `--save-settings` writes the settings file, anything else is a script to play.
    let arg = std::env::args_os().nth(1);
    if arg.as_deref() == Some(std::ffi::OsStr::new("--save-settings")) {
        settings.save().context("saving settings")?;
        log::info!("settings saved to {:?}", settings::preferences_dir());
        return Ok(());
    }
    let script = match arg {
        Some(path) => {
            let path = std::path::PathBuf::from(path);
            script::Script::load(&path).with_context(|| format!("loading script {path:?}"))?
        }
        None => {
            log::info!("no script given, playing the demo");
            script::Script::demo()
        }
    };

    let config = CanvasConfig::from(&settings);
    let viewport = DVec2::new(script.viewport[0], script.viewport[1]);
    let session = session::Session::new(config, settings.rotation_slop(), viewport);
    let report = session.run(&script)?;
    println!("{report}");
    Ok(())
}
