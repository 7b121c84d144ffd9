//! `toonpass [model.stl] [font.ttf]`
//!
//! Opens the toon shading demo. Logging is controlled with `RUST_LOG`.

use std::process::ExitCode;

use toonpass::AppConfig;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = AppConfig::new();
    let mut args = std::env::args().skip(1);
    if let Some(model) = args.next() {
        config = config.model(model, 60.0);
    }
    if let Some(font) = args.next() {
        config = config.font(font, 18.0);
    }

    match toonpass::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
