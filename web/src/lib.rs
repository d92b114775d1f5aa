use clap::Parser;
use std::cell::Cell;
use wasm_bindgen::prelude::*;

pub use game::EgdleGame;
pub use storage::LocalStorageBackend;

mod game;
mod storage;
mod utils;

#[derive(Parser, Debug, Default)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<String>,
}

thread_local! {
    static FORCED_SEED: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Seed for the parts of a game that are not the daily puzzle.
pub(crate) fn game_seed() -> u64 {
    FORCED_SEED
        .with(Cell::get)
        .unwrap_or_else(utils::js_random_seed)
}

#[wasm_bindgen(start)]
pub fn run_app() {
    #[cfg(feature = "console_error_panic_hook")]
    {
        console_error_panic_hook::set_once();
    }

    let location_hash = gloo::utils::window()
        .location()
        .hash()
        .unwrap_or_else(|_| "".to_string());

    let args = Args::try_parse_from(location_hash.split(['#', '&'])).unwrap_or_else(|err| {
        gloo::console::warn!(format!("Could not parse args: {}", err));
        Args::default()
    });
    if let Some(log_level) = args.verbose.log_level() {
        if let Err(err) = console_log::init_with_level(log_level) {
            gloo::console::error!(format!("Error initializing logger: {}", err));
        }
    }
    log::debug!("seed: {:?}", args.seed);
    FORCED_SEED.with(|seed| seed.set(args.seed.as_deref().map(utils::parse_seed)));

    log::debug!("App started");
}
