use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn setup() {
    INIT.call_once(|| {
        let level = if cfg!(test) { LevelFilter::Debug } else { LevelFilter::Info };
        if let Err(error) = SimpleLogger::new().with_level(level).env().init() {
            eprintln!("Logger already initialized: {}", error);
        }
    });
}
