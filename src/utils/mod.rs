pub mod logging;

pub use logging::excerpt;
