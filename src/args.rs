//! Argument parsing for running from the command line

use clap::Parser;

use crate::session::SessionConfig;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Hostname or address of the Kiwi to query
    #[clap(short, long, default_value = "192.168.1.82")]
    pub server: String,
    /// Port the Kiwi webserver listens on
    #[clap(short, long, default_value_t = 8073)]
    #[clap(value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,
    /// How many waterfall lines to draw from the server
    #[clap(short, long, default_value_t = 200)]
    #[clap(value_parser = clap::value_parser!(u32).range(1..))]
    pub length: u32,
    /// Span-halving zoom exponent
    #[clap(short, long, default_value_t = 0)]
    #[clap(value_parser = clap::value_parser!(u32).range(0..=14))]
    pub zoom: u32,
    /// Start frequency offset in kHz
    #[clap(short = 'o', long, default_value_t = 0)]
    pub start: u32,
    /// Where to write the rendered waterfall
    #[clap(long, default_value = "waterfall.png")]
    pub out: String,
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,
}

impl Args {
    /// Freeze the acquisition parameters for one session
    pub fn resolve(&self) -> SessionConfig {
        SessionConfig {
            host: self.server.clone(),
            port: self.port,
            zoom: self.zoom,
            offset_khz: self.start,
            rows: self.length as usize,
        }
    }
}

/// Match verbosity filter with tracing subscriber log levels
pub fn convert_filter(filter: log::LevelFilter) -> tracing_subscriber::filter::LevelFilter {
    match filter {
        log::LevelFilter::Off => tracing_subscriber::filter::LevelFilter::OFF,
        log::LevelFilter::Error => tracing_subscriber::filter::LevelFilter::ERROR,
        log::LevelFilter::Warn => tracing_subscriber::filter::LevelFilter::WARN,
        log::LevelFilter::Info => tracing_subscriber::filter::LevelFilter::INFO,
        log::LevelFilter::Debug => tracing_subscriber::filter::LevelFilter::DEBUG,
        log::LevelFilter::Trace => tracing_subscriber::filter::LevelFilter::TRACE,
    }
}
