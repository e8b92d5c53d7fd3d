use clap::Parser;
use tracing::{error, info};

use kiwi_slurper::args::{convert_filter, Args};
use kiwi_slurper::buffer::WaterfallBuffer;
use kiwi_slurper::render::render_waterfall;
use kiwi_slurper::session;
use kiwi_slurper::stats::SummaryStats;
use kiwi_slurper::transport::WsChannel;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(convert_filter(args.verbose.log_level_filter()))
        .init();
    let config = args.resolve();

    info!(
        "connecting to {}:{} (span {} kHz centered at {} kHz)",
        config.host,
        config.port,
        config.span_khz(),
        config.center_freq_khz()
    );
    let mut channel = WsChannel::connect(&config.host, config.port)?;

    let (buffer, failed) = match session::run(&config, &mut channel) {
        Ok(buffer) => (buffer, false),
        Err(failure) => {
            error!("{failure}");
            (failure.partial, true)
        }
    };
    if buffer.is_empty() {
        return Err("no waterfall lines received".into());
    }

    let stats = SummaryStats::compute(&buffer.matrix)?;
    println!(
        "SNR: {:.0} dB [median: {:.0} dB, p95: {:.0} dB, high: {:.0} dBm, low: {:.0} dBm]",
        stats.snr(),
        stats.median,
        stats.p95,
        stats.peak,
        stats.trough
    );

    // Round-trip through the serialized form; the replayed raw view is what
    // gets drawn
    let bytes = buffer.serialize();
    let (header, replay) = WaterfallBuffer::deserialize(&bytes)?;
    let title = if failed {
        "Sorry, measurement failed on this Kiwi, no slot available, try later".to_owned()
    } else {
        format!("HF waterfall @ {} - [SNR: {:.0} dB]", config.host, stats.snr())
    };
    info!(
        center_freq = header.center_freq,
        span = header.span,
        rows = replay.len(),
        "rendering"
    );
    render_waterfall(&args.out, &replay, &stats, &title)?;
    info!("wrote {}", args.out);
    Ok(())
}
