//! Telemetry feeds - one last-value-wins reducer per streaming channel.

mod feed;
mod feeds;

pub use feed::{
    AnalyticsFeed, FeedValue, MeterFeed, SpectrumFeed, TelemetryFeed, TransportFeed, WaveformFeed,
};
pub use feeds::TelemetryFeeds;
