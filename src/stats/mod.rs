//! Broker and subscriber statistics

pub mod metrics;

pub use metrics::{BrokerMetrics, BrokerStats, SubscriberStats};
