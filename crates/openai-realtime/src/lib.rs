mod client;

pub use openai_realtime_types as types;
pub use client::{connect_with_config, Client, ClientTx, Config, ConfigBuilder, ServerRx, Stats};
