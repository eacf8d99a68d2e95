pub mod settings;

pub use settings::{BinaryOptionsConfig, EngineSettings, MockSourceSettings, RiskTier, RiskTiers, WvrsConfig};
