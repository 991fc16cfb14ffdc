use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub agent: AgentConfig,
    pub media: MediaConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct AgentConfig {
    /// NATS server carrying the voice agent event channel
    pub nats_url: String,
}

#[derive(Debug, Deserialize)]
pub struct MediaConfig {
    /// Directory recordings are stored under (served at /recordings)
    pub recordings_path: String,

    /// Upload endpoint the client posts finished recordings to
    pub upload_url: String,

    pub sample_rate: u32,
    pub channels: u16,
}

/// Attempted-question heuristics.
///
/// These are tunable policy, not correctness requirements; the defaults
/// match the values the analyzer was calibrated with.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    pub similarity_threshold: f64,
    pub min_answer_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            min_answer_chars: 3,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
