use brief_orchestrator::EmbedSource;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliEmbedSource {
    DataUri,
    StorageUrl,
}

impl From<CliEmbedSource> for EmbedSource {
    fn from(value: CliEmbedSource) -> Self {
        match value {
            CliEmbedSource::DataUri => EmbedSource::DataUri,
            CliEmbedSource::StorageUrl => EmbedSource::StorageUrl,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliOutputFormat {
    Text,
    Json,
}
