use std::sync::Arc;
use std::time::Duration;

use crate::adapters::{CrunchConfig, FFmpegAdapter, FFprobeAdapter, LocalFsAdapter, TokioProcessAdapter};
use crate::app::compress_interactor::{CompressInteractor, CompressSettings};
use crate::domain::errors::DomainError;
use crate::ports::{EncodePort, FsPort, ProbePort, ProcessPort};

pub trait AppContainer: Send + Sync {
    fn compress_interactor(&self) -> Arc<CompressInteractor>;
}

pub struct DefaultAppContainer {
    compress_interactor: Arc<CompressInteractor>,
}

impl DefaultAppContainer {
    /// Wire the ffprobe/ffmpeg adapters for a validated configuration
    pub fn new(config: &CrunchConfig) -> Result<Self, DomainError> {
        config.validate()?;

        let process_port: Arc<dyn ProcessPort> = Arc::new(TokioProcessAdapter::new());
        let probe_port = Arc::new(FFprobeAdapter::new(
            Arc::clone(&process_port),
            config.ffprobe_path.clone(),
            Duration::from_secs(config.probe_timeout_secs),
        ));
        let encode_port = Arc::new(
            FFmpegAdapter::new(
                Arc::clone(&process_port),
                config.ffmpeg_path.clone(),
                Duration::from_secs(config.encode_timeout_secs),
            )
            .with_codecs(config.video_codec.clone(), config.audio_codec.clone()),
        );
        let fs_port = Arc::new(LocalFsAdapter::new());

        let compress_interactor = Arc::new(CompressInteractor::new(
            probe_port as Arc<dyn ProbePort>,
            encode_port as Arc<dyn EncodePort>,
            fs_port as Arc<dyn FsPort>,
            CompressSettings::from(config),
        ));

        Ok(Self { compress_interactor })
    }
}

impl AppContainer for DefaultAppContainer {
    fn compress_interactor(&self) -> Arc<CompressInteractor> {
        Arc::clone(&self.compress_interactor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_carries_config_settings() {
        let mut config = CrunchConfig::default();
        config.filename_prefix = "_small".to_string();
        config.max_iterations = 2;

        let container = DefaultAppContainer::new(&config).unwrap();
        let interactor = container.compress_interactor();
        assert_eq!(interactor.settings().filename_prefix, "_small");
        assert_eq!(interactor.settings().max_iterations, 2);
    }

    #[test]
    fn test_invalid_config_is_refused() {
        let mut config = CrunchConfig::default();
        config.max_iterations = 0;
        assert!(matches!(
            DefaultAppContainer::new(&config),
            Err(DomainError::ConfigError(_))
        ));
    }
}
