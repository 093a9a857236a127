use crate::attacks::{run_attack_battery, AttackOptions, AttackReport};
use crate::audio::load_stream;
use crate::config::StegoConfig;
use crate::error::Result;
use crate::store::RecordStore;
use std::path::{Path, PathBuf};

/// Options for the attack command
#[derive(Debug, Clone)]
pub struct AttackCommandOptions {
    pub id: String,
    pub seed: Option<u64>,
    pub config: StegoConfig,
    pub store_dir: PathBuf,
}

/// Run the attack battery against an encoded WAV file
pub fn attack_file(input: &Path, options: &AttackCommandOptions) -> Result<AttackReport> {
    let store = RecordStore::new(&options.store_dir);
    let (metadata, _key) = store.load(&options.id)?;
    let stream = load_stream(input)?;

    let harness = AttackOptions {
        seed: options.seed,
        codec: options.config.codec_options(),
    };
    run_attack_battery(&stream, &metadata, &harness)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{save_stream, AudioFormat, SampleStream};
    use crate::cli::encode::{encode_file, EncodeOptions};
    use tempfile::tempdir;

    #[test]
    fn test_attack_file_runs_battery() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        let samples = (0..60_000)
            .map(|i| ((i as f64 * 0.02).sin() * 7000.0) as i16)
            .collect();
        save_stream(&input, &SampleStream::new(samples, AudioFormat::default())).unwrap();

        let summary = encode_file(
            &input,
            &output,
            &EncodeOptions {
                message: b"attack me".to_vec(),
                store_dir: dir.path().join("records"),
                ..Default::default()
            },
        )
        .unwrap();

        let options = AttackCommandOptions {
            id: summary.id,
            seed: Some(7),
            config: StegoConfig::default(),
            store_dir: dir.path().join("records"),
        };
        let report = attack_file(&output, &options).unwrap();
        assert_eq!(report.total, report.results.len());
        assert!(report.passed <= report.total);
        assert!(report.results.iter().all(|r| r.total_bits == 72));
        assert_eq!(report, attack_file(&output, &options).unwrap());
    }
}
