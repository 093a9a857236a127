use crate::audio::load_stream;
use crate::config::StegoConfig;
use crate::error::Result;
use crate::pipeline::compress::{decompress, Compression};
use crate::pipeline::stego::decode;
use crate::store::RecordStore;
use std::path::{Path, PathBuf};

/// Options for the decode command
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub id: String,
    /// Must match the compression used at encode time
    pub compression: Compression,
    pub config: StegoConfig,
    pub store_dir: PathBuf,
}

/// Recover the message hidden in `input` under record `id`
pub fn decode_file(input: &Path, options: &DecodeOptions) -> Result<Vec<u8>> {
    let store = RecordStore::new(&options.store_dir);
    let (metadata, key) = store.load(&options.id)?;
    let stream = load_stream(input)?;

    let payload = decode(&stream, &metadata, &key, &options.config)?;
    decompress(&payload, options.compression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::encode::{encode_file, EncodeOptions};
    use crate::audio::{save_stream, AudioFormat, SampleStream};
    use crate::error::StegoError;
    use crate::pipeline::lsb::Strategy;
    use tempfile::tempdir;

    fn setup(compression: Compression, strategy: Strategy) -> (tempfile::TempDir, PathBuf, String) {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        let samples = (0..80_000).map(|i| ((i * 31) % 20_000 - 10_000) as i16).collect();
        save_stream(&input, &SampleStream::new(samples, AudioFormat::default())).unwrap();

        let options = EncodeOptions {
            message: b"The quick brown fox jumps over the lazy dog".to_vec(),
            strategy,
            compression,
            store_dir: dir.path().join("records"),
            ..Default::default()
        };
        let summary = encode_file(&input, &output, &options).unwrap();
        (dir, output, summary.id)
    }

    fn options_for(dir: &Path, id: &str, compression: Compression) -> DecodeOptions {
        DecodeOptions {
            id: id.to_string(),
            compression,
            config: StegoConfig::default(),
            store_dir: dir.join("records"),
        }
    }

    #[test]
    fn test_decode_roundtrip() {
        for strategy in [Strategy::Sequential, Strategy::Chaotic] {
            let (dir, output, id) = setup(Compression::None, strategy);
            let message = decode_file(&output, &options_for(dir.path(), &id, Compression::None)).unwrap();
            assert_eq!(message, b"The quick brown fox jumps over the lazy dog");
        }
    }

    #[test]
    fn test_decode_roundtrip_compressed() {
        let (dir, output, id) = setup(Compression::Zstd, Strategy::Chaotic);
        let message = decode_file(&output, &options_for(dir.path(), &id, Compression::Zstd)).unwrap();
        assert_eq!(message, b"The quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn test_decode_unknown_id() {
        let (dir, output, _) = setup(Compression::None, Strategy::Chaotic);
        let result = decode_file(&output, &options_for(dir.path(), "deadbeef", Compression::None));
        assert!(matches!(result, Err(StegoError::RecordNotFound(_))));
    }
}
