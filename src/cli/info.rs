use crate::audio::load_stream;
use crate::config::StegoConfig;
use crate::error::Result;
use crate::pipeline::segment::Segment;
use std::path::Path;

/// Describe a WAV file and how much it can carry
pub fn show_info(path: &Path, config: &StegoConfig) -> Result<String> {
    let stream = load_stream(path)?;
    let format = stream.format;
    let options = config.codec_options();

    let mut output = String::new();

    output.push_str("Carrier Information\n");
    output.push_str("===================\n\n");

    output.push_str(&format!("File: {}\n", path.display()));
    output.push_str(&format!("Channels: {}\n", format.channels));
    output.push_str(&format!("Sample rate: {} Hz\n", format.sample_rate));
    output.push_str(&format!("Bits per sample: {}\n", format.bits_per_sample));
    output.push_str(&format!("Samples: {}\n", stream.len()));
    output.push_str(&format!("Duration: {:.2} s\n", stream.duration_secs()));
    output.push('\n');

    let window = Segment::centered(stream.len(), config.half_width);
    let full = Segment::full(stream.len());
    output.push_str(&format!("Capacity ({} LSB per sample):\n", config.num_lsb));
    output.push_str(&format!(
        "  Midpoint window {}..{}: {}\n",
        window.start,
        window.end,
        format_capacity(options.capacity(window.len()))
    ));
    output.push_str(&format!(
        "  Full stream: {}\n",
        format_capacity(options.capacity(full.len()))
    ));

    Ok(output)
}

fn format_capacity(bits: usize) -> String {
    let bytes = bits / 8;
    if bytes < 1024 {
        format!("{} bits ({} B)", bits, bytes)
    } else if bytes < 1024 * 1024 {
        format!("{} bits ({:.1} KB)", bits, bytes as f64 / 1024.0)
    } else {
        format!("{} bits ({:.1} MB)", bits, bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{save_stream, AudioFormat, SampleStream};
    use tempfile::tempdir;

    #[test]
    fn test_show_info() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("carrier.wav");
        let format = AudioFormat {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 16,
        };
        save_stream(&path, &SampleStream::new(vec![0; 96_000], format)).unwrap();

        let info = show_info(&path, &StegoConfig::default()).unwrap();
        assert!(info.contains("Channels: 2"));
        assert!(info.contains("Sample rate: 48000 Hz"));
        assert!(info.contains("Duration: 1.00 s"));
        assert!(info.contains("Midpoint window 25950..70050: 44100 bits"));
        assert!(info.contains("Full stream: 96000 bits"));
    }

    #[test]
    fn test_format_capacity() {
        assert_eq!(format_capacity(800), "800 bits (100 B)");
        assert_eq!(format_capacity(8 * 2048), "16384 bits (2.0 KB)");
    }
}
