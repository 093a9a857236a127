//! Chaosteg - chaos-keyed LSB audio steganography
//!
//! Hides a short message in the least-significant bits of 16-bit PCM audio.
//! The message is XOR-encrypted with a keystream drawn from the logistic map,
//! and the embedding order within a segment around the midpoint of the
//! stream is either sequential or drawn from a chaotic position sequence.
//!
//! ## Pipeline
//!
//! ```text
//! Message → Compress → Cipher(keystream) → Bits → LSB embed (segment) → WAV
//! WAV → Segment → LSB extract → Bytes → Cipher(key) → Decompress → Message
//! ```
//!
//! - **Chaos**: logistic map `x' = r·x·(1 − x)`, one bit per iteration
//! - **Cipher**: XOR with the keystream, which is also the decode key
//! - **Embed**: 1..=8 LSBs per sample, sequential or chaotic order
//! - **Harness**: noise, lossy transcode, filtering, resampling and more,
//!   scored by the fraction of hidden bits that survive
//!
//! ## Example
//!
//! ```no_run
//! use chaosteg::audio::load_stream;
//! use chaosteg::config::StegoConfig;
//! use chaosteg::pipeline::{decode, encode, Strategy};
//! use std::path::Path;
//!
//! let stream = load_stream(Path::new("song.wav")).unwrap();
//! let config = StegoConfig::default();
//!
//! let result = encode(&stream, b"hello", false, Strategy::Chaotic, &config).unwrap();
//! let message = decode(&result.stream, &result.metadata, &result.key, &config).unwrap();
//! assert_eq!(message, b"hello");
//! ```

pub mod attacks;
pub mod audio;
pub mod chaos;
pub mod cli;
pub mod config;
pub mod error;
pub mod metadata;
pub mod metrics;
pub mod pipeline;
pub mod store;

pub use audio::{AudioFormat, SampleStream};
pub use chaos::ChaosParams;
pub use config::StegoConfig;
pub use error::{Result, StegoError};
pub use metadata::{EncodeMetadata, Key};
