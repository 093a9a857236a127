//! Encode/decode pipeline.
//!
//! ```text
//! Encode: Payload → Cipher(keystream) → Bits → LSB embed → Splice into stream
//! Decode: Slice segment → LSB extract → Bytes → Cipher(key) → Payload
//! ```
//!
//! Decode has no integrity check: with the wrong metadata or key it still
//! returns bytes, just not the right ones.

use crate::audio::SampleStream;
use crate::config::StegoConfig;
use crate::error::{Result, StegoError};
use crate::metadata::{EncodeMetadata, Key};
use crate::pipeline::bits::{bits_to_bytes, bytes_to_bits};
use crate::pipeline::cipher::{decrypt, derive_key, encrypt};
use crate::pipeline::lsb::{embed, extract, CodecOptions, Strategy};
use crate::pipeline::segment::{splice, Segment};
use log::{debug, info};

/// Result of a successful encode; metadata and key must be kept for decode
#[derive(Debug, Clone)]
pub struct EncodeResult {
    pub stream: SampleStream,
    pub metadata: EncodeMetadata,
    pub key: Key,
}

/// Hide `message` in `stream`.
///
/// The input stream is left untouched; the returned stream carries the
/// payload inside the selected segment and is otherwise identical.
pub fn encode(
    stream: &SampleStream,
    message: &[u8],
    use_full_stream: bool,
    strategy: Strategy,
    config: &StegoConfig,
) -> Result<EncodeResult> {
    // Step 1: Select the carrier segment
    let segment = Segment::select(stream.len(), use_full_stream, config.half_width);
    debug!(
        "segment {}..{} of {} samples",
        segment.start,
        segment.end,
        stream.len()
    );

    // Step 2: Derive a keystream sized to this message
    let key = derive_key(&config.key_params, message.len());

    // Step 3: Encrypt and expand to bits
    let ciphertext = encrypt(message, &key);
    let bits = bytes_to_bits(&ciphertext);

    // Step 4: Embed into a copy of the segment and splice it back
    let carrier = &stream.samples[segment.start..segment.end];
    let modified = embed(carrier, &bits, strategy, &config.codec_options())?;
    let samples = splice(&stream.samples, segment, &modified);

    let metadata = EncodeMetadata::new(segment, bits.len(), strategy);
    info!(
        "encoded {} bytes ({} bits) into samples {}..{} using {} order",
        message.len(),
        bits.len(),
        segment.start,
        segment.end,
        strategy
    );

    Ok(EncodeResult {
        stream: stream.with_samples(samples),
        metadata,
        key: Key::new(key),
    })
}

/// Recover the payload hidden by [`encode`]
pub fn decode(
    stream: &SampleStream,
    metadata: &EncodeMetadata,
    key: &Key,
    config: &StegoConfig,
) -> Result<Vec<u8>> {
    let options = config.codec_options();
    check_segment(stream.len(), metadata)?;

    let bits = extract_payload_bits(&stream.samples, metadata, &options);
    let ciphertext = bits_to_bytes(&bits);
    let plaintext = decrypt(&ciphertext, key.as_bytes());

    info!(
        "decoded {} bytes from samples {}..{}",
        plaintext.len(),
        metadata.segment_start,
        metadata.segment_end
    );
    Ok(plaintext)
}

/// Raw (still encrypted) bits at the location described by `metadata`.
/// The caller guarantees the segment lies inside `samples`.
pub fn extract_payload_bits(
    samples: &[i16],
    metadata: &EncodeMetadata,
    options: &CodecOptions,
) -> Vec<bool> {
    let segment = &samples[metadata.segment_start..metadata.segment_end];
    extract(
        segment,
        metadata.message_bit_length,
        metadata.strategy,
        options,
    )
}

/// Check that the recorded segment lies inside a stream of `stream_len` samples
pub fn check_segment(stream_len: usize, metadata: &EncodeMetadata) -> Result<()> {
    if !metadata.segment().fits(stream_len) {
        return Err(StegoError::IncompatibleAudio(format!(
            "segment {}..{} does not fit in {} samples",
            metadata.segment_start, metadata.segment_end, stream_len
        )));
    }
    Ok(())
}

/// Like [`check_segment`], and additionally require the segment to hold
/// every bit `metadata` describes
pub fn check_compatible(
    stream_len: usize,
    metadata: &EncodeMetadata,
    options: &CodecOptions,
) -> Result<()> {
    check_segment(stream_len, metadata)?;
    let segment = metadata.segment();
    let capacity = options.capacity(segment.len());
    if metadata.message_bit_length > capacity {
        return Err(StegoError::IncompatibleAudio(format!(
            "{} bits described but segment holds only {}",
            metadata.message_bit_length, capacity
        )));
    }
    Ok(())
}
