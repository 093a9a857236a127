use crate::error::{Result, StegoError};
use crate::pipeline::lsb::Strategy;
use crate::pipeline::segment::Segment;
use serde::{Deserialize, Serialize};

/// Everything decode needs to find the payload again.
///
/// Persisted as a plain-text record, one field per line:
///
/// ```text
/// <segment start>
/// <segment end>
/// <message bit length>
/// <strategy flag>
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeMetadata {
    pub segment_start: usize,
    pub segment_end: usize,
    pub message_bit_length: usize,
    pub strategy: Strategy,
}

impl EncodeMetadata {
    pub fn new(segment: Segment, message_bit_length: usize, strategy: Strategy) -> Self {
        Self {
            segment_start: segment.start,
            segment_end: segment.end,
            message_bit_length,
            strategy,
        }
    }

    pub fn segment(&self) -> Segment {
        Segment::new(self.segment_start, self.segment_end)
    }

    /// Serialize to the four-line text record
    pub fn to_record(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n",
            self.segment_start,
            self.segment_end,
            self.message_bit_length,
            self.strategy.as_flag()
        )
    }

    /// Parse a four-line text record
    pub fn from_record(text: &str) -> Result<Self> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

        let segment_start = parse_field(lines.next(), "segment start")?;
        let segment_end = parse_field(lines.next(), "segment end")?;
        let message_bit_length = parse_field(lines.next(), "message bit length")?;
        let strategy = lines
            .next()
            .ok_or_else(|| StegoError::InvalidMetadata("missing strategy flag".into()))?
            .parse::<Strategy>()
            .map_err(|e| StegoError::InvalidMetadata(e.to_string()))?;

        if lines.next().is_some() {
            return Err(StegoError::InvalidMetadata("trailing fields".into()));
        }
        if segment_start > segment_end {
            return Err(StegoError::InvalidMetadata(format!(
                "segment start {} after end {}",
                segment_start, segment_end
            )));
        }

        Ok(Self {
            segment_start,
            segment_end,
            message_bit_length,
            strategy,
        })
    }
}

fn parse_field(line: Option<&str>, name: &str) -> Result<usize> {
    let line = line.ok_or_else(|| StegoError::InvalidMetadata(format!("missing {}", name)))?;
    line.parse()
        .map_err(|_| StegoError::InvalidMetadata(format!("{} is not a count: {:?}", name, line)))
}

/// Keystream used by one encode call, kept verbatim for its matching decode
#[derive(Clone, PartialEq, Eq)]
pub struct Key(Vec<u8>);

impl Key {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Keys never print their bytes
impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key({} bytes)", self.0.len())
    }
}
