use serde::{Deserialize, Serialize};

/// Default half-width of the midpoint window, in samples
pub const DEFAULT_HALF_WIDTH: usize = 22050;

/// Half-open sample range `[start, end)` carrying the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The entire stream
    pub fn full(stream_len: usize) -> Self {
        Self::new(0, stream_len)
    }

    /// Window of `half_width` samples either side of the stream midpoint,
    /// clipped to the stream bounds
    pub fn centered(stream_len: usize, half_width: usize) -> Self {
        let mid = stream_len / 2;
        let start = mid.saturating_sub(half_width);
        let end = mid.saturating_add(half_width).min(stream_len);
        Self::new(start, end)
    }

    /// Pick the full stream or the midpoint window
    pub fn select(stream_len: usize, use_full_stream: bool, half_width: usize) -> Self {
        if use_full_stream {
            Self::full(stream_len)
        } else {
            Self::centered(stream_len, half_width)
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the segment lies inside a stream of `stream_len` samples
    pub fn fits(&self, stream_len: usize) -> bool {
        self.start <= self.end && self.end <= stream_len
    }

    /// Capacity in bits at `num_lsb` bits per sample
    pub fn capacity_bits(&self, num_lsb: u32) -> usize {
        self.len() * num_lsb as usize
    }
}

/// Copy of `stream[segment]`, zero-padded where the stream ends early
pub fn slice_padded(stream: &[i16], segment: Segment) -> Vec<i16> {
    let mut out = vec![0i16; segment.len()];
    let stop = stream.len().min(segment.end);
    if segment.start < stop {
        let available = stop - segment.start;
        out[..available].copy_from_slice(&stream[segment.start..segment.start + available]);
    }
    out
}

/// Copy of `stream` with `segment` replaced by `replacement`
pub fn splice(stream: &[i16], segment: Segment, replacement: &[i16]) -> Vec<i16> {
    let mut out = Vec::with_capacity(stream.len());
    out.extend_from_slice(&stream[..segment.start]);
    out.extend_from_slice(replacement);
    out.extend_from_slice(&stream[segment.end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_window() {
        let seg = Segment::centered(100_000, DEFAULT_HALF_WIDTH);
        assert_eq!(seg, Segment::new(50_000 - 22050, 50_000 + 22050));
        assert_eq!(seg.len(), 44100);
    }

    #[test]
    fn test_centered_clipped_on_short_stream() {
        let seg = Segment::centered(1000, DEFAULT_HALF_WIDTH);
        assert_eq!(seg, Segment::new(0, 1000));

        let seg = Segment::centered(0, 10);
        assert!(seg.is_empty());
    }

    #[test]
    fn test_select_full() {
        assert_eq!(Segment::select(500, true, 10), Segment::new(0, 500));
        assert_eq!(Segment::select(500, false, 10), Segment::new(240, 260));
    }

    #[test]
    fn test_fits() {
        assert!(Segment::new(10, 20).fits(20));
        assert!(!Segment::new(10, 21).fits(20));
        assert!(!Segment::new(15, 10).fits(20));
    }

    #[test]
    fn test_capacity() {
        assert_eq!(Segment::new(0, 16).capacity_bits(1), 16);
        assert_eq!(Segment::new(4, 16).capacity_bits(2), 24);
    }

    #[test]
    fn test_slice_padded() {
        let stream = [1i16, 2, 3, 4, 5];
        assert_eq!(slice_padded(&stream, Segment::new(1, 4)), vec![2, 3, 4]);
        assert_eq!(slice_padded(&stream, Segment::new(3, 7)), vec![4, 5, 0, 0]);
        assert_eq!(slice_padded(&stream, Segment::new(6, 8)), vec![0, 0]);
    }

    #[test]
    fn test_splice() {
        let stream = [1i16, 2, 3, 4, 5];
        let out = splice(&stream, Segment::new(1, 3), &[9, 9]);
        assert_eq!(out, vec![1, 9, 9, 4, 5]);
        assert_eq!(stream, [1, 2, 3, 4, 5]);
    }
}
