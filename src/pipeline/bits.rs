/// Expand bytes into bits, MSB-first within each byte
pub fn bytes_to_bits(data: &[u8]) -> Vec<bool> {
    let mut bits = Vec::with_capacity(data.len() * 8);
    for &byte in data {
        for i in (0..8).rev() {
            bits.push((byte >> i) & 1 == 1);
        }
    }
    bits
}

/// Regroup MSB-first bits into bytes.
/// A trailing group shorter than 8 bits is dropped.
pub fn bits_to_bytes(bits: &[bool]) -> Vec<u8> {
    bits.chunks_exact(8)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u8, |byte, &bit| (byte << 1) | bit as u8)
        })
        .collect()
}

/// Count positions where two bit sequences agree, over their common length
pub fn count_matching(a: &[bool], b: &[bool]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x == y).count()
}
