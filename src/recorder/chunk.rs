//! Chunk naming
//!
//! Rolling chunk files share a base name with a six-digit counter spliced in
//! before the extension: `capture.rec` becomes `capture_000000.rec`,
//! `capture_000001.rec`, and so on.

/// Build the name of chunk `counter` from the base file name
pub fn next_chunk_name(base: &str, counter: u32) -> String {
    match base.split_once('.') {
        Some((stem, ext)) => format!("{}_{:06}.{}", stem, counter, ext),
        None => format!("{}_{:06}", base, counter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_splices_before_extension() {
        assert_eq!(next_chunk_name("capture.mkv", 0), "capture_000000.mkv");
        assert_eq!(next_chunk_name("capture.mkv", 3), "capture_000003.mkv");
    }

    #[test]
    fn test_counter_is_zero_padded_to_six_digits() {
        assert_eq!(next_chunk_name("out.rec", 123456), "out_123456.rec");
        assert_eq!(next_chunk_name("out.rec", 42), "out_000042.rec");
    }

    #[test]
    fn test_base_without_extension() {
        assert_eq!(next_chunk_name("capture", 7), "capture_000007");
    }

    #[test]
    fn test_multi_dot_base_keeps_full_extension() {
        assert_eq!(next_chunk_name("a.rec.bak", 1), "a_000001.rec.bak");
    }
}
