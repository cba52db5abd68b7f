use core::fmt;

/// Formats raw modem bytes as text, replacing anything that is not valid
/// UTF-8 so partial or garbled frames can still be logged.
pub struct LossyStr<'a>(pub &'a [u8]);

impl fmt::Debug for LossyStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match core::str::from_utf8(self.0) {
            Ok(s) => write!(f, "{:?}", s),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LossyStr<'_> {
    fn format(&self, fmt: defmt::Formatter) {
        match core::str::from_utf8(self.0) {
            Ok(s) => defmt::write!(fmt, "{:?}", s),
            Err(_) => defmt::write!(fmt, "{:?}", self.0),
        }
    }
}

/// Longest valid UTF-8 prefix of `bytes`.
pub(crate) fn utf8_prefix(bytes: &[u8]) -> &str {
    match core::str::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
    }
}

/// Position of the first occurrence of `needle` in `haystack`.
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

pub(crate) fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_subslice() {
        assert_eq!(find(b"\r\n+CME ERROR: 516\r\n", b"+CME ERROR:"), Some(2));
        assert_eq!(find(b"OK", b"OK\r\n"), None);
        assert_eq!(find(b"abc", b""), None);
    }

    #[test]
    fn utf8_prefix_stops_at_garbage() {
        assert_eq!(utf8_prefix(b"OK\r\n"), "OK\r\n");
        assert_eq!(utf8_prefix(&[b'O', b'K', 0xff, b'x']), "OK");
    }
}
