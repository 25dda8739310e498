/// Byte range selected by a `Range` request header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// No usable range; serve the whole body
    Full,
    /// Inclusive byte offsets
    Partial { start: u64, end: u64 },
    /// Syntactically valid but outside the body
    Unsatisfiable,
}

impl ByteRange {
    /// `Content-Range` header value for a partial or unsatisfiable response
    pub fn content_range(&self, len: u64) -> Option<String> {
        match self {
            ByteRange::Full => None,
            ByteRange::Partial { start, end } => Some(format!("bytes {}-{}/{}", start, end, len)),
            ByteRange::Unsatisfiable => Some(format!("bytes */{}", len)),
        }
    }
}

/// Resolve a single `bytes=` range against a body of `len` bytes.
///
/// Malformed headers and multi-range requests fall back to the full body.
pub fn resolve_range(header: Option<&str>, len: u64) -> ByteRange {
    let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return ByteRange::Full;
    };
    if spec.contains(',') {
        return ByteRange::Full;
    }
    let Some((start, end)) = spec.trim().split_once('-') else {
        return ByteRange::Full;
    };

    match (start.trim(), end.trim()) {
        ("", "") => ByteRange::Full,
        ("", suffix) => match suffix.parse::<u64>() {
            Ok(0) => ByteRange::Unsatisfiable,
            Ok(_) if len == 0 => ByteRange::Unsatisfiable,
            Ok(n) => ByteRange::Partial {
                start: len.saturating_sub(n),
                end: len - 1,
            },
            Err(_) => ByteRange::Full,
        },
        (start, "") => match start.parse::<u64>() {
            Ok(start) if start >= len => ByteRange::Unsatisfiable,
            Ok(start) => ByteRange::Partial {
                start,
                end: len - 1,
            },
            Err(_) => ByteRange::Full,
        },
        (start, end) => match (start.parse::<u64>(), end.parse::<u64>()) {
            (Ok(start), Ok(end)) if start > end => ByteRange::Full,
            (Ok(start), Ok(_)) if start >= len => ByteRange::Unsatisfiable,
            (Ok(start), Ok(end)) => ByteRange::Partial {
                start,
                end: end.min(len - 1),
            },
            _ => ByteRange::Full,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_or_malformed_header_serves_full_body() {
        assert_eq!(resolve_range(None, 100), ByteRange::Full);
        assert_eq!(resolve_range(Some("items=0-5"), 100), ByteRange::Full);
        assert_eq!(resolve_range(Some("bytes=abc"), 100), ByteRange::Full);
        assert_eq!(resolve_range(Some("bytes=5-2"), 100), ByteRange::Full);
        assert_eq!(resolve_range(Some("bytes=0-1,5-6"), 100), ByteRange::Full);
        assert_eq!(resolve_range(Some("bytes=-"), 100), ByteRange::Full);
    }

    #[test]
    fn test_explicit_and_open_ranges() {
        assert_eq!(
            resolve_range(Some("bytes=0-9"), 100),
            ByteRange::Partial { start: 0, end: 9 }
        );
        assert_eq!(
            resolve_range(Some("bytes=90-"), 100),
            ByteRange::Partial { start: 90, end: 99 }
        );
        assert_eq!(
            resolve_range(Some("bytes=50-500"), 100),
            ByteRange::Partial { start: 50, end: 99 }
        );
    }

    #[test]
    fn test_suffix_ranges() {
        assert_eq!(
            resolve_range(Some("bytes=-10"), 100),
            ByteRange::Partial { start: 90, end: 99 }
        );
        assert_eq!(
            resolve_range(Some("bytes=-500"), 100),
            ByteRange::Partial { start: 0, end: 99 }
        );
        assert_eq!(resolve_range(Some("bytes=-0"), 100), ByteRange::Unsatisfiable);
    }

    #[test]
    fn test_unsatisfiable_ranges() {
        assert_eq!(resolve_range(Some("bytes=100-"), 100), ByteRange::Unsatisfiable);
        assert_eq!(resolve_range(Some("bytes=100-200"), 100), ByteRange::Unsatisfiable);
        assert_eq!(resolve_range(Some("bytes=-5"), 0), ByteRange::Unsatisfiable);
        assert_eq!(
            ByteRange::Unsatisfiable.content_range(100).as_deref(),
            Some("bytes */100")
        );
        assert_eq!(
            ByteRange::Partial { start: 0, end: 9 }
                .content_range(100)
                .as_deref(),
            Some("bytes 0-9/100")
        );
    }
}
