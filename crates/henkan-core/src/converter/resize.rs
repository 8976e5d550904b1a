//! Moving segment boundaries.

use crate::request::ConversionRequest;
use crate::segments::{RequestType, SegmentType, Segments};
use crate::unicode::{char_len, char_substring};

use super::{segment_index, Converter, ConverterError};

/// Longest size array accepted by [`Converter::resize_segments`].
const MAX_SIZE_ARRAY_LEN: usize = 256;

fn check_conversion(segments: &Segments) -> Result<(), ConverterError> {
    if segments.request_type() != RequestType::Conversion {
        return Err(ConverterError::WrongRequestType {
            expected: RequestType::Conversion,
            actual: segments.request_type(),
        });
    }
    Ok(())
}

impl Converter {
    /// Grow (`offset > 0`) or shrink (`offset < 0`) conversion segment
    /// `index` by `offset` characters, taking them from or giving them to the
    /// segments on its right, then convert again.
    pub fn resize_segment(
        &self,
        segments: &mut Segments,
        request: &ConversionRequest,
        index: usize,
        offset: i32,
    ) -> Result<(), ConverterError> {
        check_conversion(segments)?;
        let invalid = ConverterError::InvalidResize { index, offset };
        if offset == 0 {
            return Err(invalid);
        }
        let absolute = segment_index(segments, index)?;
        if offset > 0 && absolute + 1 == segments.segments_size() {
            tracing::debug!("the last segment cannot grow");
            return Err(invalid);
        }

        let cur_key = segments
            .segment(absolute)
            .map(|s| s.key().to_string())
            .unwrap_or_default();
        let cur_len = char_len(&cur_key) as i64;
        let new_len = cur_len + i64::from(offset);
        if new_len <= 0 {
            return Err(invalid);
        }

        if offset > 0 {
            let mut remaining = i64::from(offset);
            let mut new_key = cur_key;
            let mut last_key = String::new();
            let mut last_len = 0i64;
            while absolute + 1 < segments.segments_size() {
                last_key = segments.erase_segment(absolute + 1)?.key().to_string();
                last_len = char_len(&last_key) as i64;
                remaining -= last_len;
                if remaining <= 0 {
                    new_key.push_str(char_substring(&last_key, 0, (remaining + last_len) as usize));
                    break;
                }
                new_key.push_str(&last_key);
            }

            if let Some(segment) = segments.segment_mut(absolute) {
                segment.clear();
                segment.set_segment_type(SegmentType::FixedBoundary);
                segment.set_key(new_key);
            }
            if remaining < 0 {
                let rest = char_substring(&last_key, (remaining + last_len) as usize, (-remaining) as usize);
                let segment = segments.insert_segment(absolute + 1)?;
                segment.set_segment_type(SegmentType::Free);
                segment.set_key(rest);
            }
        } else {
            let new_len = new_len as usize;
            let tail = char_substring(&cur_key, new_len, cur_len as usize).to_string();
            if let Some(segment) = segments.segment_mut(absolute) {
                segment.clear();
                segment.set_segment_type(SegmentType::FixedBoundary);
                segment.set_key(char_substring(&cur_key, 0, new_len));
            }
            match segments.segment_mut(absolute + 1) {
                Some(next) => {
                    next.set_segment_type(SegmentType::Free);
                    let key = format!("{tail}{}", next.key());
                    next.set_key(key);
                }
                None => {
                    let next = segments.add_segment();
                    next.set_segment_type(SegmentType::Free);
                    next.set_key(tail);
                }
            }
        }

        segments.set_resized(true);
        self.immutable_converter.convert_for_request(request, segments);
        self.rewrite_and_suppress_candidates(request, segments);
        Ok(())
    }

    /// Re-split `count` conversion segments starting at `start` into pieces
    /// of the given character lengths. Zero lengths are skipped and any input
    /// left over becomes one more segment.
    pub fn resize_segments(
        &self,
        segments: &mut Segments,
        request: &ConversionRequest,
        start: usize,
        count: usize,
        new_sizes: &[u8],
    ) -> Result<(), ConverterError> {
        check_conversion(segments)?;
        let absolute = segment_index(segments, start)?;
        let end = absolute + count;
        if end <= absolute || end > segments.segments_size() || new_sizes.len() > MAX_SIZE_ARRAY_LEN {
            return Err(ConverterError::InvalidResizeRange {
                start,
                count,
                sizes: new_sizes.len(),
            });
        }

        let key: String = segments.iter().skip(absolute).take(count).map(|s| s.key()).collect();
        if key.is_empty() {
            return Err(ConverterError::EmptyKey);
        }

        let key_len = char_len(&key);
        let mut consumed = 0;
        let mut new_keys = Vec::with_capacity(new_sizes.len() + 1);
        for &size in new_sizes {
            if size != 0 && consumed < key_len {
                new_keys.push(char_substring(&key, consumed, size as usize).to_string());
                consumed += size as usize;
            }
        }
        if consumed < key_len {
            new_keys.push(char_substring(&key, consumed, key_len - consumed).to_string());
        }

        segments.erase_segments(absolute, count)?;
        for (i, new_key) in new_keys.into_iter().enumerate() {
            let segment = segments.insert_segment(absolute + i)?;
            segment.set_segment_type(SegmentType::FixedBoundary);
            segment.set_key(new_key);
        }

        segments.set_resized(true);
        self.immutable_converter.convert_for_request(request, segments);
        self.rewrite_and_suppress_candidates(request, segments);
        Ok(())
    }
}
