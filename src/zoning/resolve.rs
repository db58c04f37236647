//! Overlap resolution
//!
//! Turns raw heading matches into a non-overlapping list of zones. One left to
//! right pass over the live ranges, sorted by `(begin, end)`:
//!
//! 1. When the next range overlaps the current one and the current one is
//!    shorter, the current one is marked truncated and the next one is kept.
//! 2. Otherwise every following range that still overlaps the current one is
//!    ignored. Equal lengths take this branch.
//! 3. A zone ends just after the last non-whitespace character before the
//!    next surviving range begins.
//! 4. The last zone, or a zone whose overlaps ran off the end of the list,
//!    ends at `bound`.
//!
//! The input is never modified; ignored ranges simply do not appear in the
//! output.

use super::range::{HeadingRange, Range};
use tracing::trace;

/// Surviving zones and one heading per zone, both ordered by begin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub zones: Vec<Range>,
    pub headings: Vec<HeadingRange>,
}

/// Resolve `ranges` over `text`. Zones never extend past `bound`.
pub fn resolve(ranges: &[Range], text: &str, bound: usize) -> Resolution {
    let mut live: Vec<&Range> = ranges.iter().filter(|r| r.is_live()).collect();
    live.sort_by_key(|r| r.span());

    let mut ignored = vec![false; live.len()];
    let next_live =
        |ignored: &[bool], after: usize| (after + 1..live.len()).find(|&k| !ignored[k]);

    let mut resolution = Resolution::default();
    for i in 0..live.len() {
        if ignored[i] {
            continue;
        }
        let current = live[i];
        let mut truncated = current.truncated;
        let mut next = next_live(&ignored, i);

        if let Some(j) = next {
            if live[j].begin < current.end {
                if current.len() < live[j].len() {
                    trace!(current = %current, next = %live[j], "truncating current");
                    truncated = true;
                } else {
                    let mut k = Some(j);
                    while let Some(idx) = k.filter(|&idx| live[idx].begin < current.end) {
                        trace!(current = %current, next = %live[idx], "ignoring next");
                        ignored[idx] = true;
                        k = next_live(&ignored, idx);
                    }
                    next = k;
                }
            }
        }

        let (heading_begin, heading_end) = trim_span(text, current.begin, current.end);
        let zone_end = match next {
            Some(j) => last_content_end(text, heading_begin, live[j].begin),
            None => bound.max(heading_begin),
        };

        let zone = Range {
            begin: heading_begin,
            end: zone_end,
            label: current.label.clone(),
            attributes: current.attributes.clone(),
            ignore: false,
            truncated,
            generic: current.generic,
            promoted: current.promoted,
        };
        resolution.headings.push(HeadingRange {
            label: zone.label.clone(),
            begin: zone.begin,
            end: zone.end,
            text: zone.text(text).to_string(),
            heading_begin,
            heading_end,
            heading_text: text.get(heading_begin..heading_end).unwrap_or("").to_string(),
            attributes: zone.attributes.clone(),
            truncated,
            generic: zone.generic,
            positions: None,
        });
        resolution.zones.push(zone);
    }

    resolution
}

/// `[begin, end)` with leading and trailing whitespace removed. A span that
/// is all whitespace collapses to `[begin, begin)`.
pub fn trim_span(text: &str, begin: usize, end: usize) -> (usize, usize) {
    let Some(slice) = text.get(begin..end) else {
        return (begin, begin);
    };
    let leading = slice.len() - slice.trim_start().len();
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return (begin, begin);
    }
    (begin + leading, begin + leading + trimmed.len())
}

/// Offset just past the last non-whitespace character in `[floor, limit)`,
/// or `floor` if there is none.
pub fn last_content_end(text: &str, floor: usize, limit: usize) -> usize {
    if limit <= floor {
        return floor;
    }
    text.get(floor..limit)
        .map(|slice| floor + slice.trim_end().len())
        .unwrap_or(floor)
}
