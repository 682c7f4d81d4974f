use std::collections::HashMap;

use crate::core::RasterImage;

/// One distinct opaque color and how much of the image it covers.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorBucket {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Number of opaque pixels with exactly this RGB triple.
    pub count: u64,
    /// Share of all opaque pixels, in percent.
    pub percentage: f64,
}

/// Top-`k` exact-match RGB colors of an image, most frequent first.
///
/// One linear pass over the pixel buffer; fully transparent pixels are
/// skipped entirely (they neither bucket nor denominate). Ties are broken by
/// first-encounter order, so the result is deterministic for a given buffer.
///
/// Exact-color counting suits flat, limited-palette pixel art; a photograph
/// would produce a degenerate near-uniform histogram.
pub fn dominant_colors(image: &RasterImage, k: usize) -> Vec<ColorBucket> {
    struct Tally {
        count: u64,
        first_seen: usize,
    }

    let mut tallies: HashMap<[u8; 3], Tally> = HashMap::new();
    let mut opaque: u64 = 0;

    for px in image.data.chunks_exact(4) {
        if px[3] == 0 {
            continue;
        }
        opaque += 1;
        let next_rank = tallies.len();
        tallies
            .entry([px[0], px[1], px[2]])
            .and_modify(|t| t.count += 1)
            .or_insert(Tally {
                count: 1,
                first_seen: next_rank,
            });
    }

    if opaque == 0 {
        return Vec::new();
    }

    let mut entries: Vec<([u8; 3], Tally)> = tallies.into_iter().collect();
    entries.sort_by(|a, b| {
        b.1.count
            .cmp(&a.1.count)
            .then(a.1.first_seen.cmp(&b.1.first_seen))
    });
    entries.truncate(k);

    entries
        .into_iter()
        .map(|([r, g, b], t)| ColorBucket {
            r,
            g,
            b,
            count: t.count,
            percentage: t.count as f64 / opaque as f64 * 100.0,
        })
        .collect()
}
