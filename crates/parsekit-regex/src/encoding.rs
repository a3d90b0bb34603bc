use std::cmp::Ordering;

/// Sentinel returned by [`Encoding::code_point`] for a byte outside every
/// declared range.
pub const INVALID_CODE_POINT: usize = usize::MAX;

/// A minimal disjoint partition of the input-symbol (byte) space, finely
/// split at every range boundary any input pattern mentions. Two bytes
/// share a code point iff every character class in every input pattern
/// treats them identically.
#[derive(Debug, Clone, Default)]
pub struct Encoding {
  ranges: Vec<(u8, u8)>,
}

impl Encoding {
  /// Builds the partition from the union of ranges asserted by a set of
  /// regex ASTs (see [`crate::ast::Ast::collect_ranges`]).
  pub fn build(ranges: &[(u8, u8)]) -> Self {
    if ranges.is_empty() {
      return Self::default();
    }

    // Coordinate-compress: every range boundary becomes a breakpoint, so
    // between any two consecutive breakpoints the set of covering input
    // ranges (and hence the "identically treated" equivalence class) is
    // constant.
    let mut breakpoints: Vec<u16> = Vec::with_capacity(ranges.len() * 2);
    for &(lo, hi) in ranges {
      breakpoints.push(lo as u16);
      breakpoints.push(hi as u16 + 1);
    }
    breakpoints.sort_unstable();
    breakpoints.dedup();

    let mut partition = Vec::new();
    for w in breakpoints.windows(2) {
      let (start, end) = (w[0], w[1]); // half-open [start, end)
      let covered = ranges.iter().any(|&(lo, hi)| lo as u16 <= start && start < hi as u16 + 1);
      if covered {
        partition.push((start as u8, (end - 1) as u8));
      }
    }

    log::trace!("encoding built {} code points from {} input ranges", partition.len(), ranges.len());
    Self { ranges: partition }
  }

  /// The code point of the range containing `byte`, or
  /// [`INVALID_CODE_POINT`] if `byte` lies outside every declared range.
  pub fn code_point(&self, byte: u8) -> usize {
    match self.ranges.binary_search_by(|&(lo, hi)| {
      if (byte as u16) < lo as u16 {
        Ordering::Greater
      } else if (byte as u16) > hi as u16 {
        Ordering::Less
      } else {
        Ordering::Equal
      }
    }) {
      Ok(idx) => idx,
      Err(_) => INVALID_CODE_POINT,
    }
  }

  /// The code points whose ranges together tile `query`.
  pub fn code_point_ranges(&self, query: (u8, u8)) -> Vec<usize> {
    let (lo, hi) = query;
    self
      .ranges
      .iter()
      .enumerate()
      .filter(|(_, &(rlo, rhi))| rhi >= lo && rlo <= hi)
      .map(|(i, _)| i)
      .collect()
  }

  pub fn num_code_points(&self) -> usize {
    self.ranges.len()
  }

  pub fn ranges(&self) -> &[(u8, u8)] {
    &self.ranges
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partition_is_disjoint_and_covers_the_union() {
    let input = [(b'a', b'd'), (b'c', b'z'), (b'0', b'9')];
    let encoding = Encoding::build(&input);
    let ranges = encoding.ranges();
    for w in ranges.windows(2) {
      assert!(w[0].1 < w[1].0, "ranges must be sorted and disjoint: {:?}", ranges);
    }
    for &(lo, hi) in &input {
      for b in lo..=hi {
        assert_ne!(encoding.code_point(b), INVALID_CODE_POINT);
      }
    }
  }

  #[test]
  fn bytes_outside_every_range_are_invalid() {
    let encoding = Encoding::build(&[(b'a', b'z')]);
    assert_eq!(encoding.code_point(b'0'), INVALID_CODE_POINT);
  }

  #[test]
  fn overlapping_classes_split_at_the_boundary() {
    // [a-d] and "a" contribute (a,d) and (a,a): "a" must land in its own
    // code point, distinct from b..d, since [a-d]*a needs to distinguish
    // them for its longest-match tie-break.
    let encoding = Encoding::build(&[(b'a', b'd'), (b'a', b'a')]);
    assert_ne!(encoding.code_point(b'a'), encoding.code_point(b'b'));
  }
}
