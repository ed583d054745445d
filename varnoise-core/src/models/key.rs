use std::fmt::{self, Display};

///
/// Genomic coordinate an aggregate is kept for: chromosome name and 1-based position.
///
/// Ordering is by chromosome (byte-wise) and then position, which is the order
/// records are exported in.
///
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariantKey {
    pub chrom: String,
    pub pos: u64,
}

impl VariantKey {
    pub fn new(chrom: impl Into<String>, pos: u64) -> Self {
        VariantKey {
            chrom: chrom.into(),
            pos,
        }
    }
}

impl Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chrom, self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_keys_sort_by_chrom_then_pos() {
        let mut keys = vec![
            VariantKey::new("chr2", 5),
            VariantKey::new("chr1", 200),
            VariantKey::new("chr1", 100),
            VariantKey::new("chr10", 1),
        ];
        keys.sort();

        assert_eq!(
            keys,
            vec![
                VariantKey::new("chr1", 100),
                VariantKey::new("chr1", 200),
                VariantKey::new("chr10", 1),
                VariantKey::new("chr2", 5),
            ]
        );
    }

    #[rstest]
    fn test_display() {
        assert_eq!(VariantKey::new("chrX", 42).to_string(), "chrX:42");
    }
}
