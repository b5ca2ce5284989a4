use nom::{branch::alt, bytes::complete::tag, combinator::map, IResult};

/// Strand of a segment as written in GFA links and SPAdes paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Orientation {
    Forward,
    Backward,
}

impl Orientation {
    /// Parse an orientation from a single-element, where + is
    /// Forward, - is Backward
    #[inline]
    pub fn from_bytes_plus_minus<T: AsRef<[u8]>>(bs: T) -> Option<Self> {
        match bs.as_ref() {
            b"+" => Some(Orientation::Forward),
            b"-" => Some(Orientation::Backward),
            _ => None,
        }
    }

    pub(crate) fn parse_plus_minus(i: &[u8]) -> IResult<&[u8], Orientation> {
        let fwd = map(tag("+"), |_| Orientation::Forward);
        let bwd = map(tag("-"), |_| Orientation::Backward);
        alt((fwd, bwd))(i)
    }
}

/// Split an oriented segment ID such as `12+` into its name and
/// strand.
pub fn split_oriented(step: &[u8]) -> Option<(&[u8], Orientation)> {
    let (last, name) = step.split_last()?;
    if name.is_empty() {
        return None;
    }
    let orient = Orientation::from_bytes_plus_minus([*last])?;
    Some((name, orient))
}
