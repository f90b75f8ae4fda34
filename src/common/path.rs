use crate::error::InputError;

/// Segment of an attribute path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Segment<'a> {
    /// Map key or top-level attribute name.
    Name(&'a str),
    /// List index.
    Index(usize),
}

fn invalid(path: &str, reason: &'static str) -> InputError {
    InputError::InvalidPath {
        path: path.to_string(),
        reason,
    }
}

/// Split a dotted, bracket-indexed attribute path such as `a.b[0].c` into segments.
///
/// ```rust
/// use dynamodb_odm::common::path::{Segment, parse};
///
/// let segments = parse("a.b[0].c").unwrap();
/// assert_eq!(
///     segments,
///     vec![Segment::Name("a"), Segment::Name("b"), Segment::Index(0), Segment::Name("c")],
/// );
/// ```
pub fn parse(path: &str) -> Result<Vec<Segment<'_>>, InputError> {
    if path.is_empty() {
        return Err(invalid(path, "path is empty"));
    }
    let mut segments = Vec::new();
    for part in path.split('.') {
        let (name, mut rest) = match part.find('[') {
            Some(position) => part.split_at(position),
            None => (part, ""),
        };
        if name.is_empty() {
            return Err(invalid(path, "every segment must start with a name"));
        }
        if name.contains(']') {
            return Err(invalid(path, "unexpected `]`"));
        }
        segments.push(Segment::Name(name));
        while !rest.is_empty() {
            let Some(inner) = rest.strip_prefix('[') else {
                return Err(invalid(path, "unexpected text after index"));
            };
            let Some(end) = inner.find(']') else {
                return Err(invalid(path, "unterminated index"));
            };
            let digits = &inner[..end];
            if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
                return Err(invalid(path, "index must be a non-negative integer"));
            }
            let index = digits
                .parse()
                .map_err(|_| invalid(path, "index is out of range"))?;
            segments.push(Segment::Index(index));
            rest = &inner[end + 1..];
        }
    }
    Ok(segments)
}
