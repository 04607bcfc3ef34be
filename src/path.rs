use crate::constants::BASE_SEGMENT;

/// One `/`-delimited token of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Param(String),
    /// `abc*` or a bare `*`. The prefix is empty for the latter.
    Wildcard { prefix: String },
}

impl Segment {
    fn parse(part: &str) -> Segment {
        if let Some(name) = part.strip_prefix(':') {
            Segment::Param(name.to_owned())
        } else if part.ends_with('*') {
            Segment::Wildcard {
                prefix: part.replace('*', ""),
            }
        } else {
            Segment::Literal(part.to_owned())
        }
    }
}

/// Splits a route pattern into segments.
///
/// Spaces are removed and empty parts dropped, so `"/a//b "` and `"a/b"` are the same route.
/// A route without any part resolves to the base segment.
pub(crate) fn tokenize(route: &str) -> Vec<Segment> {
    let segments: Vec<Segment> = route
        .split('/')
        .map(|part| part.replace(' ', ""))
        .filter(|part| !part.is_empty())
        .map(|part| Segment::parse(&part))
        .collect();

    if segments.is_empty() {
        return vec![Segment::Literal(BASE_SEGMENT.to_owned())];
    }

    segments
}

/// Which segment positions of a route are parameters, out of how many segments.
///
/// Routes sharing a trie shape (`/user/:userId` and `/user/:uid/posts`) bind their
/// parameter names under different signatures on the same parameter node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ParamsSignature {
    pub(crate) positions: Vec<usize>,
    pub(crate) len: usize,
}

impl ParamsSignature {
    pub(crate) fn of(segments: &[Segment]) -> ParamsSignature {
        let positions = segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| matches!(segment, Segment::Param(_)))
            .map(|(idx, _)| idx)
            .collect();

        ParamsSignature {
            positions,
            len: segments.len(),
        }
    }
}

/// Splits a request path into its raw (still percent-encoded) parts.
pub(crate) fn split_request_path(path: &str) -> Vec<&str> {
    let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();

    if parts.is_empty() {
        return vec![BASE_SEGMENT];
    }

    parts
}
