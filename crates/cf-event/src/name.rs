//! Hierarchical Event Names
//!
//! Event names are made of segments joined by [`EVENT_NAME_SEPARATOR`],
//! ordered most-specific first: `WOLF:GRAVEL:FOOTSTEP`. Resolution strips
//! the left-most segment until a name matches.

/// Separator between event name segments.
///
/// Compatibility constant: authored banks depend on it, changing it breaks
/// every existing bank.
pub const EVENT_NAME_SEPARATOR: char = ':';

/// Build an event name from segments
///
/// Segments are upper-cased and joined in argument order. Empty segments
/// (including an empty first one) are skipped.
///
/// ```rust
/// use cf_event::make_event_name;
///
/// assert_eq!(make_event_name("laser", ["shot"]), "LASER:SHOT");
/// assert_eq!(make_event_name("wolf", ["", "gravel", "footstep"]), "WOLF:GRAVEL:FOOTSTEP");
/// ```
pub fn make_event_name<I, S>(first: &str, rest: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut name = first.to_uppercase();

    for segment in rest {
        let segment = segment.as_ref();
        if segment.is_empty() {
            continue;
        }
        if !name.is_empty() {
            name.push(EVENT_NAME_SEPARATOR);
        }
        name.push_str(&segment.to_uppercase());
    }

    name
}

/// The next, more general name: everything after the first separator
///
/// Returns `None` when there is no separator or nothing follows it.
#[inline]
pub fn generalize(name: &str) -> Option<&str> {
    let split = name.find(EVENT_NAME_SEPARATOR)?;
    let rest = &name[split + EVENT_NAME_SEPARATOR.len_utf8()..];
    if rest.is_empty() { None } else { Some(rest) }
}

/// Iterator over a name and each of its generalizations
///
/// `WOLF:GRAVEL:FOOTSTEP` yields `WOLF:GRAVEL:FOOTSTEP`, `GRAVEL:FOOTSTEP`,
/// `FOOTSTEP`.
pub fn fallback_chain(name: &str) -> FallbackChain<'_> {
    FallbackChain {
        next: if name.is_empty() { None } else { Some(name) },
    }
}

/// See [`fallback_chain`]
#[derive(Debug, Clone)]
pub struct FallbackChain<'a> {
    next: Option<&'a str>,
}

impl<'a> Iterator for FallbackChain<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = generalize(current);
        Some(current)
    }
}
