// Author: laravel-cfg contributors
// License: MIT

use crate::ast::{Mapping, ValueNode};

/// Resolve a dotted path such as `backup.source.files.follow_links`.
///
/// Every segment is matched against string keys only; `monitor_backups.0`
/// does not reach the integer key `0`. Any missing segment or non-array
/// intermediate yields `None`.
pub fn get<'a>(mapping: &'a Mapping, path: &str) -> Option<&'a ValueNode> {
    let mut segments = path.split('.');
    let mut current = mapping.get(segments.next()?)?;

    for segment in segments {
        current = current.as_mapping()?.get(segment)?;
    }

    Some(current)
}

pub fn has(mapping: &Mapping, path: &str) -> bool {
    get(mapping, path).is_some()
}

impl Mapping {
    /// Method form of [`get`].
    pub fn get_path(&self, path: &str) -> Option<&ValueNode> {
        get(self, path)
    }
}
