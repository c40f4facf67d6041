//! `$`-style string interpolation.
//!
//! Supports `$NAME`, `${NAME}` and `$$` (a literal `$`). Names start with a
//! letter or underscore and continue with letters, digits or underscores.

use crate::error::MetadataError;
use indexmap::IndexMap;

/// Substitutes placeholders in `template` with `values`.
///
/// With `ignore_missing` set, unknown names and stray `$` signs are left in
/// place; otherwise they are errors.
pub(crate) fn substitute(
    template: &str,
    values: &IndexMap<String, String>,
    ignore_missing: bool,
) -> Result<String, MetadataError> {
    let bytes = template.as_bytes();
    let mut output = String::with_capacity(template.len());
    let mut cursor = 0;

    while let Some(found) = template[cursor..].find('$') {
        let dollar = cursor + found;
        output.push_str(&template[cursor..dollar]);
        let rest = dollar + 1;

        let placeholder = match bytes.get(rest) {
            Some(b'$') => {
                output.push('$');
                cursor = rest + 1;
                continue;
            }
            Some(b'{') => identifier_end(bytes, rest + 1)
                .filter(|&end| bytes.get(end) == Some(&b'}'))
                .map(|end| (&template[rest + 1..end], end + 1)),
            Some(_) => identifier_end(bytes, rest).map(|end| (&template[rest..end], end)),
            None => None,
        };

        match placeholder {
            Some((name, end)) => {
                match values.get(name) {
                    Some(value) => output.push_str(value),
                    None if ignore_missing => output.push_str(&template[dollar..end]),
                    None => return Err(MetadataError::UnknownTemplateVariable(name.to_owned())),
                }
                cursor = end;
            }
            None if ignore_missing => {
                output.push('$');
                cursor = rest;
            }
            None => return Err(MetadataError::InvalidTemplate { offset: dollar }),
        }
    }

    output.push_str(&template[cursor..]);
    Ok(output)
}

/// Returns the end of the identifier starting at `start`, if there is one.
fn identifier_end(bytes: &[u8], start: usize) -> Option<usize> {
    let first = *bytes.get(start)?;
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return None;
    }
    let length = bytes[start..]
        .iter()
        .take_while(|byte| byte.is_ascii_alphanumeric() || **byte == b'_')
        .count();
    Some(start + length)
}
