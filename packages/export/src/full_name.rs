//! Display name composition.

/// Composes `"{lastname}, {firstname} {middlename} {extension}"`.
///
/// Parts are trimmed and empty parts are omitted along with their
/// separators. Without a lastname the remainder is returned without a
/// leading comma.
#[must_use]
pub fn build_full_name(lastname: &str, firstname: &str, middlename: &str, extension: &str) -> String {
    let lastname = lastname.trim();
    let given = [firstname, middlename, extension]
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    match (lastname.is_empty(), given.is_empty()) {
        (false, false) => format!("{lastname}, {given}"),
        (false, true) => lastname.to_owned(),
        (true, _) => given,
    }
}
