use codeowners_index::Owner;

/// The subset of `users` that own the path, in the order they were given.
pub fn verified_owners<'a>(owners: &[Owner], users: &'a [String]) -> Vec<&'a str> {
    users
        .iter()
        .map(String::as_str)
        .filter(|&user| owners.iter().any(|owner| owner == user))
        .collect()
}
