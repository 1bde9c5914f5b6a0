//! Static catalog of the KMS concept schemes.

/// Reserved pseudo-scheme whose concepts are the entry points of every other scheme.
pub const ROOT_SCHEME: &str = "root";

/// Registered scheme names, sorted.
pub const SCHEMES: &[&str] = &[
    "chronounits",
    "discipline",
    "horizontalresolutionrange",
    "idnnode",
    "instruments",
    "isotopiccategory",
    "locations",
    "platforms",
    "projects",
    "providers",
    "rucontenttype",
    "sciencekeywords",
    "temporalresolutionrange",
    "verticalresolutionrange",
];

/// List the registered schemes, with `root` first when `include_root` is set.
pub fn list_schemes(include_root: bool) -> Vec<&'static str> {
    let mut schemes = Vec::with_capacity(SCHEMES.len() + 1);
    if include_root {
        schemes.push(ROOT_SCHEME);
    }
    schemes.extend_from_slice(SCHEMES);
    schemes
}

/// True for `root` and every registered scheme.
pub fn is_known_scheme(name: &str) -> bool {
    name == ROOT_SCHEME || SCHEMES.contains(&name)
}
