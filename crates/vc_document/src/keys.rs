/// Marks a node as a reference to an object defined elsewhere in the tree.
pub const REFERENCE_KEY: &str = "$ref";

/// Stamped on the definition of an object that is referenced at least once.
pub const DEFINITION_KEY: &str = "$id";

/// Names the runtime type when it differs from the declared storage type.
pub const TYPE_KEY: &str = "$type";

/// Version string of a versioned model.
pub const VERSION_KEY: &str = "$version";

/// Holds the original payload of a non-object value that had to carry metadata.
pub const CONTENT_KEY: &str = "$content";

/// All keys reserved by the graph pipelines.
///
/// User data must never use these keys as object members. Collisions are not
/// detected.
pub const RESERVED_KEYS: [&str; 5] = [
    REFERENCE_KEY,
    DEFINITION_KEY,
    TYPE_KEY,
    VERSION_KEY,
    CONTENT_KEY,
];

/// Returns `true` if `key` is one of the [`RESERVED_KEYS`].
///
/// # Examples
///
/// ```
/// use vc_document::is_reserved_key;
///
/// assert!(is_reserved_key("$type"));
/// assert!(!is_reserved_key("type"));
/// ```
#[inline]
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}
