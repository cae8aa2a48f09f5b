//! Icon resolution, consumed by format converters.

/// Maps a service name ("GitHub") to a stock icon key. Provided by the
/// application's icon table; converters only consume it.
pub trait IconResolver {
    /// Look up an icon key by service name. `None` simply means no match
    /// — the credential renders with a default icon.
    fn find_service_key_by_name(&self, name: &str) -> Option<String>;
}

/// Resolver for callers without an icon table.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullIconResolver;

impl IconResolver for NullIconResolver {
    fn find_service_key_by_name(&self, _name: &str) -> Option<String> {
        None
    }
}
