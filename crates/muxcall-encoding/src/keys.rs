//! Reserved transport header keys.
//!
//! Two header namespaces travel with every request: transport headers read
//! by the frame codec and routing layers, and application headers carried
//! opaquely inside arg2. The keys here are the reserved transport-level
//! set; anything else is application-defined.

/// Arg scheme of arg2/arg3. Set by the builder, never by callers.
pub const ARG_SCHEME_KEY: &str = "as";

/// Name of the calling service.
pub const CALLER_NAME_KEY: &str = "cn";

/// Retry behavior flags consumed by the transport retry loop.
pub const RETRY_FLAGS_KEY: &str = "re";

/// Speculative execution fan-out count.
pub const SPECULATIVE_EXECUTION_KEY: &str = "se";

/// Failure domain of the caller.
pub const FAILURE_DOMAIN_KEY: &str = "fd";

/// Shard key for partitioned services.
pub const SHARD_KEY: &str = "sk";

/// Routing delegate service.
pub const ROUTING_DELEGATE_KEY: &str = "rd";

/// Returns a human-readable name for a reserved transport header key.
pub fn key_name(key: &str) -> &'static str {
    match key {
        ARG_SCHEME_KEY => "ARG_SCHEME",
        CALLER_NAME_KEY => "CALLER_NAME",
        RETRY_FLAGS_KEY => "RETRY_FLAGS",
        SPECULATIVE_EXECUTION_KEY => "SPECULATIVE_EXECUTION",
        FAILURE_DOMAIN_KEY => "FAILURE_DOMAIN",
        SHARD_KEY => "SHARD_KEY",
        ROUTING_DELEGATE_KEY => "ROUTING_DELEGATE",
        _ => "USER",
    }
}

/// Returns true if the key is owned by the builder and must not be written
/// by callers.
pub fn is_protected(key: &str) -> bool {
    key == ARG_SCHEME_KEY
}
