//! Registry trait for self-registering implementations.

/// Base trait for implementation registries.
///
/// Each pluggable implementation (for example an HTTP transport) exposes a
/// `Registry` struct implementing this trait, declaring the name it is
/// referenced by in configuration and the factory that builds it.
pub trait ImplementationRegistry {
	/// The key used in configuration, e.g. `"http"` for
	/// `[transport.implementations.http]`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Returns the factory function for this implementation.
	fn factory() -> Self::Factory;
}
