//! Common library for the Sanchar file-sharing service
//!
//! This crate owns the ephemeral share registry: the in-memory mapping from a
//! generated share identifier to an uploaded bundle with a time-to-live, plus
//! the data model and error types the web service builds on.

pub mod clock;
pub mod error;
pub mod registry;
pub mod share;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{RegistryError, RegistryResult};
pub use registry::{RegistryLimits, ShareRegistry};
pub use share::{ExpiryCode, NewShare, ShareBundle, ShareId};

/// Example usage of the registry
///
/// ```rust,no_run
/// use common::{ExpiryCode, NewShare, RegistryLimits, ShareRegistry};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let registry = ShareRegistry::new(RegistryLimits::default());
///     let id = registry
///         .create(NewShare {
///             payloads: vec!["aGVsbG8=".to_string()],
///             filenames: vec!["hello.txt".to_string()],
///             expiry: ExpiryCode::parse_lenient("1h"),
///             has_password: false,
///         })
///         .await?;
///     let bundle = registry.get(&id).await?;
///     println!("{} expires at {}", bundle.id, bundle.expires_at);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
