//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod guest_directory;
mod guest_portal;
mod identity_backend;

#[cfg(test)]
pub use guest_directory::MockGuestDirectory;
pub use guest_directory::{GuestDirectory, GuestDirectoryError};
#[cfg(test)]
pub use guest_portal::MockGuestPortal;
pub use guest_portal::{GuestPortal, Resumed, Transition};
#[cfg(test)]
pub use identity_backend::MockIdentityBackend;
pub use identity_backend::{IdentityBackend, IdentityBackendError, SignUpOutcome};
