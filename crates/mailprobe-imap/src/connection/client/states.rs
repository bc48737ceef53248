//! Type-state markers for IMAP client connection states.

/// Marker type for the not-authenticated state.
///
/// In this state, only STARTTLS and LOGIN (plus any-state commands) are valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Marker type for the authenticated state.
///
/// A probe never goes further than this; the only thing left to do is LOGOUT.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;
