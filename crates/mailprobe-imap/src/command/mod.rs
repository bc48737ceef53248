//! IMAP command builder.
//!
//! Only the commands valid before and immediately after authentication are
//! modelled; that is all a connection probe ever sends.

mod serialize;
mod tag_generator;

pub use serialize::is_quotable;
pub use tag_generator::TagGenerator;

use serialize::write_astring;

/// IMAP command.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    // Any State Commands
    /// CAPABILITY command.
    Capability,
    /// LOGOUT command.
    Logout,

    // Not Authenticated State Commands
    /// STARTTLS command.
    StartTls,
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Capability => f.write_str("Capability"),
            Self::Logout => f.write_str("Logout"),
            Self::StartTls => f.write_str("StartTls"),
            Self::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

impl Command {
    /// Returns the command keyword.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Capability => "CAPABILITY",
            Self::Logout => "LOGOUT",
            Self::StartTls => "STARTTLS",
            Self::Login { .. } => "LOGIN",
        }
    }

    /// Serializes the command with the given tag, including the trailing CRLF.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');
        buf.extend_from_slice(self.name().as_bytes());

        if let Self::Login { username, password } = self {
            buf.push(b' ');
            write_astring(&mut buf, username);
            buf.push(b' ');
            write_astring(&mut buf, password);
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}
