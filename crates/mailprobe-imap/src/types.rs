//! Server capabilities, response codes and response status.

/// Response status from a status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Server greeting (pre-authenticated).
    PreAuth,
    /// Server is closing connection.
    Bye,
}

impl Status {
    /// Parses a status keyword (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "OK" => Some(Self::Ok),
            "NO" => Some(Self::No),
            "BAD" => Some(Self::Bad),
            "PREAUTH" => Some(Self::PreAuth),
            "BYE" => Some(Self::Bye),
            _ => None,
        }
    }
}

/// Server capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501)
    Imap4Rev1,
    /// `IMAP4rev2` (RFC 9051)
    Imap4Rev2,
    /// STARTTLS support
    StartTls,
    /// LOGIN disabled
    LoginDisabled,
    /// AUTH mechanism
    Auth(String),
    /// IDLE command support (RFC 2177)
    Idle,
    /// ID extension (RFC 2971)
    Id,
    /// Unknown capability
    Unknown(String),
}

impl Capability {
    /// Parses a capability string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IMAP4REV2" => Self::Imap4Rev2,
            "STARTTLS" => Self::StartTls,
            "LOGINDISABLED" => Self::LoginDisabled,
            "IDLE" => Self::Idle,
            "ID" => Self::Id,
            _ => upper.strip_prefix("AUTH=").map_or_else(
                || Self::Unknown(s.to_string()),
                |mechanism| Self::Auth(mechanism.to_string()),
            ),
        }
    }

    /// Parses a whitespace-separated capability list.
    #[must_use]
    pub fn parse_list(s: &str) -> Vec<Self> {
        s.split_ascii_whitespace().map(Self::parse).collect()
    }
}

/// Response code carried in `[...]` after a status keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// `[CAPABILITY ...]`
    Capability(Vec<Capability>),
    /// `[ALERT]`
    Alert,
    /// `[AUTHENTICATIONFAILED]` (RFC 5530)
    AuthenticationFailed,
    /// `[PRIVACYREQUIRED]` (RFC 5530)
    PrivacyRequired,
    /// Any other code, kept verbatim.
    Other(String),
}

impl ResponseCode {
    /// Parses the content between the brackets.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let (name, rest) = s.split_once(' ').unwrap_or((s, ""));
        match name.to_ascii_uppercase().as_str() {
            "CAPABILITY" => Self::Capability(Capability::parse_list(rest)),
            "ALERT" => Self::Alert,
            "AUTHENTICATIONFAILED" => Self::AuthenticationFailed,
            "PRIVACYREQUIRED" => Self::PrivacyRequired,
            _ => Self::Other(s.to_string()),
        }
    }
}
