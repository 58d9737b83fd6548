//! SMTP service extensions advertised in the EHLO reply.

/// One line of the EHLO reply after the greeting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// `STARTTLS` (RFC 3207).
    StartTls,
    /// `AUTH` with the mechanisms this client can use.
    Auth(Vec<AuthMechanism>),
    /// `SIZE`, with the limit when one is given.
    Size(Option<usize>),
    /// `8BITMIME` (RFC 6152).
    EightBitMime,
    /// `PIPELINING`, recorded but unused.
    Pipelining,
    /// `SMTPUTF8`, recorded but unused.
    SmtpUtf8,
    /// Anything else, kept verbatim.
    Unknown(String),
}

impl Extension {
    /// Interprets one EHLO line such as `SIZE 35882577`.
    ///
    /// Keywords are matched case-insensitively.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let (keyword, params) = line
            .trim()
            .split_once(char::is_whitespace)
            .unwrap_or((line.trim(), ""));

        if keyword.eq_ignore_ascii_case("STARTTLS") {
            Self::StartTls
        } else if keyword.eq_ignore_ascii_case("AUTH") {
            Self::Auth(
                params
                    .split_whitespace()
                    .filter_map(AuthMechanism::from_name)
                    .collect(),
            )
        } else if keyword.eq_ignore_ascii_case("SIZE") {
            Self::Size(params.trim().parse().ok())
        } else if keyword.eq_ignore_ascii_case("8BITMIME") {
            Self::EightBitMime
        } else if keyword.eq_ignore_ascii_case("PIPELINING") {
            Self::Pipelining
        } else if keyword.eq_ignore_ascii_case("SMTPUTF8") {
            Self::SmtpUtf8
        } else {
            Self::Unknown(line.to_string())
        }
    }
}

/// SASL mechanisms the client implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMechanism {
    /// RFC 4616, single round trip.
    Plain,
    /// Two base64 challenges for user name and password.
    Login,
}

impl AuthMechanism {
    /// Looks up a mechanism by its advertised name; `None` for unsupported ones.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Plain, Self::Login]
            .into_iter()
            .find(|mechanism| name.eq_ignore_ascii_case(mechanism.as_str()))
    }

    /// Name used in the AUTH command.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Login => "LOGIN",
        }
    }
}
