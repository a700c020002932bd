//! Messaging addresses (JIDs).
//!
//! A JID has the shape `user[:device]@server`. The server part decides what
//! kind of conversation the address names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Server used by direct (one-to-one) user addresses.
pub const USER_SERVER: &str = "s.whatsapp.net";
/// Server used by group addresses.
pub const GROUP_SERVER: &str = "g.us";
/// Server used by newsletter (channel) addresses.
pub const NEWSLETTER_SERVER: &str = "newsletter";

/// What kind of conversation a JID addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JidKind {
    Direct,
    Group,
    Newsletter,
}

/// A parsed messaging address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Jid {
    pub user: String,
    /// Device number for multi-device addresses (0 = primary).
    #[serde(default)]
    pub device: u16,
    pub server: String,
}

impl Jid {
    pub fn new(user: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            device: 0,
            server: server.into(),
        }
    }

    pub fn kind(&self) -> JidKind {
        match self.server.as_str() {
            GROUP_SERVER => JidKind::Group,
            NEWSLETTER_SERVER => JidKind::Newsletter,
            _ => JidKind::Direct,
        }
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.user.is_empty() {
            return write!(f, "{}", self.server);
        }
        if self.device > 0 {
            write!(f, "{}:{}@{}", self.user, self.device, self.server)
        } else {
            write!(f, "{}@{}", self.user, self.server)
        }
    }
}

impl FromStr for Jid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((local, server)) = s.rsplit_once('@') else {
            // A bare server (e.g. "status") is a valid address with no user.
            if s.is_empty() {
                return Err("empty JID".to_string());
            }
            return Ok(Jid::new("", s));
        };
        if server.is_empty() {
            return Err(format!("invalid JID '{s}': missing server"));
        }

        let (user, device) = match local.split_once(':') {
            Some((user, device)) => {
                let device = device
                    .parse::<u16>()
                    .map_err(|e| format!("invalid JID '{s}': bad device: {e}"))?;
                (user, device)
            }
            None => (local, 0),
        };

        Ok(Jid {
            user: user.to_string(),
            device,
            server: server.to_string(),
        })
    }
}
