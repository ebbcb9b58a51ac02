//! Discovery beacon text codec.
//!
//! A listening sender announces itself with a UTF-8 UDP datagram of the form
//! `FLUXDROP|<session_id>|<tcp_port>|<instance_id>`. The instance id lets a
//! process discard its own beacons; datagrams from older peers omit it and
//! are still accepted.

/// Magic prefix identifying a FluxDrop beacon.
pub const BEACON_MAGIC: &str = "FLUXDROP";

/// Well-known UDP port beacons are broadcast to.
pub const BEACON_PORT: u16 = 45454;

/// A parsed discovery announcement.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Beacon {
    /// Session the announcing sender is serving.
    pub session_id: u32,
    /// TCP port the sender is accepting on.
    pub port: u16,
    /// Announcing process's instance token; absent in the legacy form.
    pub instance_id: Option<String>,
}

impl Beacon {
    /// Renders the datagram text. Fields never contain the `|` separator.
    #[must_use]
    pub fn encode(&self) -> String {
        match &self.instance_id {
            Some(instance) => format!(
                "{BEACON_MAGIC}|{}|{}|{instance}",
                self.session_id, self.port
            ),
            None => format!("{BEACON_MAGIC}|{}|{}", self.session_id, self.port),
        }
    }

    /// Parses a received datagram, or `None` when it is not a beacon.
    ///
    /// Accepts both the current four-field form and the legacy three-field
    /// form; fields past the fourth are ignored.
    #[must_use]
    pub fn parse(datagram: &str) -> Option<Self> {
        let mut fields = datagram.trim_end().split('|');
        if fields.next()? != BEACON_MAGIC {
            return None;
        }
        let session_id = fields.next()?.parse().ok()?;
        let port = fields.next()?.parse().ok()?;
        let instance_id = fields.next().map(str::to_owned);
        Some(Self {
            session_id,
            port,
            instance_id,
        })
    }
}
