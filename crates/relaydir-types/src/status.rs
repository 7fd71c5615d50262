use std::fmt;

use chrono::NaiveDateTime;

use crate::address::RelayAddress;
use crate::error::FieldError;
use crate::fields::{self, CANONICAL_TIME_FORMAT, Line};
use crate::fingerprint::Fingerprint;
use crate::flags::RelayFlags;

/// One router status entry from a consensus or bridge network status.
///
/// Line layout of a chunk:
///
/// ```text
/// ┌─────────┬───────────────────────────────────────────────────────────┐
/// │ Keyword │ Arguments                                                 │
/// ├─────────┼───────────────────────────────────────────────────────────┤
/// │ r       │ nickname identity digest date time ipv4 or_port dir_port  │
/// │ a       │ [ipv6]:port                                   (optional)  │
/// │ s       │ flag tokens                                               │
/// │ v       │ software version                                          │
/// │ w       │ Bandwidth=N [Measured=N] [Unmeasured=1]                   │
/// │ p       │ accept|reject port-list                                   │
/// └─────────┴───────────────────────────────────────────────────────────┘
/// ```
///
/// Identity and digest are base64 on the wire; the identity becomes an
/// uppercase [`Fingerprint`], the digest lowercase hex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayStatusEntry {
    pub nickname: String,
    pub fingerprint: Fingerprint,
    pub digest: String,
    pub published: NaiveDateTime,
    pub address: RelayAddress,
    pub flags: RelayFlags,
    /// Second token of the `v` line, e.g. `Tor`.
    pub software: String,
    /// Third token of the `v` line, e.g. `0.2.5.10`.
    pub tor_version: String,
    pub bandwidth: u64,
    pub measured: Option<u64>,
    pub unmeasured: bool,
    pub policy: PortSummary,
}

/// The `p` line: a single accept or reject over a port list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PortSummary {
    pub accept: bool,
    pub ports: String,
}

impl fmt::Display for PortSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = if self.accept { "accept" } else { "reject" };
        write!(f, "{action} {}", self.ports)
    }
}

/// Fields of the `r` line.
struct RouterLine {
    nickname: String,
    fingerprint: Fingerprint,
    digest: String,
    published: NaiveDateTime,
    address: RelayAddress,
}

impl RouterLine {
    fn parse(line: &Line<'_>) -> Result<Self, FieldError> {
        let fingerprint = Fingerprint::from_base64(line.arg(1, "identity")?)?;
        let digest = hex::encode(fields::decode_base64(line.arg(2, "digest")?)?);
        let published =
            fields::parse_timestamp("r", line.arg(3, "date")?, line.arg(4, "time")?)?;
        let address = RelayAddress::new(
            fields::parse_ipv4("r", line.arg(5, "address")?)?,
            fields::parse_port("r", line.arg(6, "or port")?)?,
            fields::parse_port("r", line.arg(7, "dir port")?)?,
        );

        Ok(Self {
            nickname: line.arg(0, "nickname")?.to_string(),
            fingerprint,
            digest,
            published,
            address,
        })
    }
}

impl RelayStatusEntry {
    /// Decode one status entry chunk.
    ///
    /// Unknown keywords are skipped. Bandwidth values that do not parse
    /// are read as zero.
    ///
    /// # Errors
    ///
    /// - [`FieldError::MissingLine`] if the chunk has no `r` line.
    /// - [`FieldError::InvalidIdentity`] if identity or digest is not base64.
    /// - Address, port and timestamp errors from the `r` and `a` lines.
    pub fn decode(text: &str) -> Result<Self, FieldError> {
        let mut router: Option<RouterLine> = None;
        let mut ipv6 = None;
        let mut flags = RelayFlags::empty();
        let mut software = String::new();
        let mut tor_version = String::new();
        let mut bandwidth = 0;
        let mut measured = None;
        let mut unmeasured = false;
        let mut policy = PortSummary::default();

        for line in fields::lines(text) {
            match line.keyword {
                "r" if router.is_none() => router = Some(RouterLine::parse(&line)?),
                // Only the first IPv6 OR endpoint is kept.
                "a" if ipv6.is_none() => {
                    let value = line.arg(0, "address")?;
                    if value.starts_with('[') {
                        ipv6 = Some(fields::parse_bracketed("a", value)?);
                    }
                }
                "s" => flags = RelayFlags::from_tokens(line.args()),
                "v" => {
                    let mut args = line.args();
                    software = args.next().unwrap_or_default().to_string();
                    tor_version = args.next().unwrap_or_default().to_string();
                }
                "w" => {
                    for token in line.args() {
                        match token.split_once('=') {
                            Some(("Bandwidth", v)) => bandwidth = fields::forgiving_u64(Some(v)),
                            Some(("Measured", v)) => measured = Some(fields::forgiving_u64(Some(v))),
                            Some(("Unmeasured", v)) => unmeasured = v == "1",
                            _ => {}
                        }
                    }
                }
                "p" => {
                    let mut args = line.args();
                    policy.accept = args.next() == Some("accept");
                    policy.ports = args.collect::<Vec<_>>().join(" ");
                }
                _ => {}
            }
        }

        let RouterLine {
            nickname,
            fingerprint,
            digest,
            published,
            mut address,
        } = router.ok_or(FieldError::MissingLine { keyword: "r" })?;
        address.ipv6 = ipv6;

        Ok(Self {
            nickname,
            fingerprint,
            digest,
            published,
            address,
            flags,
            software,
            tor_version,
            bandwidth,
            measured,
            unmeasured,
            policy,
        })
    }

    /// Pull only the identity out of a status entry chunk.
    ///
    /// Stops at the first `r` line and decodes nothing but its identity
    /// token.
    ///
    /// # Errors
    ///
    /// [`FieldError::MissingLine`] without an `r` line, otherwise the
    /// identity decode error.
    pub fn extract_fingerprint(text: &str) -> Result<Fingerprint, FieldError> {
        let line = fields::lines(text)
            .find(|line| line.keyword == "r")
            .ok_or(FieldError::MissingLine { keyword: "r" })?;
        Fingerprint::from_base64(line.arg(1, "identity")?)
    }
}

impl fmt::Display for RelayStatusEntry {
    /// `FPR,nickname,address,flags,published,software version`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = format!("{} {}", self.software, self.tor_version);
        write!(
            f,
            "{},{},{},{},{},{}",
            self.fingerprint,
            self.nickname,
            self.address,
            self.flags,
            self.published.format(CANONICAL_TIME_FORMAT),
            fields::strip_commas(version.trim()),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::flags::RelayFlag;

    const SEELE: &str = "r seele AAoQ1DAR6kkoo19hBAX5K0QztNw bdrzhG0Kk/8DUsnSdmzj7DjFQjY 2014-12-08 12:27:05 73.15.150.172 9001 0\n\
s Fast Running Stable Valid\n\
v Tor 0.2.5.10\n\
w Bandwidth=18\n\
p reject 1-65535\n";

    const KARLSTAD: &str = "r Karlstad1 zO8CqkVMCrD+GsaDBPbYxCIMGRI 5ox3d6zBLKYPaD+k30+7QTRxDXg 2016-08-17 23:52:53 193.11.166.194 9000 80\n\
a [2002:470:6e:80d::2]:22\n\
s Fast Guard HSDir Running Stable V2Dir Valid\n\
v Tor 0.2.9.1-alpha-dev\n\
w Bandwidth=1390 Measured=1200\n\
p reject 1-65535\n";

    #[test]
    fn decodes_seele() {
        let entry = RelayStatusEntry::decode(SEELE).unwrap();
        assert_eq!(entry.nickname, "seele");
        assert_eq!(entry.address.ipv4, Ipv4Addr::new(73, 15, 150, 172));
        assert_eq!(entry.address.or_port, 9001);
        assert_eq!(entry.address.dir_port, 0);
        assert_eq!(entry.address.ipv6, None);
        assert_eq!(
            entry.flags,
            RelayFlags::from_iter([
                RelayFlag::Fast,
                RelayFlag::Running,
                RelayFlag::Stable,
                RelayFlag::Valid
            ])
        );
        assert_eq!(entry.software, "Tor");
        assert_eq!(entry.tor_version, "0.2.5.10");
        assert_eq!(entry.bandwidth, 18);
        assert_eq!(entry.measured, None);
        assert!(!entry.policy.accept);
        assert_eq!(entry.policy.ports, "1-65535");
        assert_eq!(entry.policy.to_string(), "reject 1-65535");
    }

    #[test]
    fn decodes_identity_digest_and_ipv6() {
        let entry = RelayStatusEntry::decode(KARLSTAD).unwrap();
        assert_eq!(
            entry.fingerprint.as_str(),
            "CCEF02AA454C0AB0FE1AC68304F6D8C4220C1912"
        );
        assert_eq!(entry.digest, "e68c7777acc12ca60f683fa4df4fbb4134710d78");
        assert_eq!(
            entry.address.to_string(),
            "193.11.166.194|9000|80,2002:470:6e:80d::2|22"
        );
        assert_eq!(entry.measured, Some(1200));
        assert!(entry.flags.contains(RelayFlag::HSDir));
    }

    #[test]
    fn canonical_string() {
        let entry = RelayStatusEntry::decode(KARLSTAD).unwrap();
        assert_eq!(
            entry.to_string(),
            "CCEF02AA454C0AB0FE1AC68304F6D8C4220C1912,Karlstad1,\
193.11.166.194|9000|80,2002:470:6e:80d::2|22,\
Fast|Guard|HSDir|Stable|Running|Valid|V2Dir,2016-08-17T23:52:53Z,Tor 0.2.9.1-alpha-dev"
        );
    }

    #[test]
    fn extract_matches_full_decode() {
        let cheap = RelayStatusEntry::extract_fingerprint(KARLSTAD).unwrap();
        let full = RelayStatusEntry::decode(KARLSTAD).unwrap();
        assert_eq!(cheap, full.fingerprint);
    }

    #[test]
    fn extract_ignores_a_broken_body() {
        let text = "r n zO8CqkVMCrD+GsaDBPbYxCIMGRI\nw Bandwidth=oops\n";
        assert!(RelayStatusEntry::extract_fingerprint(text).is_ok());
        assert!(RelayStatusEntry::decode(text).is_err());
    }

    #[test]
    fn bad_bandwidth_degrades_to_zero() {
        let text = SEELE.replace("Bandwidth=18", "Bandwidth=lots");
        let entry = RelayStatusEntry::decode(&text).unwrap();
        assert_eq!(entry.bandwidth, 0);
    }

    #[test]
    fn unknown_lines_are_skipped() {
        let text = format!("{SEELE}m 8,9,10 sha256=abc\npr Cons=1-2\n");
        assert!(RelayStatusEntry::decode(&text).is_ok());
    }

    #[test]
    fn fatal_field_errors() {
        let bad_identity = SEELE.replace("AAoQ1DAR6kkoo19hBAX5K0QztNw", "!!!");
        assert!(matches!(
            RelayStatusEntry::decode(&bad_identity),
            Err(FieldError::InvalidIdentity { .. })
        ));

        let bad_ip = SEELE.replace("73.15.150.172", "73.15.150");
        assert!(matches!(
            RelayStatusEntry::decode(&bad_ip),
            Err(FieldError::InvalidAddress { .. })
        ));

        let bad_port = SEELE.replace(" 9001 0", " 90011 0");
        assert!(matches!(
            RelayStatusEntry::decode(&bad_port),
            Err(FieldError::InvalidPort { .. })
        ));

        let bad_time = SEELE.replace("12:27:05", "12:27");
        assert!(matches!(
            RelayStatusEntry::decode(&bad_time),
            Err(FieldError::InvalidTimestamp { .. })
        ));

        assert_eq!(
            RelayStatusEntry::decode("s Fast\n"),
            Err(FieldError::MissingLine { keyword: "r" })
        );
    }

    #[test]
    fn empty_chunk_fails_in_the_decoder() {
        assert!(RelayStatusEntry::decode("r \n").is_err());
    }
}
