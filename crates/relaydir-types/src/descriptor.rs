use std::collections::BTreeSet;
use std::fmt;
use std::iter::Peekable;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chrono::NaiveDateTime;

use crate::error::FieldError;
use crate::fields::{self, CANONICAL_TIME_FORMAT, Line};
use crate::fingerprint::Fingerprint;

/// A server descriptor: what a relay publishes about itself.
///
/// Field sources, by keyword:
///
/// ```text
/// ┌────────────────────┬──────────────────────────────────────────────┐
/// │ Keyword            │ Fields                                       │
/// ├────────────────────┼──────────────────────────────────────────────┤
/// │ router             │ nickname address or_port socks_port dir_port │
/// │ or-address         │ or_addresses (repeatable)                    │
/// │ platform           │ platform software tor_version os             │
/// │ published          │ published                                    │
/// │ uptime             │ uptime                                       │
/// │ fingerprint        │ fingerprint (hex groups joined)              │
/// │ bandwidth          │ bandwidth_avg bandwidth_burst bandwidth_obs  │
/// │ hibernating        │ hibernating                                  │
/// │ hidden-service-dir │ hidden_service_dir                           │
/// │ family             │ family                                       │
/// │ contact            │ contact                                      │
/// │ onion-key          │ onion_key (PEM object on following lines)    │
/// │ signing-key        │ signing_key (PEM object)                     │
/// │ ntor-onion-key     │ ntor_onion_key                               │
/// │ accept / reject    │ exit_policy (in line order)                  │
/// │ router-signature   │ signature (PEM object)                       │
/// └────────────────────┴──────────────────────────────────────────────┘
/// ```
///
/// Key material is kept as the raw PEM text and never parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayDescriptor {
    pub nickname: String,
    pub address: Ipv4Addr,
    pub or_port: u16,
    pub socks_port: u16,
    pub dir_port: u16,
    pub or_addresses: Vec<SocketAddr>,

    /// The whole `platform` line after the keyword.
    pub platform: String,
    pub software: String,
    pub tor_version: String,
    pub operating_system: String,

    pub published: NaiveDateTime,
    pub uptime: u64,
    pub fingerprint: Fingerprint,

    /// Bytes per second.
    pub bandwidth_avg: u64,
    pub bandwidth_burst: u64,
    pub bandwidth_observed: u64,

    pub hibernating: bool,
    pub hidden_service_dir: bool,
    pub family: BTreeSet<Fingerprint>,
    pub contact: String,

    pub onion_key: String,
    pub signing_key: String,
    pub ntor_onion_key: String,
    pub signature: String,

    pub exit_policy: Vec<ExitRule>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PolicyAction {
    Accept,
    Reject,
}

impl PolicyAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
        }
    }
}

/// One `accept`/`reject` line. The pattern is split at its last colon,
/// so `[::1]:80` and `10.0.0.0/8:*` both split correctly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExitRule {
    pub action: PolicyAction,
    pub address_spec: String,
    pub port_spec: String,
}

impl ExitRule {
    fn parse(action: PolicyAction, line: &Line<'_>) -> Result<Self, FieldError> {
        let pattern = line.arg(0, "exit pattern")?;
        let (address, port) = pattern.rsplit_once(':').ok_or_else(|| FieldError::MissingToken {
            keyword: line.keyword.to_string(),
            field: "exit pattern port",
        })?;
        Ok(Self {
            action,
            address_spec: address.to_string(),
            port_spec: port.to_string(),
        })
    }
}

impl fmt::Display for ExitRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.action.as_str(), self.address_spec, self.port_spec)
    }
}

/// Fields of the `router` line.
struct RouterLine {
    nickname: String,
    address: Ipv4Addr,
    or_port: u16,
    socks_port: u16,
    dir_port: u16,
}

impl RouterLine {
    fn parse(line: &Line<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            nickname: line.arg(0, "nickname")?.to_string(),
            address: fields::parse_ipv4("router", line.arg(1, "address")?)?,
            or_port: fields::parse_port("router", line.arg(2, "or port")?)?,
            socks_port: fields::parse_port("router", line.arg(3, "socks port")?)?,
            dir_port: fields::parse_port("router", line.arg(4, "dir port")?)?,
        })
    }
}

/// Split `Tor 0.2.6.1-alpha on Linux` into software, version and OS.
fn split_platform(platform: &str) -> (String, String, String) {
    let (program, os) = platform.split_once(" on ").unwrap_or((platform, ""));
    let mut words = program.split_whitespace();
    let software = words.next().unwrap_or_default().to_string();
    let version = words.collect::<Vec<_>>().join(" ");
    (software, version, os.trim().to_string())
}

/// Collect the PEM object that follows a keyword line, if any.
fn take_object<'a, I>(lines: &mut Peekable<I>) -> String
where
    I: Iterator<Item = &'a str>,
{
    if !lines.peek().is_some_and(|l| l.starts_with("-----BEGIN")) {
        return String::new();
    }

    let mut object = String::new();
    for line in lines.by_ref() {
        object.push_str(line.trim_end_matches('\r'));
        object.push('\n');
        if line.starts_with("-----END") {
            break;
        }
    }
    object
}

fn parse_or_address(value: &str) -> Result<SocketAddr, FieldError> {
    if value.starts_with('[') {
        let (ip, port) = fields::parse_bracketed("or-address", value)?;
        return Ok(SocketAddr::new(IpAddr::V6(ip), port));
    }
    let invalid = || FieldError::InvalidAddress {
        keyword: "or-address",
        value: value.to_string(),
    };
    let (ip, port) = value.rsplit_once(':').ok_or_else(invalid)?;
    let ip = fields::parse_ipv4("or-address", ip)?;
    Ok(SocketAddr::new(IpAddr::V4(ip), fields::parse_port("or-address", port)?))
}

impl RelayDescriptor {
    /// Decode one server descriptor chunk.
    ///
    /// Uptime, bandwidth and hibernation degrade to zero or `false` when
    /// they do not parse.
    ///
    /// # Errors
    ///
    /// - [`FieldError::MissingLine`] for a missing `router`, `published`
    ///   or `fingerprint` line.
    /// - Address, port and timestamp errors from the lines that carry them.
    pub fn decode(text: &str) -> Result<Self, FieldError> {
        let mut router: Option<RouterLine> = None;
        let mut published: Option<NaiveDateTime> = None;
        let mut fingerprint: Option<Fingerprint> = None;

        let mut desc = Self {
            nickname: String::new(),
            address: Ipv4Addr::UNSPECIFIED,
            or_port: 0,
            socks_port: 0,
            dir_port: 0,
            or_addresses: Vec::new(),
            platform: String::new(),
            software: String::new(),
            tor_version: String::new(),
            operating_system: String::new(),
            published: NaiveDateTime::default(),
            uptime: 0,
            fingerprint: Fingerprint::default(),
            bandwidth_avg: 0,
            bandwidth_burst: 0,
            bandwidth_observed: 0,
            hibernating: false,
            hidden_service_dir: false,
            family: BTreeSet::new(),
            contact: String::new(),
            onion_key: String::new(),
            signing_key: String::new(),
            ntor_onion_key: String::new(),
            signature: String::new(),
            exit_policy: Vec::new(),
        };

        let mut raw_lines = text.lines().peekable();
        while let Some(raw) = raw_lines.next() {
            let Some(line) = Line::split(raw) else {
                continue;
            };

            match line.keyword {
                "router" if router.is_none() => router = Some(RouterLine::parse(&line)?),
                "or-address" => desc
                    .or_addresses
                    .push(parse_or_address(line.arg(0, "address")?)?),
                "platform" => {
                    desc.platform = line.rest.trim().to_string();
                    (desc.software, desc.tor_version, desc.operating_system) =
                        split_platform(&desc.platform);
                }
                "published" => {
                    published = Some(fields::parse_timestamp(
                        "published",
                        line.arg(0, "date")?,
                        line.arg(1, "time")?,
                    )?);
                }
                "uptime" => desc.uptime = fields::forgiving_u64(line.args().next()),
                "fingerprint" if fingerprint.is_none() => {
                    fingerprint = Some(Fingerprint::new(line.args().collect::<String>()));
                }
                "hibernating" => desc.hibernating = fields::forgiving_bool(line.args().next()),
                "bandwidth" => {
                    let mut args = line.args();
                    desc.bandwidth_avg = fields::forgiving_u64(args.next());
                    desc.bandwidth_burst = fields::forgiving_u64(args.next());
                    desc.bandwidth_observed = fields::forgiving_u64(args.next());
                }
                "family" => desc
                    .family
                    .extend(line.args().map(|member| Fingerprint::new(member.trim_start_matches('$')))),
                "contact" => desc.contact = line.rest.trim().to_string(),
                "hidden-service-dir" => desc.hidden_service_dir = true,
                "onion-key" => desc.onion_key = take_object(&mut raw_lines),
                "signing-key" => desc.signing_key = take_object(&mut raw_lines),
                "router-signature" => desc.signature = take_object(&mut raw_lines),
                "ntor-onion-key" => desc.ntor_onion_key = line.arg(0, "key")?.to_string(),
                "accept" => desc.exit_policy.push(ExitRule::parse(PolicyAction::Accept, &line)?),
                "reject" => desc.exit_policy.push(ExitRule::parse(PolicyAction::Reject, &line)?),
                _ => {}
            }
        }

        let router = router.ok_or(FieldError::MissingLine { keyword: "router" })?;
        desc.nickname = router.nickname;
        desc.address = router.address;
        desc.or_port = router.or_port;
        desc.socks_port = router.socks_port;
        desc.dir_port = router.dir_port;
        desc.published = published.ok_or(FieldError::MissingLine { keyword: "published" })?;
        desc.fingerprint = fingerprint.ok_or(FieldError::MissingLine { keyword: "fingerprint" })?;

        Ok(desc)
    }

    /// Pull only the identity out of a descriptor chunk, reading lines up
    /// to the `fingerprint` line.
    ///
    /// # Errors
    ///
    /// [`FieldError::MissingLine`] if there is no `fingerprint` line.
    pub fn extract_fingerprint(text: &str) -> Result<Fingerprint, FieldError> {
        fields::lines(text)
            .find(|line| line.keyword == "fingerprint")
            .map(|line| Fingerprint::new(line.args().collect::<String>()))
            .ok_or(FieldError::MissingLine {
                keyword: "fingerprint",
            })
    }

    /// Whether `fingerprint` is in this relay's declared family.
    #[must_use]
    pub fn has_family(&self, fingerprint: impl AsRef<str>) -> bool {
        self.family.contains(&Fingerprint::new(fingerprint))
    }

    /// The exit policy as `action pattern` lines.
    #[must_use]
    pub fn raw_exit_policy(&self) -> String {
        self.exit_policy
            .iter()
            .map(|rule| format!("{rule}\n"))
            .collect()
    }
}

impl fmt::Display for RelayDescriptor {
    /// `FPR,nickname,address,or_port,dir_port,published,uptime,os,version,contact`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{},{},{},{}",
            self.fingerprint,
            self.nickname,
            self.address,
            self.or_port,
            self.dir_port,
            self.published.format(CANONICAL_TIME_FORMAT),
            self.uptime,
            fields::strip_commas(&self.operating_system),
            fields::strip_commas(&self.tor_version),
            fields::strip_commas(&self.contact),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LET_FREEDOM_RING: &str = "router LetFreedomRing 24.233.74.111 9001 0 0
platform Tor 0.2.6.1-alpha on Linux
protocols Link 1 2 Circuit 1
published 2014-12-05 22:01:13
fingerprint DA4D EC93 C8D2 F187 C027 A96D 3925 C153 1D90 A89E
uptime 339587
bandwidth 20480 20480 16996
extra-info-digest 15FA36289DD75D89B389CED0BE23D80FB50629BD
onion-key
-----BEGIN RSA PUBLIC KEY-----
MIGJAoGBALD6Dbj1okBj4mmz/sCgIGFJk/CTWlMsT3CS1kP7Q2gAaDewEbo1+me3
v2l0misfGCloIamfI5dzayTu9gR4emuKm34tipkfIz6hLkO7xW1nAgMBAAE=
-----END RSA PUBLIC KEY-----
signing-key
-----BEGIN RSA PUBLIC KEY-----
MIGJAoGBAM6sVv1ASHBuLe8l3+cF4xATk1n/CqNRqML0Gra0S9UaBnKakm9tk7Vw
tHeXU1pvc/E7SA0IpUjm80z0HhSA3oGwuP4IEB1U1IxxiJNFaBk7AgMBAAE=
-----END RSA PUBLIC KEY-----
hidden-service-dir
contact 0xCDD0190B Craig Andrews <candrews@integralblue.com>
ntor-onion-key q8Qg9PaoBm59j7cEJcOrzTUazVt3D8Ax4L3oaO8PaxU=
family $9A2F4E9E0C1AB7D36D8B2A3C8AB1C5E57DE5B5C1 somenick
reject 0.0.0.0/8:*
reject 24.233.74.111:*
accept *:22
accept *:6660-6697
reject *:*
router-signature
-----BEGIN SIGNATURE-----
vKWlPhEDoRHOKgDNXE07HFl39b4SmGUDo8DStSzzza+CKVw2RnV41wYBpjRJvu2Q
-----END SIGNATURE-----
";

    #[test]
    fn decodes_router_and_platform() {
        let desc = RelayDescriptor::decode(LET_FREEDOM_RING).unwrap();
        assert_eq!(desc.nickname, "LetFreedomRing");
        assert_eq!(desc.address, Ipv4Addr::new(24, 233, 74, 111));
        assert_eq!((desc.or_port, desc.socks_port, desc.dir_port), (9001, 0, 0));
        assert_eq!(desc.platform, "Tor 0.2.6.1-alpha on Linux");
        assert_eq!(desc.software, "Tor");
        assert_eq!(desc.tor_version, "0.2.6.1-alpha");
        assert_eq!(desc.operating_system, "Linux");
        assert_eq!(desc.uptime, 339_587);
        assert_eq!(
            (desc.bandwidth_avg, desc.bandwidth_burst, desc.bandwidth_observed),
            (20480, 20480, 16996)
        );
        assert!(desc.hidden_service_dir);
        assert!(!desc.hibernating);
    }

    #[test]
    fn fingerprint_groups_are_joined() {
        let desc = RelayDescriptor::decode(LET_FREEDOM_RING).unwrap();
        assert_eq!(
            desc.fingerprint.as_str(),
            "DA4DEC93C8D2F187C027A96D3925C1531D90A89E"
        );
        assert_eq!(
            RelayDescriptor::extract_fingerprint(LET_FREEDOM_RING).unwrap(),
            desc.fingerprint
        );
    }

    #[test]
    fn pem_objects_attach_to_their_keyword() {
        let desc = RelayDescriptor::decode(LET_FREEDOM_RING).unwrap();
        assert!(desc.onion_key.starts_with("-----BEGIN RSA PUBLIC KEY-----\nMIGJAoGBALD6"));
        assert!(desc.onion_key.ends_with("-----END RSA PUBLIC KEY-----\n"));
        assert!(desc.signing_key.contains("MIGJAoGBAM6s"));
        assert!(desc.signature.starts_with("-----BEGIN SIGNATURE-----"));
        assert_eq!(desc.ntor_onion_key, "q8Qg9PaoBm59j7cEJcOrzTUazVt3D8Ax4L3oaO8PaxU=");
    }

    #[test]
    fn exit_policy_keeps_line_order() {
        let desc = RelayDescriptor::decode(LET_FREEDOM_RING).unwrap();
        assert_eq!(
            desc.raw_exit_policy(),
            "reject 0.0.0.0/8:*\nreject 24.233.74.111:*\naccept *:22\naccept *:6660-6697\nreject *:*\n"
        );
        assert_eq!(desc.exit_policy[3].port_spec, "6660-6697");
        assert_eq!(desc.exit_policy[3].action, PolicyAction::Accept);
    }

    #[test]
    fn family_is_normalized() {
        let desc = RelayDescriptor::decode(LET_FREEDOM_RING).unwrap();
        assert!(desc.has_family("9a2f4e9e0c1ab7d36d8b2a3c8ab1c5e57de5b5c1"));
        assert!(desc.has_family("SOMENICK"));
        assert!(!desc.has_family("DA4DEC93C8D2F187C027A96D3925C1531D90A89E"));
    }

    #[test]
    fn canonical_string() {
        let desc = RelayDescriptor::decode(LET_FREEDOM_RING).unwrap();
        assert_eq!(
            desc.to_string(),
            "DA4DEC93C8D2F187C027A96D3925C1531D90A89E,LetFreedomRing,24.233.74.111,9001,0,\
2014-12-05T22:01:13Z,339587,Linux,0.2.6.1-alpha,0xCDD0190B Craig Andrews <candrews@integralblue.com>"
        );
    }

    #[test]
    fn opt_prefix_and_or_addresses() {
        let text = "router a 10.0.0.1 9001 0 0\n\
or-address [2001:db8::1]:9002\n\
or-address 10.0.0.2:443\n\
opt fingerprint AAAA BBBB\n\
opt hibernating 1\n\
published 2014-12-08 14:01:26\n";
        let desc = RelayDescriptor::decode(text).unwrap();
        assert_eq!(desc.fingerprint.as_str(), "AAAABBBB");
        assert!(desc.hibernating);
        assert_eq!(desc.or_addresses.len(), 2);
        assert_eq!(desc.or_addresses[0].port(), 9002);
        assert_eq!(desc.or_addresses[1].to_string(), "10.0.0.2:443");
    }

    #[test]
    fn informational_fields_degrade() {
        let text = LET_FREEDOM_RING
            .replace("uptime 339587", "uptime forever")
            .replace("bandwidth 20480 20480 16996", "bandwidth 20480 x");
        let desc = RelayDescriptor::decode(&text).unwrap();
        assert_eq!(desc.uptime, 0);
        assert_eq!(desc.bandwidth_avg, 20480);
        assert_eq!(desc.bandwidth_burst, 0);
        assert_eq!(desc.bandwidth_observed, 0);
    }

    #[test]
    fn required_lines() {
        let no_fingerprint = LET_FREEDOM_RING.replace("fingerprint DA4D", "fingerprunt DA4D");
        assert_eq!(
            RelayDescriptor::decode(&no_fingerprint),
            Err(FieldError::MissingLine {
                keyword: "fingerprint"
            })
        );

        let bad_address = LET_FREEDOM_RING.replace("24.233.74.111 9001", "24.233.74 9001");
        assert!(matches!(
            RelayDescriptor::decode(&bad_address),
            Err(FieldError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn commas_are_stripped_from_free_text() {
        let text = LET_FREEDOM_RING.replace("contact 0xCDD0190B", "contact a, b,");
        let desc = RelayDescriptor::decode(&text).unwrap();
        assert!(desc.to_string().ends_with(",a b Craig Andrews <candrews@integralblue.com>"));
    }
}
