use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// The endpoints a status entry advertises.
///
/// IPv4 is always present; a relay may add one IPv6 OR endpoint through
/// an `a` line. Renders as `ipv4|or|dir`, followed by `,ipv6|or` when the
/// IPv6 endpoint is known:
///
/// ```text
/// 193.11.166.194|9000|80,2002:470:6e:80d::2|22
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RelayAddress {
    pub ipv4: Ipv4Addr,
    pub or_port: u16,
    pub dir_port: u16,
    pub ipv6: Option<(Ipv6Addr, u16)>,
}

impl RelayAddress {
    #[must_use]
    pub fn new(ipv4: Ipv4Addr, or_port: u16, dir_port: u16) -> Self {
        Self {
            ipv4,
            or_port,
            dir_port,
            ipv6: None,
        }
    }

    /// Every IP address, IPv4 first.
    pub fn ips(&self) -> impl Iterator<Item = IpAddr> + '_ {
        std::iter::once(IpAddr::V4(self.ipv4)).chain(self.ipv6.map(|(ip, _)| IpAddr::V6(ip)))
    }
}

impl fmt::Display for RelayAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.ipv4, self.or_port, self.dir_port)?;
        if let Some((ip, port)) = self.ipv6 {
            write!(f, ",{ip}|{port}")?;
        }
        Ok(())
    }
}
