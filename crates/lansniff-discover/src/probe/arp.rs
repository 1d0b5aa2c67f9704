//! Active ARP probing over a raw datalink channel.
//!
//! Sends one broadcast ARP request per host address in the range, then
//! listens for replies until the wait window closes. Needs raw socket
//! privileges; without them opening the channel fails and the prober reports
//! [`DiscoverError::CapabilityUnavailable`] so the caller can fall back.

use std::collections::HashSet;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ipnet::Ipv4Net;
use lansniff_core::{AddressRange, DiscoveredDevice, MacAddress};
use pnet::datalink::{self, Channel, NetworkInterface};
use pnet::packet::arp::{ArpHardwareTypes, ArpOperations, ArpPacket, MutableArpPacket};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket, MutableEthernetPacket};
use pnet::packet::Packet;
use pnet::util::MacAddr;

use super::{AddressSource, Discovery};
use crate::error::{DiscoverError, Result};

/// Largest range the prober will sweep (a /16).
pub const MAX_PROBE_ADDRESSES: u64 = 65_536;

const ARP_FRAME_LEN: usize = 42;
const BROADCAST_MAC: MacAddr = MacAddr(0xff, 0xff, 0xff, 0xff, 0xff, 0xff);
const READ_POLL: Duration = Duration::from_millis(100);

/// Active ARP prober.
pub struct ArpProber {
    interface: Option<String>,
    wait: Duration,
}

impl ArpProber {
    pub fn new(interface: Option<String>, wait: Duration) -> Self {
        Self { interface, wait }
    }
}

#[async_trait]
impl AddressSource for ArpProber {
    fn name(&self) -> &'static str {
        "arp"
    }

    async fn discover(&self, range: &AddressRange) -> Result<Discovery> {
        if range.address_count() > MAX_PROBE_ADDRESSES {
            return Err(DiscoverError::CapabilityUnavailable(format!(
                "range {range} is larger than {MAX_PROBE_ADDRESSES} addresses"
            )));
        }

        let interface = self.interface.clone();
        let wait = self.wait;
        let range = *range;

        let devices =
            tokio::task::spawn_blocking(move || probe_blocking(interface.as_deref(), &range, wait))
                .await
                .map_err(|e| {
                    DiscoverError::CapabilityUnavailable(format!("ARP probe task failed: {e}"))
                })??;

        Ok(Discovery::new(self.name(), devices))
    }
}

fn probe_blocking(
    wanted: Option<&str>,
    range: &AddressRange,
    wait: Duration,
) -> Result<Vec<DiscoveredDevice>> {
    let interfaces = datalink::interfaces();
    let candidates: Vec<Candidate> = interfaces.iter().map(Candidate::from_pnet).collect();
    let chosen = pick_candidate(&candidates, wanted, range).ok_or_else(|| {
        DiscoverError::CapabilityUnavailable(match wanted {
            Some(name) => format!("interface {name} is missing, down, or has no IPv4/MAC"),
            None => "no usable interface for ARP probing".to_string(),
        })
    })?;
    let (source_ip, source_mac) = chosen.source_for(range).ok_or_else(|| {
        DiscoverError::CapabilityUnavailable(format!("interface {} has no IPv4", chosen.name))
    })?;
    let interface = interfaces
        .iter()
        .find(|i| i.name == chosen.name)
        .ok_or_else(|| DiscoverError::CapabilityUnavailable(chosen.name.clone()))?;

    let channel_config = datalink::Config {
        read_timeout: Some(READ_POLL),
        ..Default::default()
    };
    let (mut tx, mut rx) = match datalink::channel(interface, channel_config) {
        Ok(Channel::Ethernet(tx, rx)) => (tx, rx),
        Ok(_) => {
            return Err(DiscoverError::CapabilityUnavailable(
                "unsupported datalink channel type".to_string(),
            ))
        }
        Err(e) => {
            return Err(DiscoverError::CapabilityUnavailable(format!(
                "cannot open datalink channel on {}: {e}",
                interface.name
            )))
        }
    };

    tracing::debug!(
        interface = %interface.name,
        source_ip = %source_ip,
        range = %range,
        "Sending ARP requests"
    );

    let pnet_mac = to_pnet(source_mac);
    let mut attempted = 0usize;
    let mut sent = 0usize;
    for target in range.hosts().filter(|ip| *ip != source_ip) {
        attempted += 1;
        let frame = build_request(pnet_mac, source_ip, target);
        match tx.send_to(&frame, None) {
            Some(Ok(())) => sent += 1,
            Some(Err(e)) => tracing::trace!(target = %target, error = %e, "ARP send failed"),
            None => tracing::trace!(target = %target, "ARP send returned no result"),
        }
    }
    if attempted > 0 && sent == 0 {
        return Err(DiscoverError::CapabilityUnavailable(format!(
            "could not send any ARP request on {}",
            interface.name
        )));
    }

    let deadline = Instant::now() + wait;
    let mut seen = HashSet::new();
    let mut devices = Vec::new();
    while Instant::now() < deadline {
        match rx.next() {
            Ok(frame) => {
                if let Some(device) = parse_reply(frame) {
                    if range.contains(device.address) && seen.insert(device.address) {
                        tracing::debug!(
                            ip = %device.address,
                            mac = %device.hardware_address,
                            "ARP reply"
                        );
                        devices.push(device);
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
            Err(e) => {
                tracing::trace!(error = %e, "ARP receive error");
                std::thread::sleep(Duration::from_millis(5));
            }
        }
    }

    tracing::debug!(sent, replies = devices.len(), "ARP probe window closed");
    Ok(devices)
}

/// The parts of an interface that matter for choosing where to probe from.
#[derive(Debug, Clone)]
struct Candidate {
    name: String,
    usable: bool,
    mac: Option<MacAddress>,
    networks: Vec<Ipv4Net>,
}

impl Candidate {
    fn from_pnet(interface: &NetworkInterface) -> Self {
        let networks = interface
            .ips
            .iter()
            .filter_map(|net| match net.ip() {
                IpAddr::V4(ip) => Ipv4Net::new(ip, net.prefix()).ok(),
                IpAddr::V6(_) => None,
            })
            .collect();

        Self {
            name: interface.name.clone(),
            usable: interface.is_up() && !interface.is_loopback(),
            mac: interface
                .mac
                .map(|m| MacAddress([m.0, m.1, m.2, m.3, m.4, m.5]))
                .filter(|m| !m.is_unspecified()),
            networks,
        }
    }

    fn covers(&self, range: &AddressRange) -> bool {
        let target = range.network().network();
        self.networks.iter().any(|net| net.contains(&target))
    }

    /// Source address to probe `range` from: the interface address on the
    /// same subnet if there is one, else its first IPv4 address.
    fn source_for(&self, range: &AddressRange) -> Option<(Ipv4Addr, MacAddress)> {
        let mac = self.mac?;
        let target = range.network().network();
        let net = self
            .networks
            .iter()
            .find(|net| net.contains(&target))
            .or_else(|| self.networks.first())?;
        Some((net.addr(), mac))
    }
}

fn pick_candidate<'a>(
    candidates: &'a [Candidate],
    wanted: Option<&str>,
    range: &AddressRange,
) -> Option<&'a Candidate> {
    let eligible = |c: &&Candidate| c.usable && c.mac.is_some() && !c.networks.is_empty();

    match wanted {
        Some(name) => candidates.iter().filter(eligible).find(|c| c.name == name),
        None => candidates
            .iter()
            .filter(eligible)
            .find(|c| c.covers(range))
            .or_else(|| candidates.iter().find(eligible)),
    }
}

fn to_pnet(mac: MacAddress) -> MacAddr {
    let [a, b, c, d, e, f] = mac.octets();
    MacAddr::new(a, b, c, d, e, f)
}

/// Build a broadcast Ethernet frame carrying an ARP who-has for `target`.
fn build_request(
    source_mac: MacAddr,
    source_ip: Ipv4Addr,
    target: Ipv4Addr,
) -> [u8; ARP_FRAME_LEN] {
    let mut buffer = [0u8; ARP_FRAME_LEN];

    if let Some(mut ethernet) = MutableEthernetPacket::new(&mut buffer[..14]) {
        ethernet.set_destination(BROADCAST_MAC);
        ethernet.set_source(source_mac);
        ethernet.set_ethertype(EtherTypes::Arp);
    }

    if let Some(mut arp) = MutableArpPacket::new(&mut buffer[14..]) {
        arp.set_hardware_type(ArpHardwareTypes::Ethernet);
        arp.set_protocol_type(EtherTypes::Ipv4);
        arp.set_hw_addr_len(6);
        arp.set_proto_addr_len(4);
        arp.set_operation(ArpOperations::Request);
        arp.set_sender_hw_addr(source_mac);
        arp.set_sender_proto_addr(source_ip);
        arp.set_target_hw_addr(MacAddr::zero());
        arp.set_target_proto_addr(target);
    }

    buffer
}

/// Extract the sender of an ARP reply frame, ignoring everything else.
fn parse_reply(frame: &[u8]) -> Option<DiscoveredDevice> {
    let ethernet = EthernetPacket::new(frame)?;
    if ethernet.get_ethertype() != EtherTypes::Arp {
        return None;
    }

    let arp = ArpPacket::new(ethernet.payload())?;
    if arp.get_operation() != ArpOperations::Reply {
        return None;
    }

    let m = arp.get_sender_hw_addr();
    let mac = MacAddress([m.0, m.1, m.2, m.3, m.4, m.5]);
    if mac.is_unspecified() || mac.is_broadcast() {
        return None;
    }

    Some(DiscoveredDevice::new(arp.get_sender_proto_addr(), mac))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply_frame(sender_ip: Ipv4Addr, sender_mac: MacAddr) -> [u8; ARP_FRAME_LEN] {
        let mut frame = build_request(sender_mac, sender_ip, Ipv4Addr::new(10, 0, 0, 1));
        {
            let mut arp = MutableArpPacket::new(&mut frame[14..]).unwrap();
            arp.set_operation(ArpOperations::Reply);
        }
        frame
    }

    fn candidate(name: &str, usable: bool, nets: &[&str]) -> Candidate {
        Candidate {
            name: name.to_string(),
            usable,
            mac: Some("02:00:00:00:00:01".parse().unwrap()),
            networks: nets.iter().map(|n| n.parse().unwrap()).collect(),
        }
    }

    #[test]
    fn request_frame_layout() {
        let mac = MacAddr::new(0x02, 0, 0, 0, 0, 0x01);
        let frame = build_request(mac, Ipv4Addr::new(10, 0, 0, 5), Ipv4Addr::new(10, 0, 0, 9));

        let ethernet = EthernetPacket::new(&frame).unwrap();
        assert_eq!(ethernet.get_destination(), BROADCAST_MAC);
        assert_eq!(ethernet.get_ethertype(), EtherTypes::Arp);

        let arp = ArpPacket::new(ethernet.payload()).unwrap();
        assert_eq!(arp.get_operation(), ArpOperations::Request);
        assert_eq!(arp.get_sender_proto_addr(), Ipv4Addr::new(10, 0, 0, 5));
        assert_eq!(arp.get_target_proto_addr(), Ipv4Addr::new(10, 0, 0, 9));
    }

    #[test]
    fn parses_reply_sender() {
        let frame = reply_frame(
            Ipv4Addr::new(10, 0, 0, 42),
            MacAddr::new(0x00, 0x0c, 0x29, 0xaa, 0xbb, 0xcc),
        );
        let device = parse_reply(&frame).unwrap();

        assert_eq!(device.address, Ipv4Addr::new(10, 0, 0, 42));
        assert_eq!(device.hardware_address.to_string(), "00:0c:29:aa:bb:cc");
    }

    #[test]
    fn ignores_requests_and_short_frames() {
        let request = build_request(
            MacAddr::new(0x00, 0x0c, 0x29, 0xaa, 0xbb, 0xcc),
            Ipv4Addr::new(10, 0, 0, 42),
            Ipv4Addr::new(10, 0, 0, 1),
        );
        assert!(parse_reply(&request).is_none());
        assert!(parse_reply(&request[..10]).is_none());
    }

    #[test]
    fn picks_interface_on_target_subnet() {
        let candidates = vec![
            candidate("lo", false, &["127.0.0.1/8"]),
            candidate("eth0", true, &["10.1.0.4/16"]),
            candidate("wlan0", true, &["192.168.31.20/24"]),
        ];
        let range = AddressRange::parse("192.168.31.0/24").unwrap();

        let chosen = pick_candidate(&candidates, None, &range).unwrap();
        assert_eq!(chosen.name, "wlan0");
        assert_eq!(
            chosen.source_for(&range).unwrap().0,
            Ipv4Addr::new(192, 168, 31, 20)
        );
    }

    #[test]
    fn falls_back_to_first_usable_interface() {
        let candidates = vec![
            candidate("lo", false, &["127.0.0.1/8"]),
            candidate("eth0", true, &["10.1.0.4/16"]),
        ];
        let range = AddressRange::parse("192.168.31.0/24").unwrap();

        let chosen = pick_candidate(&candidates, None, &range).unwrap();
        assert_eq!(chosen.name, "eth0");
    }

    #[test]
    fn honours_requested_interface() {
        let candidates = vec![
            candidate("eth0", true, &["192.168.31.5/24"]),
            candidate("eth1", true, &["10.9.0.2/24"]),
            candidate("eth2", false, &["10.9.1.2/24"]),
        ];
        let range = AddressRange::parse("192.168.31.0/24").unwrap();

        assert_eq!(
            pick_candidate(&candidates, Some("eth1"), &range).unwrap().name,
            "eth1"
        );
        assert!(pick_candidate(&candidates, Some("eth2"), &range).is_none());
        assert!(pick_candidate(&candidates, Some("eth9"), &range).is_none());
    }

    #[tokio::test]
    async fn oversized_range_is_unavailable() {
        let prober = ArpProber::new(None, Duration::from_millis(10));
        let range = AddressRange::parse("10.0.0.0/8").unwrap();

        let err = prober.discover(&range).await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
