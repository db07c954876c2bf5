//! Integration tests for opening device channels from specs.
//!
//! These go through `open_channel` / `open_channels` and the
//! `DeviceChannel` trait object only, the same surface the compositor sees.

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use ledfx_core::protocol::artnet::decode_dmx;
use ledfx_core::protocol::ddp::{decode_packet, MAX_LEDS_PER_PACKET};
use ledfx_core::{ColorMapping, RepeatPolicy, Rgb};
use ledfx_host::application::device::{DeviceProtocol, SendOutcome};
use ledfx_host::infrastructure::network::{open_channel, open_channels, ChannelOptions, ChannelSpec};

fn receiver() -> (UdpSocket, SocketAddr) {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind receiver");
    socket
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("read timeout");
    let addr = socket.local_addr().expect("local addr");
    (socket, addr)
}

fn recv(socket: &UdpSocket) -> Vec<u8> {
    let mut buf = vec![0u8; 2048];
    let (n, _) = socket.recv_from(&mut buf).expect("datagram");
    buf.truncate(n);
    buf
}

fn unthrottled() -> ChannelOptions {
    ChannelOptions {
        min_send_interval: Duration::ZERO,
        turn_off: RepeatPolicy::new(5, Duration::ZERO),
    }
}

fn spec(protocol: DeviceProtocol, address: SocketAddr, led_count: usize) -> ChannelSpec {
    ChannelSpec {
        panel_id: "P".to_string(),
        protocol,
        address,
        led_count,
        universe: 9,
        color_mapping: ColorMapping::Brg,
    }
}

#[test]
fn test_open_channel_picks_implementation_by_protocol() {
    // Arrange
    let (_rx1, a1) = receiver();
    let (_rx2, a2) = receiver();

    // Act
    let ddp = open_channel(&spec(DeviceProtocol::Ddp, a1, 16), unthrottled()).expect("ddp");
    let art = open_channel(&spec(DeviceProtocol::Artnet, a2, 16), unthrottled()).expect("artnet");

    // Assert
    assert_eq!(ddp.protocol(), DeviceProtocol::Ddp);
    assert_eq!(art.protocol(), DeviceProtocol::Artnet);
    assert_eq!(ddp.address(), a1);
    assert_eq!(art.led_count(), 16);
    assert!(ddp.is_open() && art.is_open());
}

#[test]
fn test_large_ddp_frame_spans_fragments_with_byte_offsets() {
    // Arrange – 1000 LEDs need three fragments: 480 + 480 + 40
    let (rx, addr) = receiver();
    let ch = open_channel(&spec(DeviceProtocol::Ddp, addr, 1000), unthrottled()).expect("open");
    let frame: Vec<u8> = (0..3000).map(|i| (i % 251) as u8).collect();

    // Act
    let outcome = ch.send_frame(&frame).expect("send");

    // Assert
    assert_eq!(outcome, SendOutcome::Sent { packets: 3 });
    let mut reassembled = vec![0u8; 3000];
    for i in 0..3 {
        let packet = recv(&rx);
        let (header, payload) = decode_packet(&packet).expect("decode");
        assert_eq!(header.offset as usize, i * MAX_LEDS_PER_PACKET * 3);
        assert_eq!(header.is_push(), i == 2);
        let start = header.offset as usize;
        reassembled[start..start + payload.len()].copy_from_slice(payload);
    }
    assert_eq!(reassembled, frame);
}

#[test]
fn test_artnet_channel_reorders_with_configured_mapping() {
    // Arrange
    let (rx, addr) = receiver();
    let ch = open_channel(&spec(DeviceProtocol::Artnet, addr, 2), unthrottled()).expect("open");

    // Act
    ch.send_frame(&[10, 20, 30, 40, 50, 60]).expect("send");

    // Assert – BRG puts blue first
    let packet = recv(&rx);
    let dmx = decode_dmx(&packet).expect("decode");
    assert_eq!(dmx.universe, 9);
    assert_eq!(dmx.data, &[30, 10, 20, 60, 40, 50]);
    assert_eq!(dmx.pixels(ColorMapping::Brg)[1], Rgb::new(40, 50, 60));
}

#[test]
fn test_open_channels_preserves_order() {
    let (_rx1, a1) = receiver();
    let (_rx2, a2) = receiver();
    let specs = [
        spec(DeviceProtocol::Artnet, a1, 4),
        spec(DeviceProtocol::Ddp, a2, 9),
    ];

    let channels = open_channels(&specs, unthrottled()).expect("open");

    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].address(), a1);
    assert_eq!(channels[1].led_count(), 9);
}

#[test]
fn test_close_is_idempotent_through_trait_object() {
    let (_rx, addr) = receiver();
    let ch = open_channel(&spec(DeviceProtocol::Ddp, addr, 4), unthrottled()).expect("open");

    ch.close();
    ch.close();

    assert!(!ch.is_open());
    assert!(ch.turn_off().is_err());
}
