//! Integration tests for the compositor driving real UDP channels.
//!
//! # Purpose
//!
//! Each test builds a layout the way the binary does (TOML → `resolve` →
//! `open_channels` → `Compositor::new`), points every panel at a loopback
//! receiver, and inspects the datagrams that arrive. They verify:
//!
//! - A mixed DDP + Art-Net layout delivers one frame to each device with the
//!   right header, universe and channel order.
//! - Window-space writes land on the right panel and the right wire offset.
//! - Turn-off sends five black frames to every panel.
//! - Closing the compositor turns later frames into `NotConnected`.

use std::net::UdpSocket;
use std::time::Duration;

use ledfx_core::protocol::artnet::{decode_dmx, PIXEL_DATA_OFFSET};
use ledfx_core::protocol::ddp::decode_packet;
use ledfx_core::{ColorMapping, Rgb};
use ledfx_host::application::compositor::Compositor;
use ledfx_host::application::device::ChannelError;
use ledfx_host::infrastructure::network::open_channels;
use ledfx_host::infrastructure::storage::config::LayoutFile;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn receiver() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind receiver");
    socket
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("read timeout");
    let port = socket.local_addr().expect("local addr").port();
    (socket, port)
}

fn recv(socket: &UdpSocket) -> Vec<u8> {
    let mut buf = vec![0u8; 2048];
    let (n, _) = socket.recv_from(&mut buf).expect("datagram");
    buf.truncate(n);
    buf
}

/// Two 4×4 panels side by side: a DDP panel at x=0 and a mirrored Art-Net
/// panel at x=40, both reachable on loopback.
fn two_panel_layout(ddp_port: u16, artnet_port: u16) -> LayoutFile {
    let text = format!(
        r#"
[layout]
name = "Pair"
window_width = 80
window_height = 40

[output]
min_send_interval_ms = 0
turn_off_interval_ms = 0

[[panels]]
id = "Left"
device_ip = "127.0.0.1"
port = {ddp_port}
width = 40
height = 40
grid_size = 4
pixel_size = 10

[[panels]]
id = "Right"
device_ip = "127.0.0.1"
protocol = "artnet"
port = {artnet_port}
universe = 3
x = 40
width = 40
height = 40
grid_size = 4
pixel_size = 10
mirror = true
"#
    );
    toml::from_str(&text).expect("layout toml")
}

fn build(file: &LayoutFile) -> Compositor {
    let resolved = file.resolve().expect("resolve");
    let channels = open_channels(&resolved.channels, resolved.options).expect("open channels");
    Compositor::new(resolved.layout, channels).expect("compositor")
}

// ── Frame delivery ────────────────────────────────────────────────────────────

#[test]
fn test_mixed_protocols_each_receive_one_frame() {
    // Arrange
    let (ddp_rx, ddp_port) = receiver();
    let (art_rx, art_port) = receiver();
    let mut compositor = build(&two_panel_layout(ddp_port, art_port));
    compositor.set_color(0, 0, 0, Rgb::RED);
    compositor.set_color(1, 0, 0, Rgb::RED);

    // Act
    let ok = compositor.send_to_devices().expect("send");

    // Assert – DDP: 16 LEDs in one pushed fragment, raw RGB order
    assert!(ok);
    let ddp = recv(&ddp_rx);
    let (header, payload) = decode_packet(&ddp).expect("ddp decode");
    assert!(header.is_push());
    assert_eq!(header.sequence, 0);
    assert_eq!(payload.len(), 48);
    assert_eq!(&payload[..3], &[255, 0, 0]);

    // Assert – Art-Net: universe 3, GBR by default, mirrored row
    let art = recv(&art_rx);
    let dmx = decode_dmx(&art).expect("artnet decode");
    assert_eq!(dmx.universe, 3);
    assert_eq!(dmx.data.len(), 48);
    // Cell (0,0) is serialized last in its row when mirrored: LED 3.
    assert_eq!(&art[PIXEL_DATA_OFFSET + 9..PIXEL_DATA_OFFSET + 12], &[0, 0, 255]);
    assert_eq!(dmx.pixels(ColorMapping::Gbr)[3], Rgb::RED);
}

#[test]
fn test_window_write_reaches_the_right_panel_offset() {
    // Arrange
    let (ddp_rx, ddp_port) = receiver();
    let (_art_rx, art_port) = receiver();
    let mut compositor = build(&two_panel_layout(ddp_port, art_port));

    // Act – (25, 15) is cell (2, 1) of the left panel → LED 1*4 + 2 = 6
    let cell = compositor
        .set_window_color(25, 15, Rgb::GREEN)
        .expect("inside left panel");
    compositor.send_to_devices().expect("send");

    // Assert
    assert_eq!((cell.panel, cell.x, cell.y), (0, 2, 1));
    let ddp = recv(&ddp_rx);
    let (_, payload) = decode_packet(&ddp).expect("decode");
    assert_eq!(&payload[18..21], &[0, 255, 0]);
    assert!(payload[..18].iter().all(|&b| b == 0));
}

#[test]
fn test_consecutive_frames_advance_ddp_sequence() {
    let (ddp_rx, ddp_port) = receiver();
    let (_art_rx, art_port) = receiver();
    let mut compositor = build(&two_panel_layout(ddp_port, art_port));

    for _ in 0..3 {
        compositor.send_to_devices().expect("send");
    }

    let sequences: Vec<u8> = (0..3)
        .map(|_| decode_packet(&recv(&ddp_rx)).expect("decode").0.sequence)
        .collect();
    assert_eq!(sequences, vec![0, 1, 2]);
}

// ── Shutdown ──────────────────────────────────────────────────────────────────

#[test]
fn test_turn_off_all_blanks_every_panel_five_times() {
    // Arrange
    let (ddp_rx, ddp_port) = receiver();
    let (art_rx, art_port) = receiver();
    let mut compositor = build(&two_panel_layout(ddp_port, art_port));
    compositor.fill_panel(0, Rgb::WHITE);
    compositor.fill_panel(1, Rgb::WHITE);

    // Act
    let ok = compositor.turn_off_all();

    // Assert
    assert!(ok);
    for _ in 0..5 {
        let ddp_pkt = recv(&ddp_rx);
        let (_, payload) = decode_packet(&ddp_pkt).expect("ddp");
        assert!(payload.iter().all(|&b| b == 0));
        let art = recv(&art_rx);
        assert!(art[PIXEL_DATA_OFFSET..].iter().all(|&b| b == 0));
    }
}

#[test]
fn test_send_after_close_reports_not_connected() {
    // Arrange
    let (_ddp_rx, ddp_port) = receiver();
    let (_art_rx, art_port) = receiver();
    let mut compositor = build(&two_panel_layout(ddp_port, art_port));

    // Act
    compositor.close();
    let result = compositor.send_to_devices();

    // Assert
    assert!(matches!(result, Err(ChannelError::NotConnected { .. })));
    assert!(!compositor.turn_off_all());
}
