//! Integration tests for the ledfx-core wire formats.
//!
//! These tests drive a panel's color buffer through the public API all the
//! way to datagram bytes, then decode those bytes the way a receiver would.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use ledfx_core::protocol::artnet::{decode_dmx, encode_dmx, PIXEL_DATA_OFFSET};
use ledfx_core::protocol::ddp::{decode_packet, encode_frame, MAX_PAYLOAD_BYTES};
use ledfx_core::{ColorBuffer, ColorMapping, FrameSequence, LayoutModel, PanelGeometry, PanelRegion, Rgb};

fn panel(id: &str, x: i32, grid_size: usize, pixel_size: u32, mirror: bool) -> PanelGeometry {
    let side = grid_size as u32 * pixel_size;
    PanelGeometry {
        id: id.to_string(),
        address: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 4048),
        region: PanelRegion::new(x, 0, side, side),
        grid_size,
        pixel_size,
        mirror,
    }
}

/// Sends `frames` frames through the DDP encoder the way a channel does:
/// stamp with `current()`, advance after the last fragment.
fn stream_frames(seq: &FrameSequence, rgb: &[u8], frames: usize) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    for _ in 0..frames {
        out.extend(encode_frame(rgb, seq.current()));
        seq.advance();
    }
    out
}

#[test]
fn test_ddp_frame_reassembles_to_buffer_bytes() {
    // Arrange – a 32×32 panel needs three fragments (1024 LEDs)
    let mut buf = ColorBuffer::new(32);
    buf.set(31, 31, Rgb::new(1, 2, 3));
    let rgb = buf.to_rgb_bytes(false);

    // Act
    let packets = encode_frame(&rgb, 0);

    // Assert
    assert_eq!(packets.len(), 3);
    let mut rebuilt = vec![0u8; rgb.len()];
    for p in &packets {
        let (header, payload) = decode_packet(p).expect("valid datagram");
        let start = header.offset as usize;
        rebuilt[start..start + payload.len()].copy_from_slice(payload);
    }
    assert_eq!(rebuilt, rgb);
    assert_eq!(&rebuilt[rgb.len() - 3..], &[1, 2, 3]);
}

#[test]
fn test_ddp_sequence_shared_within_frame_and_wraps_between_frames() {
    // Arrange – 600 LEDs → 2 fragments per frame, counter two frames from wrapping
    let seq = FrameSequence::starting_at(254);
    let rgb = vec![0u8; 600 * 3];

    // Act
    let packets = stream_frames(&seq, &rgb, 3);

    // Assert
    let seqs: Vec<u8> = packets
        .iter()
        .map(|p| decode_packet(p).expect("valid datagram").0.sequence)
        .collect();
    assert_eq!(seqs, vec![254, 254, 255, 255, 0, 0]);
}

#[test]
fn test_ddp_only_last_fragment_pushes() {
    let rgb = vec![7u8; 1500 * 3];
    let packets = encode_frame(&rgb, 0);
    let push: Vec<bool> = packets
        .iter()
        .map(|p| decode_packet(p).expect("valid datagram").0.is_push())
        .collect();
    assert_eq!(push, vec![false, false, false, true]);
    assert!(packets[..3]
        .iter()
        .all(|p| decode_packet(p).expect("valid datagram").1.len() == MAX_PAYLOAD_BYTES));
}

#[test]
fn test_artnet_roundtrip_recovers_every_pixel_for_every_mapping() {
    // Arrange
    let mut buf = ColorBuffer::new(4);
    for x in 0..4 {
        for y in 0..4 {
            buf.set(x, y, Rgb::new(x as u8 * 60, y as u8 * 60, 200));
        }
    }
    let rgb = buf.to_rgb_bytes(false);

    for mapping in ColorMapping::ALL {
        // Act
        let packet = encode_dmx(2, mapping, &rgb, buf.led_count());
        let dmx = decode_dmx(&packet).expect("valid datagram");

        // Assert
        assert_eq!(dmx.universe, 2);
        let pixels = dmx.pixels(mapping);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(Some(pixels[y * 4 + x]), buf.get(x, y), "{mapping} at ({x},{y})");
            }
        }
    }
}

#[test]
fn test_mirrored_panel_serializes_right_to_left() {
    // Arrange – a 16×16 mirrored panel with the top-left cell lit
    let layout = LayoutModel::new("m", "t", 240, 240, vec![panel("Grid01", 0, 16, 15, true)])
        .expect("valid layout");
    let geom = &layout.panels()[0];
    let mut buf = ColorBuffer::new(geom.grid_size);
    let cell = layout.locate(0, 0).expect("inside panel");
    buf.set(cell.x, cell.y, Rgb::RED);

    // Act
    let packet = encode_dmx(0, ColorMapping::Rgb, &buf.to_rgb_bytes(geom.mirror), geom.led_count());

    // Assert – the lit pixel is the last of row 0
    let first_row = &packet[PIXEL_DATA_OFFSET..PIXEL_DATA_OFFSET + 16 * 3];
    assert_eq!(&first_row[45..48], &[255, 0, 0]);
    assert!(first_row[..45].iter().all(|&b| b == 0));
}

#[test]
fn test_locate_then_set_reaches_expected_wire_index() {
    // Arrange – two 16×16 panels, the second starting at x = 250
    let layout = LayoutModel::new(
        "TwoGrids",
        "LedFx",
        500,
        240,
        vec![panel("Grid01", 0, 16, 15, false), panel("Grid02", 250, 16, 15, false)],
    )
    .expect("valid layout");
    let mut buffers = vec![ColorBuffer::new(16), ColorBuffer::new(16)];

    // Act – window (250 + 3*15 + 7, 2*15 + 7) is cell (3, 2) of the second panel
    let cell = layout.locate(250 + 45 + 7, 37).expect("inside panel");
    buffers[cell.panel].set(cell.x, cell.y, Rgb::GREEN);
    let packets = encode_frame(&buffers[1].to_rgb_bytes(false), 0);

    // Assert – index = y * N + x = 2 * 16 + 3 = 35
    let (_, payload) = decode_packet(&packets[0]).expect("valid datagram");
    assert_eq!(&payload[35 * 3..35 * 3 + 3], &[0, 255, 0]);
}
