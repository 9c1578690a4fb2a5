//! End-to-end scan sessions over synthetic rendered frames.

use std::time::Duration;

use cube_scan::core::ALL_COLORS;
use cube_scan::{
    interop, CubeColor, Frame, FrameMailbox, ScanEvent, ScanPhase, Scanner, ValidationError,
};

/// Render a frontal face as an `image` buffer, stickers painted at their
/// reference palette values on a dark background, then hand it over the
/// same interop path a camera client would use.
fn face_frame(colors: [CubeColor; 9], ms: u64) -> Frame {
    let (width, height, side, gap) = (320u32, 320u32, 70u32, 12u32);
    let mut img = image::RgbImage::from_pixel(width, height, image::Rgb([20, 20, 20]));
    let pitch = side + gap;
    let total = 3 * side + 2 * gap;
    let x0 = (width - total) / 2;
    let y0 = (height - total) / 2;

    for row in 0..3u32 {
        for col in 0..3u32 {
            let rgb = colors[(row * 3 + col) as usize].reference_srgb();
            let sx = x0 + col * pitch;
            let sy = y0 + row * pitch;
            for y in sy..sy + side {
                for x in sx..sx + side {
                    img.put_pixel(x, y, image::Rgb(rgb));
                }
            }
        }
    }
    interop::frame_from_image(&img, Duration::from_millis(ms)).unwrap()
}

#[test]
fn six_rendered_faces_complete_a_solved_cube() {
    let mailbox = FrameMailbox::new();
    let mut scanner = Scanner::default();
    let mut completed = None;

    let mut ms = 0;
    for color in ALL_COLORS {
        // Each face stays in view for a few frames, as on a live stream.
        for _ in 0..3 {
            mailbox.publish(face_frame([color; 9], ms));
            ms += 33;
            for event in scanner.service(&mailbox).expect("frame present") {
                if let ScanEvent::Complete(state) = event {
                    completed = Some(state);
                }
            }
        }
    }

    let state = completed.expect("scan session completed");
    assert_eq!(
        state.to_facelet_string(),
        "UUUUUUUUURRRRRRRRRFFFFFFFFFDDDDDDDDDLLLLLLLLLBBBBBBBBB"
    );
    for color in ALL_COLORS {
        assert_eq!(state.face(color), &[color; 9]);
    }

    let snap = scanner.snapshot();
    assert_eq!(snap.state.phase, ScanPhase::Complete);
    assert_eq!(snap.state.recorded.len(), 6);
}

#[test]
fn miscounted_colors_fail_validation_and_flag_faces() {
    let mailbox = FrameMailbox::new();
    let mut scanner = Scanner::default();

    let mut ms = 0;
    for color in &ALL_COLORS[1..] {
        mailbox.publish(face_frame([*color; 9], ms));
        ms += 33;
        scanner.service(&mailbox).expect("frame present");
    }

    // Last face: white with the top-left sticker misread as red.
    let mut colors = [CubeColor::White; 9];
    colors[0] = CubeColor::Red;
    mailbox.publish(face_frame(colors, ms));
    let events = scanner.service(&mailbox).expect("frame present");

    assert!(events.iter().any(|e| matches!(
        e,
        ScanEvent::ValidationFailed(ValidationError::ColorCount { .. })
    )));

    let snap = scanner.snapshot();
    assert_eq!(snap.state.phase, ScanPhase::Scanning);
    assert!(snap.state.flagged.contains(&CubeColor::White));
    assert!(snap.state.flagged.contains(&CubeColor::Red));
    assert!(!snap.state.recorded.contains(&CubeColor::White));
    assert!(!snap.state.recorded.contains(&CubeColor::Red));
}

#[test]
fn reset_command_abandons_a_partial_session() {
    let mailbox = FrameMailbox::new();
    let mut scanner = Scanner::default();

    mailbox.publish(face_frame([CubeColor::Yellow; 9], 0));
    scanner.service(&mailbox).expect("frame present");
    assert_eq!(scanner.snapshot().state.phase, ScanPhase::Scanning);

    mailbox.push_command(cube_scan::ScanCommand::Reset);
    mailbox.publish(face_frame([CubeColor::Green; 9], 33));
    scanner.service(&mailbox).expect("frame present");

    let snap = scanner.snapshot();
    assert_eq!(snap.state.recorded, vec![CubeColor::Green]);
}
