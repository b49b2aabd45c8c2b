use crate::board::core::{BoardLayout, RoutingResult};
use crate::geom::point::Point;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::rect::Rect as ImageRect;
use std::path::Path;

/// Renders the board, keep-out zones, routed traces and vias to a PNG.
pub fn draw_routed_board(
    layout: &BoardLayout,
    result: &RoutingResult,
    filename: &str,
    width: u32,
    height: u32,
) {
    let mut img = RgbaImage::from_pixel(width, height, Rgba([15, 15, 18, 255]));

    let board_w = layout.outline.width();
    let board_h = layout.outline.height();
    if board_w <= 0.0 || board_h <= 0.0 {
        return;
    }

    let scale_x = width as f64 / board_w;
    let scale_y = height as f64 / board_h;
    let map = |p: Point<f64>| {
        (
            (p.x - layout.outline.min.x) * scale_x,
            height as f64 - (p.y - layout.outline.min.y) * scale_y,
        )
    };

    let zone_color = Rgba([45, 45, 52, 255]);
    for zone in &layout.zones {
        let ring: Vec<imageproc::point::Point<i32>> = zone
            .outline
            .points()
            .iter()
            .map(|&p| {
                let (x, y) = map(p);
                imageproc::point::Point::new(x as i32, y as i32)
            })
            .collect();
        if ring.len() >= 3 && ring.first() != ring.last() {
            draw_polygon_mut(&mut img, &ring, zone_color);
        }
    }

    let colors = [
        // Layer 0 (front): red
        Rgba([255, 40, 80, 200]),
        // Layer 1 (back): blue
        Rgba([0, 120, 255, 200]),
        // Layer 2: green
        Rgba([0, 220, 110, 200]),
        // Layer 3: gold
        Rgba([255, 215, 0, 200]),
    ];

    let mut segments: Vec<_> = result.segments.iter().collect();
    segments.sort_by_key(|s| s.layer);
    for seg in segments {
        let color = colors[(seg.layer as usize).min(colors.len() - 1)];
        for (p1, p2) in seg.spans() {
            let (x1, y1) = map(p1);
            let (x2, y2) = map(p2);
            draw_line_segment_mut(&mut img, (x1 as f32, y1 as f32), (x2 as f32, y2 as f32), color);
        }
    }

    let via_color = Rgba([255, 255, 255, 230]);
    for via in &result.vias {
        let (x, y) = map(via.position);
        let rect = ImageRect::at(x as i32 - 1, y as i32 - 1).of_size(3, 3);
        draw_filled_rect_mut(&mut img, rect, via_color);
    }

    let socket_color = Rgba([255, 255, 255, 255]);
    for socket in &layout.sockets {
        let (x, y) = map(socket.position);
        let rect = ImageRect::at(x as i32 - 1, y as i32 - 1).of_size(2, 2);
        draw_filled_rect_mut(&mut img, rect, socket_color);
    }

    let _ = img.save(Path::new(filename));
}
