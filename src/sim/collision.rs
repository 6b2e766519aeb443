//! Collision detection and response for walls, paddle and grid
//!
//! Balls are treated as axis-aligned boxes of half-size `radius` when
//! scanning the grid, which keeps the cell range computation exact.

use glam::Vec2;

use super::grid::Grid;
use super::state::{Ball, Paddle, PowerUpKind, SpecialKind};
use crate::settings::EngineSettings;

/// Which walls a ball touched this step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallHits {
    pub side: bool,
    pub top: bool,
}

/// Reflect off the side and top walls and clamp back in bounds
pub fn resolve_walls(ball: &mut Ball, radius: f32, cols: usize) -> WallHits {
    let mut hits = WallHits::default();
    let right = cols as f32 - radius;

    if ball.pos.x < radius {
        ball.pos.x = radius;
        if ball.vel.x < 0.0 {
            ball.vel.x = -ball.vel.x;
        }
        hits.side = true;
    } else if ball.pos.x > right {
        ball.pos.x = right;
        if ball.vel.x > 0.0 {
            ball.vel.x = -ball.vel.x;
        }
        hits.side = true;
    }

    if ball.pos.y < radius {
        ball.pos.y = radius;
        if ball.vel.y < 0.0 {
            ball.vel.y = -ball.vel.y;
        }
        hits.top = true;
    }

    hits
}

/// Bounce off the paddle if the ball's lower edge entered its band during
/// the move from `prev_pos`.
///
/// The test is swept, so a fast ball cannot skip over the band. The hit
/// offset from the paddle center at the crossing point picks the bounce
/// angle: center is straight up, edges approach `max_bounce_angle`. Speed is
/// preserved.
pub fn resolve_paddle(
    ball: &mut Ball,
    prev_pos: Vec2,
    paddle: &Paddle,
    paddle_top: f32,
    settings: &EngineSettings,
) -> bool {
    let radius = settings.ball_radius;
    if ball.vel.y <= 0.0 {
        return false;
    }

    let prev_lower = prev_pos.y + radius;
    let lower = ball.pos.y + radius;
    if lower < paddle_top || prev_lower > paddle_top + settings.paddle_thickness {
        return false;
    }

    // Interpolate to where the lower edge reached the paddle top
    let t = if prev_lower < paddle_top && lower > prev_lower {
        ((paddle_top - prev_lower) / (lower - prev_lower)).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let hit_x = prev_pos.x + (ball.pos.x - prev_pos.x) * t;
    if hit_x + radius < paddle.x || hit_x - radius > paddle.right() {
        return false;
    }

    let half = (paddle.width / 2.0).max(f32::EPSILON);
    let offset = ((hit_x - paddle.center()) / half).clamp(-1.0, 1.0);
    let speed = ball.vel.length();
    let angle = offset * settings.max_bounce_angle;

    let mut vx = speed * angle.sin();
    if vx.abs() < settings.min_horizontal_speed {
        let sign = if offset != 0.0 {
            offset.signum()
        } else if ball.vel.x != 0.0 {
            ball.vel.x.signum()
        } else {
            1.0
        };
        vx = sign * settings.min_horizontal_speed;
    }
    let vy = -(speed * speed - vx * vx).max(0.0).sqrt();

    ball.vel = Vec2::new(vx, vy);
    ball.pos = Vec2::new(hit_x, paddle_top - radius);
    true
}

/// Scale the ball's velocity down to `max_speed` if it exceeds it
pub fn clamp_speed(ball: &mut Ball, max_speed: f32) {
    if ball.vel.length() > max_speed {
        ball.vel = ball.vel.normalize_or_zero() * max_speed;
    }
}

/// Cells covered by the ball's bounding box, clamped to the grid
pub fn covered_cells(
    grid: &Grid,
    pos: Vec2,
    radius: f32,
) -> Option<(std::ops::RangeInclusive<usize>, std::ops::RangeInclusive<usize>)> {
    let (rows, cols) = (grid.rows() as i64, grid.cols() as i64);
    if rows == 0 || cols == 0 {
        return None;
    }
    let x0 = (pos.x - radius).floor() as i64;
    let x1 = (pos.x + radius).floor() as i64;
    let y0 = (pos.y - radius).floor() as i64;
    let y1 = (pos.y + radius).floor() as i64;
    if x1 < 0 || y1 < 0 || x0 >= cols || y0 >= rows {
        return None;
    }
    let xs = x0.max(0) as usize..=x1.min(cols - 1) as usize;
    let ys = y0.max(0) as usize..=y1.min(rows - 1) as usize;
    Some((xs, ys))
}

/// First occupied cell under the ball in row-major order
pub fn first_contact(grid: &Grid, pos: Vec2, radius: f32) -> Option<(usize, usize)> {
    let (xs, ys) = covered_cells(grid, pos, radius)?;
    for y in ys {
        for x in xs.clone() {
            if grid.is_alive(x, y) {
                return Some((x, y));
            }
        }
    }
    None
}

/// Outcome of one ball striking one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellHit {
    pub x: usize,
    pub y: usize,
    /// Special behavior of the cell at the time of the hit
    pub kind: Option<SpecialKind>,
    pub destroyed: bool,
    /// Level-promised drop released by the destruction
    pub guaranteed_drop: Option<PowerUpKind>,
}

/// Apply one hit to a live cell: plain cells clear, special cells lose 1 hp
/// and clear at 0.
pub fn hit_cell(grid: &mut Grid, x: usize, y: usize) -> CellHit {
    let kind = grid.special(x, y).map(|c| c.kind);
    let destroyed = match grid.special_mut(x, y) {
        Some(cell) => {
            cell.hp = cell.hp.saturating_sub(1);
            cell.hp == 0
        }
        None => true,
    };
    let guaranteed_drop = if destroyed {
        grid.clear(x, y).guaranteed_drop
    } else {
        None
    };
    CellHit {
        x,
        y,
        kind,
        destroyed,
        guaranteed_drop,
    }
}

/// Whether the ball's lower edge has passed the bottom boundary
#[inline]
pub fn is_below_board(ball: &Ball, radius: f32, field_height: f32) -> bool {
    ball.pos.y + radius > field_height
}
