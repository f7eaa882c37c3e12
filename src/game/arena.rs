//! Arena dimensions, entity sizes and AABB collision tests

/// Width of the playfield
pub const ARENA_WIDTH: f32 = 800.0;
/// Height of the playfield
pub const ARENA_HEIGHT: f32 = 600.0;

/// Jet hitbox
pub const PLAYER_WIDTH: f32 = 50.0;
pub const PLAYER_HEIGHT: f32 = 30.0;

/// Side length of a square power-up
pub const POWER_UP_SIZE: f32 = 20.0;

/// Bullet hitbox height; width depends on the size-boost effect
pub const BULLET_HEIGHT: f32 = 5.0;
pub const BASE_BULLET_WIDTH: f32 = 10.0;
pub const BOOSTED_BULLET_WIDTH: f32 = 20.0;

/// Horizontal bullet speed per tick (sign encodes direction)
pub const BULLET_SPEED: f32 = 10.0;

/// Vertical movement per move intent; doubled by the speed-boost effect
pub const BASE_MOVE_SPEED: f32 = 10.0;
pub const BOOSTED_MOVE_SPEED: f32 = 20.0;

/// Axis-aligned bounding box, top-left anchored
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Strict AABB overlap test: true iff the rectangles' projections overlap
/// on both axes. Edge-touching rectangles do not overlap.
pub fn overlaps(a: Rect, b: Rect) -> bool {
    a.x < b.x + b.width && a.x + a.width > b.x && a.y < b.y + b.height && a.y + a.height > b.y
}
