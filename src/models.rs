use std::ops::RangeInclusive;

/// Numeric identifier of a game family, taken from the `/casino/{category}` route.
pub type GameCategory = u16;

/// Backend user identifier, known only after login.
pub type UserId = u32;

/// Backend hall (operator) identifier, known only after login.
pub type HallId = u16;

/// Categories the gateway accepts connections for.
pub const GAME_CATEGORIES: RangeInclusive<GameCategory> = 5000..=5999;

/// Parse a route segment into an accepted game category.
pub fn parse_category(raw: &str) -> Option<GameCategory> {
    let category: GameCategory = raw.parse().ok()?;
    GAME_CATEGORIES.contains(&category).then_some(category)
}
