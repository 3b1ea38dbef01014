//! Genres and visual styles offered when starting an adventure

/// Selectable story genres
pub const GENRES: [&str; 6] = [
    "Dark Fantasy",
    "Cyberpunk",
    "Space Opera",
    "Cthulhu Mythos",
    "Wild West Steampunk",
    "High Fantasy",
];

/// Selectable art styles; the chosen one is fixed for the whole session
pub const VISUAL_STYLES: [&str; 6] = [
    "Studio Ghibli",
    "Cyberpunk Neon",
    "Oil Painting",
    "Dark Noir",
    "Vibrant Watercolor",
    "Hyper-Realistic",
];

/// Case-insensitive genre lookup returning the canonical name
///
/// # Examples
///
/// ```
/// use chronos_weaver::game::catalog::find_genre;
///
/// assert_eq!(find_genre("space opera"), Some("Space Opera"));
/// assert_eq!(find_genre("Romance"), None);
/// ```
pub fn find_genre(name: &str) -> Option<&'static str> {
    find_in(&GENRES, name)
}

/// Case-insensitive visual style lookup returning the canonical name
pub fn find_style(name: &str) -> Option<&'static str> {
    find_in(&VISUAL_STYLES, name)
}

fn find_in(list: &[&'static str], name: &str) -> Option<&'static str> {
    let needle = name.trim();
    list.iter().copied().find(|entry| entry.eq_ignore_ascii_case(needle))
}
