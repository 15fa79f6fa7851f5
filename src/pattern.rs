use serde::{Deserialize, Serialize};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

use crate::{
    grid::{Grid, GridError},
    prelude::{DISK_EXTENSION, IMAGE_EXTENSION},
};

/// A colour as the shell packs it (ARGB in one int). Carried around, never interpreted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackedColor(pub i32);

/// Errors raised when building, encoding or decoding a [`Pattern`].
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("title {0:?} has no characters usable in a filename")]
    EmptySlug(String),
    #[error("malformed pattern record: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Row-major copy of every cell on the board.
pub fn flatten(grid: &Grid) -> Vec<bool> {
    grid.cells().to_vec()
}

/// Rebuilds a board from the output of [`flatten`]. The result starts at generation zero.
pub fn unflatten(data: &[bool], width: usize, height: usize) -> Result<Grid, GridError> {
    let expected = Grid::cell_count(width, height)?;
    if expected != data.len() {
        return Err(GridError::LengthMismatch {
            expected,
            actual: data.len(),
        });
    }
    Ok(Grid::from_cells(width, height, data.to_vec()))
}

/// Turns a display title into a lower-case `[a-z0-9_-]` identifier safe for paths and URLs.
///
/// Runs of ASCII whitespace (space, tab, newline, vertical tab, form feed, carriage return)
/// become a single `-`, accented letters lose their marks, anything else outside the ASCII word
/// set is dropped. Other whitespace such as a no-break space is dropped too. May return an
/// empty string.
pub fn slugify(title: &str) -> String {
    let mut dashed = String::with_capacity(title.len());
    let mut in_whitespace = false;
    for ch in title.chars() {
        if is_slug_separator(ch) {
            if !in_whitespace {
                dashed.push('-');
            }
            in_whitespace = true;
        } else {
            dashed.push(ch);
            in_whitespace = false;
        }
    }

    dashed
        .nfd()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-')
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

#[inline]
fn is_slug_separator(ch: char) -> bool {
    ch.is_ascii_whitespace() || ch == '\x0B'
}

/// A saved board plus what the shell needs to list and redraw it.
///
/// Field names on the wire follow the shared pattern store: `data`, `title`, `alive`, `dead`
/// and `filename`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    data: Vec<bool>,
    title: String,
    #[serde(rename = "alive")]
    alive_color: PackedColor,
    #[serde(rename = "dead")]
    dead_color: PackedColor,
    #[serde(rename = "filename")]
    image_filename: String,
}

impl Pattern {
    /// Snapshots `grid` under `title`. Fails if the title yields an empty slug.
    pub fn capture(
        grid: &Grid,
        title: impl Into<String>,
        alive_color: PackedColor,
        dead_color: PackedColor,
    ) -> Result<Self, PatternError> {
        let title = title.into();
        let slug = slugify(&title);
        if slug.is_empty() {
            return Err(PatternError::EmptySlug(title));
        }

        Ok(Self {
            data: flatten(grid),
            image_filename: format!("{slug}.{IMAGE_EXTENSION}"),
            title,
            alive_color,
            dead_color,
        })
    }

    pub fn data(&self) -> &[bool] {
        &self.data
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn alive_color(&self) -> PackedColor {
        self.alive_color
    }

    pub fn dead_color(&self) -> PackedColor {
        self.dead_color
    }

    pub fn image_filename(&self) -> &str {
        &self.image_filename
    }

    pub fn slug(&self) -> String {
        slugify(&self.title)
    }

    /// Name for a local save of the raw board.
    pub fn disk_filename(&self) -> String {
        format!("{}.{DISK_EXTENSION}", self.slug())
    }

    pub fn alive_count(&self) -> usize {
        self.data.iter().filter(|alive| **alive).count()
    }

    /// Rebuilds the board this pattern was taken from.
    pub fn to_grid(&self, width: usize, height: usize) -> Result<Grid, GridError> {
        unflatten(&self.data, width, height)
    }

    pub fn to_json(&self) -> Result<String, PatternError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a stored record. Every field must be present.
    pub fn from_json(json: &str) -> Result<Self, PatternError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod test {
    use serde_json::{json, Value};

    use super::*;

    fn glider(width: usize, height: usize) -> Grid {
        let mut grid = Grid::new(width, height);
        for (row, col) in [(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)] {
            grid.set(row, col, true).unwrap();
        }
        grid
    }

    #[test]
    fn flatten_is_row_major() {
        let grid = Grid::from_matrix(3, 2, &[[true, false, false], [false, true, true]]).unwrap();
        assert_eq!(vec![true, false, false, false, true, true], flatten(&grid));
    }

    #[test]
    fn unflatten_inverts_flatten() {
        let mut rng = fastrand::Rng::with_seed(1234);
        for (width, height) in [(20, 20), (3, 7), (1, 1), (0, 0), (16, 2)] {
            let mut grid = Grid::new(width, height);
            grid.randomize(&mut rng);
            grid.step();

            let rebuilt = unflatten(&flatten(&grid), width, height).unwrap();
            assert_eq!(grid, rebuilt);
            assert_eq!(grid.to_matrix(), rebuilt.to_matrix());
        }
    }

    #[test]
    fn unflatten_rejects_wrong_length() {
        let data = vec![false; 15];
        assert_eq!(
            Err(GridError::LengthMismatch {
                expected: 16,
                actual: 15
            }),
            unflatten(&data, 4, 4)
        );
        assert!(unflatten(&data, 5, 3).is_ok());
        assert_eq!(
            Err(GridError::TooLarge {
                width: usize::MAX,
                height: 2
            }),
            unflatten(&data, usize::MAX, 2)
        );
    }

    #[test]
    fn slugify_cleans_titles() {
        assert_eq!("my-pattern", slugify("My Pattern!"));
        assert_eq!("creme-brulee", slugify("Crème Brûlée"));
        assert_eq!("-spaced-out-", slugify("  spaced \t\n out "));
        assert_eq!("tab-and-newline", slugify("tab\tand\nnewline"));
        assert_eq!("snake_case-ok", slugify("snake_case-ok"));
        assert_eq!("gosper-glider-gun-2", slugify("Gosper Glider Gun #2"));
        assert_eq!("strae", slugify("Straße"));
    }

    #[test]
    fn slugify_lowercases_without_locale_rules() {
        // dotted capital I decomposes to I + combining dot
        assert_eq!("istanbul", slugify("İSTANBUL"));
        assert_eq!("title", slugify("TITLE"));
    }

    #[test]
    fn slugify_only_splits_on_ascii_whitespace() {
        assert_eq!("ab", slugify("a\u{00A0}b"));
        assert_eq!("ab", slugify("a\u{2028}b"));
        assert_eq!("a-b", slugify("a\x0Bb"));
        assert_eq!("a-b", slugify("a\x0C\r\nb"));
        // the no-break space splits the run, then is dropped
        assert_eq!("a--b", slugify("a \u{00A0} b"));
    }

    #[test]
    fn slugify_can_come_back_empty() {
        assert_eq!("", slugify(""));
        assert_eq!("", slugify("!!!?"));
        assert_eq!("", slugify("日本語"));
    }

    #[test]
    fn slugify_is_stable() {
        let first = slugify("My Pattern!");
        for _ in 0..10 {
            let again = slugify("My Pattern!");
            assert_eq!(first, again);
            assert!(!again.chars().any(char::is_whitespace));
            assert!(!again.chars().any(|ch| ch.is_uppercase()));
        }
    }

    #[test]
    fn capture_derives_filenames() {
        let grid = glider(20, 20);
        let pattern =
            Pattern::capture(&grid, "Little Glider", PackedColor(-16711936), PackedColor(0))
                .unwrap();

        assert_eq!("Little Glider", pattern.title());
        assert_eq!("little-glider.png", pattern.image_filename());
        assert_eq!("little-glider.data", pattern.disk_filename());
        assert_eq!(400, pattern.data().len());
        assert_eq!(5, pattern.alive_count());
        assert_eq!(PackedColor(-16711936), pattern.alive_color());
        assert_eq!(PackedColor(0), pattern.dead_color());
        assert_eq!(grid, pattern.to_grid(20, 20).unwrap());
    }

    #[test]
    fn capture_refuses_titles_without_a_slug() {
        let err = Pattern::capture(&Grid::default(), "???", PackedColor(1), PackedColor(2))
            .unwrap_err();
        assert!(matches!(err, PatternError::EmptySlug(title) if title == "???"));
    }

    #[test]
    fn record_uses_store_field_names() {
        let pattern =
            Pattern::capture(&glider(3, 3), "Tiny", PackedColor(-1), PackedColor(7)).unwrap();
        let value: Value = serde_json::from_str(&pattern.to_json().unwrap()).unwrap();

        assert_eq!(
            json!({
                "data": [false, true, false, false, false, true, true, true, true],
                "title": "Tiny",
                "alive": -1,
                "dead": 7,
                "filename": "tiny.png"
            }),
            value
        );
    }

    #[test]
    fn record_survives_json() {
        let pattern =
            Pattern::capture(&glider(20, 20), "Glider", PackedColor(5), PackedColor(6)).unwrap();
        let decoded = Pattern::from_json(&pattern.to_json().unwrap()).unwrap();
        assert_eq!(pattern, decoded);
        assert_eq!(glider(20, 20), decoded.to_grid(20, 20).unwrap());
    }

    #[test]
    fn partial_records_are_rejected() {
        let missing_colors = r#"{"data":[true],"title":"x","filename":"x.png"}"#;
        assert!(matches!(
            Pattern::from_json(missing_colors),
            Err(PatternError::Json(_))
        ));
    }

    #[test]
    fn to_grid_checks_the_board_size() {
        let pattern =
            Pattern::capture(&glider(20, 20), "Glider", PackedColor(0), PackedColor(0)).unwrap();
        assert_eq!(
            Err(GridError::LengthMismatch {
                expected: 100,
                actual: 400
            }),
            pattern.to_grid(10, 10)
        );
    }
}
