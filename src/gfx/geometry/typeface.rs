//! Typeface glyph source
//!
//! Reads the JSON typeface format (glyph outlines as compact `m`/`l`/`q`/`b`
//! command strings in font units) and lays text out into flattened 2D
//! contours ready for extrusion. Loading runs off the main thread and is
//! polled once per frame.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::thread;

use cgmath::Vector2;
use futures::channel::oneshot;
use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read typeface '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed typeface JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("glyph {glyph:?} has an invalid outline: {reason}")]
    InvalidOutline { glyph: char, reason: String },
    #[error("font loading was cancelled before completing")]
    Cancelled,
}

/// One outline drawing command, in font units
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlineCommand {
    MoveTo(Vector2<f32>),
    LineTo(Vector2<f32>),
    QuadTo {
        ctrl: Vector2<f32>,
        to: Vector2<f32>,
    },
    CubicTo {
        ctrl1: Vector2<f32>,
        ctrl2: Vector2<f32>,
        to: Vector2<f32>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Horizontal advance in font units
    pub advance: f32,
    pub commands: Vec<OutlineCommand>,
}

/// Closed polygon; the closing edge back to the first point is implicit
pub type Contour = Vec<Vector2<f32>>;

/// Flattened contours of a single laid-out glyph
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphOutline {
    pub character: char,
    pub contours: Vec<Contour>,
}

#[derive(Debug, Deserialize)]
struct RawGlyph {
    ha: f32,
    #[serde(default)]
    o: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBoundingBox {
    y_min: f32,
    y_max: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTypeface {
    glyphs: HashMap<String, RawGlyph>,
    #[serde(default)]
    family_name: Option<String>,
    resolution: f32,
    bounding_box: RawBoundingBox,
    #[serde(default)]
    underline_thickness: f32,
}

/// A parsed typeface
#[derive(Debug, Clone, PartialEq)]
pub struct Typeface {
    pub family_name: String,
    resolution: f32,
    y_min: f32,
    y_max: f32,
    underline_thickness: f32,
    glyphs: HashMap<char, Glyph>,
}

impl Typeface {
    pub fn from_json(source: &str) -> Result<Self, FontError> {
        let raw: RawTypeface = serde_json::from_str(source)?;

        let mut glyphs = HashMap::with_capacity(raw.glyphs.len());
        for (key, glyph) in raw.glyphs {
            // Keys are single characters; anything else is not addressable by text
            let mut chars = key.chars();
            let (Some(character), None) = (chars.next(), chars.next()) else {
                continue;
            };
            let commands = match glyph.o.as_deref() {
                Some(outline) => parse_outline(character, outline)?,
                None => Vec::new(),
            };
            glyphs.insert(
                character,
                Glyph {
                    advance: glyph.ha,
                    commands,
                },
            );
        }

        Ok(Self {
            family_name: raw.family_name.unwrap_or_else(|| "unnamed".to_string()),
            resolution: if raw.resolution > 0.0 { raw.resolution } else { 1000.0 },
            y_min: raw.bounding_box.y_min,
            y_max: raw.bounding_box.y_max,
            underline_thickness: raw.underline_thickness,
            glyphs,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, FontError> {
        let source = std::fs::read_to_string(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&source)
    }

    pub fn glyph(&self, character: char) -> Option<&Glyph> {
        self.glyphs.get(&character)
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Distance between baselines for text of the given size
    pub fn line_height(&self, size: f32) -> f32 {
        (self.y_max - self.y_min + self.underline_thickness) * size / self.resolution
    }

    /// Lays out `text` at `size`, flattening every curve into `curve_segments` pieces
    ///
    /// `'\n'` starts a new line below the previous one. Characters without a
    /// glyph fall back to `'?'` and are skipped when that is also missing.
    pub fn layout(&self, text: &str, size: f32, curve_segments: u32) -> Vec<GlyphOutline> {
        let scale = size / self.resolution;
        let line_height = self.line_height(size);
        let segments = curve_segments.max(1);

        let mut outlines = Vec::new();
        let mut pen = Vector2::new(0.0, 0.0);

        for character in text.chars() {
            if character == '\n' {
                pen.x = 0.0;
                pen.y -= line_height;
                continue;
            }

            let Some(glyph) = self.glyph(character).or_else(|| self.glyph('?')) else {
                warn!(
                    "typeface '{}' has no glyph for {character:?}",
                    self.family_name
                );
                continue;
            };

            let contours = flatten(&glyph.commands, scale, pen, segments);
            if !contours.is_empty() {
                outlines.push(GlyphOutline {
                    character,
                    contours,
                });
            }
            pen.x += glyph.advance * scale;
        }

        outlines
    }
}

fn parse_outline(glyph: char, outline: &str) -> Result<Vec<OutlineCommand>, FontError> {
    let mut tokens = outline.split_whitespace();
    let mut commands = Vec::new();

    while let Some(op) = tokens.next() {
        let command = match op {
            "m" => OutlineCommand::MoveTo(next_point(glyph, &mut tokens)?),
            "l" => OutlineCommand::LineTo(next_point(glyph, &mut tokens)?),
            // Curve commands list the end point before the control points
            "q" => {
                let to = next_point(glyph, &mut tokens)?;
                let ctrl = next_point(glyph, &mut tokens)?;
                OutlineCommand::QuadTo { ctrl, to }
            }
            "b" => {
                let to = next_point(glyph, &mut tokens)?;
                let ctrl1 = next_point(glyph, &mut tokens)?;
                let ctrl2 = next_point(glyph, &mut tokens)?;
                OutlineCommand::CubicTo { ctrl1, ctrl2, to }
            }
            other => {
                return Err(FontError::InvalidOutline {
                    glyph,
                    reason: format!("unknown command '{other}'"),
                })
            }
        };
        commands.push(command);
    }

    Ok(commands)
}

fn next_point<'a>(
    glyph: char,
    tokens: &mut impl Iterator<Item = &'a str>,
) -> Result<Vector2<f32>, FontError> {
    let mut coord = || -> Result<f32, FontError> {
        let token = tokens.next().ok_or_else(|| FontError::InvalidOutline {
            glyph,
            reason: "command is missing coordinates".to_string(),
        })?;
        token.parse::<f32>().map_err(|_| FontError::InvalidOutline {
            glyph,
            reason: format!("'{token}' is not a number"),
        })
    };
    let x = coord()?;
    let y = coord()?;
    Ok(Vector2::new(x, y))
}

fn flatten(
    commands: &[OutlineCommand],
    scale: f32,
    origin: Vector2<f32>,
    segments: u32,
) -> Vec<Contour> {
    let place = |p: Vector2<f32>| p * scale + origin;
    let mut contours = Vec::new();
    let mut current: Contour = Vec::new();

    let close = |current: &mut Contour, contours: &mut Vec<Contour>| {
        if current.len() > 1 && current.first() == current.last() {
            current.pop();
        }
        if current.len() >= 3 {
            contours.push(std::mem::take(current));
        } else {
            current.clear();
        }
    };

    for command in commands {
        match *command {
            OutlineCommand::MoveTo(p) => {
                close(&mut current, &mut contours);
                current.push(place(p));
            }
            OutlineCommand::LineTo(p) => {
                push_point(&mut current, place(p));
            }
            OutlineCommand::QuadTo { ctrl, to } => {
                let Some(&start) = current.last() else { continue };
                let (c, end) = (place(ctrl), place(to));
                for k in 1..=segments {
                    let t = k as f32 / segments as f32;
                    let mt = 1.0 - t;
                    push_point(&mut current, start * (mt * mt) + c * (2.0 * mt * t) + end * (t * t));
                }
            }
            OutlineCommand::CubicTo { ctrl1, ctrl2, to } => {
                let Some(&start) = current.last() else { continue };
                let (c1, c2, end) = (place(ctrl1), place(ctrl2), place(to));
                for k in 1..=segments {
                    let t = k as f32 / segments as f32;
                    let mt = 1.0 - t;
                    push_point(
                        &mut current,
                        start * (mt * mt * mt)
                            + c1 * (3.0 * mt * mt * t)
                            + c2 * (3.0 * mt * t * t)
                            + end * (t * t * t),
                    );
                }
            }
        }
    }
    close(&mut current, &mut contours);

    contours
}

fn push_point(contour: &mut Contour, point: Vector2<f32>) {
    if contour.last() != Some(&point) {
        contour.push(point);
    }
}

/// Starts typeface loads on a background thread
pub struct FontLoader;

impl FontLoader {
    /// Begins loading `path`; the result is retrieved with [`PendingFont::poll`]
    pub fn load(path: impl Into<PathBuf>) -> PendingFont {
        let path = path.into();
        let (sender, receiver) = oneshot::channel();

        let spawned = thread::Builder::new()
            .name("font-loader".to_string())
            .spawn(move || {
                let result = Typeface::from_path(&path);
                if let Ok(font) = &result {
                    info!(
                        "Loaded typeface '{}' ({} glyphs) from {}",
                        font.family_name,
                        font.glyph_count(),
                        path.display()
                    );
                }
                // The receiver may already be gone if the app shut down
                let _ = sender.send(result);
            });

        match spawned {
            Ok(_) => PendingFont {
                state: PendingState::Waiting(receiver),
            },
            Err(source) => PendingFont::ready(Err(FontError::Io {
                path: PathBuf::from("<font-loader thread>"),
                source,
            })),
        }
    }
}

enum PendingState {
    Waiting(oneshot::Receiver<Result<Typeface, FontError>>),
    Ready(Result<Typeface, FontError>),
    Delivered,
}

/// Handle to an in-flight typeface load; yields its result exactly once
pub struct PendingFont {
    state: PendingState,
}

impl PendingFont {
    /// A handle that is already resolved
    pub fn ready(result: Result<Typeface, FontError>) -> Self {
        Self {
            state: PendingState::Ready(result),
        }
    }

    /// Returns the load result the first time it is available, `None` otherwise
    pub fn poll(&mut self) -> Option<Result<Typeface, FontError>> {
        match std::mem::replace(&mut self.state, PendingState::Delivered) {
            PendingState::Waiting(mut receiver) => match receiver.try_recv() {
                Ok(Some(result)) => Some(result),
                Ok(None) => {
                    self.state = PendingState::Waiting(receiver);
                    None
                }
                Err(oneshot::Canceled) => Some(Err(FontError::Cancelled)),
            },
            PendingState::Ready(result) => Some(result),
            PendingState::Delivered => None,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self.state, PendingState::Delivered)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    /// Square "A", "O" with a square hole, a curved "C", and an outline-less space
    pub(crate) const FIXTURE: &str = r#"{
        "familyName": "Fixture",
        "resolution": 1000,
        "underlineThickness": 50,
        "boundingBox": { "yMin": -200, "yMax": 950, "xMin": 0, "xMax": 1000 },
        "glyphs": {
            "A": { "ha": 800, "x_min": 0, "x_max": 700, "o": "m 0 0 l 700 0 l 700 700 l 0 700 l 0 0 " },
            "O": { "ha": 800, "x_min": 0, "x_max": 700, "o": "m 0 0 l 0 700 l 700 700 l 700 0 l 0 0 m 200 200 l 500 200 l 500 500 l 200 500 l 200 200 " },
            "C": { "ha": 700, "x_min": 0, "x_max": 600, "o": "m 0 0 l 600 0 l 600 150 q 150 350 150 150 q 600 550 150 550 l 600 700 l 0 700 " },
            "?": { "ha": 500, "x_min": 0, "x_max": 400, "o": "m 0 0 l 400 0 l 200 400 " },
            " ": { "ha": 300, "x_min": 0, "x_max": 0 }
        }
    }"#;

    pub(crate) fn fixture() -> Typeface {
        Typeface::from_json(FIXTURE).unwrap()
    }

    #[test]
    fn parses_glyphs_and_metrics() {
        let font = fixture();
        assert_eq!(font.family_name, "Fixture");
        assert_eq!(font.glyph_count(), 5);
        assert!(font.glyph(' ').unwrap().commands.is_empty());
        assert!((font.line_height(1.0) - 1.2).abs() < 1e-6);
    }

    #[test]
    fn curve_commands_put_end_point_first() {
        let font = fixture();
        let curve = font
            .glyph('C')
            .unwrap()
            .commands
            .iter()
            .find_map(|c| match c {
                OutlineCommand::QuadTo { ctrl, to } => Some((*ctrl, *to)),
                _ => None,
            })
            .unwrap();
        assert_eq!(curve.1, Vector2::new(150.0, 350.0));
        assert_eq!(curve.0, Vector2::new(150.0, 150.0));
    }

    #[test]
    fn layout_advances_and_wraps_lines() {
        let font = fixture();
        let outlines = font.layout("A A\nA", 1.0, 4);
        assert_eq!(outlines.len(), 3);

        let min_x = |o: &GlyphOutline| o.contours[0].iter().map(|p| p.x).fold(f32::MAX, f32::min);
        let min_y = |o: &GlyphOutline| o.contours[0].iter().map(|p| p.y).fold(f32::MAX, f32::min);

        assert!((min_x(&outlines[1]) - 1.1).abs() < 1e-5); // 0.8 + space 0.3
        assert!((min_x(&outlines[2]) - 0.0).abs() < 1e-5);
        assert!((min_y(&outlines[2]) + 1.2).abs() < 1e-5);
    }

    #[test]
    fn closing_point_is_dropped_and_holes_kept() {
        let font = fixture();
        let outlines = font.layout("O", 1.0, 1);
        assert_eq!(outlines[0].contours.len(), 2);
        assert_eq!(outlines[0].contours[0].len(), 4);
        assert_eq!(outlines[0].contours[1].len(), 4);
    }

    #[test]
    fn curves_flatten_into_requested_segments() {
        let font = fixture();
        let coarse = font.layout("C", 1.0, 1)[0].contours[0].len();
        let fine = font.layout("C", 1.0, 8)[0].contours[0].len();
        assert_eq!(fine - coarse, 2 * 7);
    }

    #[test]
    fn missing_glyphs_fall_back_to_question_mark() {
        let font = fixture();
        let outlines = font.layout("Z", 1.0, 1);
        assert_eq!(outlines.len(), 1);
        assert_eq!(outlines[0].character, 'Z');
        assert_eq!(outlines[0].contours[0].len(), 3);
    }

    #[test]
    fn rejects_unknown_outline_commands() {
        let json = FIXTURE.replace("m 0 0 l 400 0", "m 0 0 z 400 0");
        assert!(matches!(
            Typeface::from_json(&json),
            Err(FontError::InvalidOutline { glyph: '?', .. })
        ));
    }

    #[test]
    fn loader_delivers_exactly_once() {
        let dir = std::env::temp_dir().join(format!("typescape-font-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("fixture.typeface.json");
        std::fs::write(&path, FIXTURE).unwrap();

        let mut pending = FontLoader::load(&path);
        let deadline = Instant::now() + Duration::from_secs(5);
        let result = loop {
            if let Some(result) = pending.poll() {
                break result;
            }
            assert!(Instant::now() < deadline, "font load timed out");
            std::thread::sleep(Duration::from_millis(5));
        };

        assert_eq!(result.unwrap().family_name, "Fixture");
        assert!(pending.is_delivered());
        assert!(pending.poll().is_none());
    }

    #[test]
    fn loader_reports_missing_files() {
        let mut pending = FontLoader::load("/nonexistent/typeface.json");
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(result) = pending.poll() {
                assert!(matches!(result, Err(FontError::Io { .. })));
                break;
            }
            assert!(Instant::now() < deadline, "font load timed out");
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}
