//! CSS color strings as stored on entities.
//!
//! Entities keep their colors as the exact strings the user (or the document)
//! supplied, so export is lossless. This module parses those strings when a
//! caller needs the channels, e.g. to split a group background into a hex
//! swatch plus an opacity.
//!
//! Accepted forms: `#RGB`, `#RRGGBB`, `#RRGGBBAA`, `rgb(r, g, b)` and
//! `rgba(r, g, b, a)`.

use winnow::combinator::alt;
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::take_while;

/// An sRGB color with straight alpha in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RRGGBB`, `#RRGGBBAA`.
    /// The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let pair = |i: usize| -> Option<u8> { Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) };

        match bytes.len() {
            3 => Some(Self::rgba(
                hex_val(bytes[0])? * 17,
                hex_val(bytes[1])? * 17,
                hex_val(bytes[2])? * 17,
                1.0,
            )),
            6 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, 1.0)),
            8 => Some(Self::rgba(
                pair(0)?,
                pair(2)?,
                pair(4)?,
                pair(6)? as f32 / 255.0,
            )),
            _ => None,
        }
    }

    /// Parse any accepted CSS form. Surrounding whitespace is ignored.
    pub fn parse(s: &str) -> Option<Self> {
        let mut input = s.trim();
        let color = parse_css_color(&mut input).ok()?;
        input.trim().is_empty().then_some(color)
    }

    /// `#rrggbb`, alpha dropped. Matches what a color picker input emits.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `rgba(r, g, b, a)`.
    pub fn to_css_rgba(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

// ─── Parsers ─────────────────────────────────────────────────────────────

fn parse_css_color(input: &mut &str) -> ModalResult<Color> {
    alt((parse_hex_color, parse_rgb_function)).parse_next(input)
}

fn parse_hex_color(input: &mut &str) -> ModalResult<Color> {
    let _ = '#'.parse_next(input)?;
    let digits: &str = take_while(3..=8, |c: char| c.is_ascii_hexdigit()).parse_next(input)?;
    Color::from_hex(digits).ok_or_else(|| winnow::error::ErrMode::Backtrack(ContextError::new()))
}

fn parse_rgb_function(input: &mut &str) -> ModalResult<Color> {
    let _ = alt(("rgba", "rgb")).parse_next(input)?;
    skip_space(input);
    let _ = '('.parse_next(input)?;
    let r = parse_channel(input)?;
    parse_comma(input)?;
    let g = parse_channel(input)?;
    parse_comma(input)?;
    let b = parse_channel(input)?;
    skip_space(input);
    let a = if input.starts_with(',') {
        parse_comma(input)?;
        parse_number(input)?.clamp(0.0, 1.0)
    } else {
        1.0
    };
    skip_space(input);
    let _ = ')'.parse_next(input)?;
    Ok(Color::rgba(r, g, b, a))
}

fn parse_channel(input: &mut &str) -> ModalResult<u8> {
    parse_number
        .map(|v| v.round().clamp(0.0, 255.0) as u8)
        .parse_next(input)
}

fn parse_comma(input: &mut &str) -> ModalResult<()> {
    skip_space(input);
    let _ = ','.parse_next(input)?;
    skip_space(input);
    Ok(())
}

/// Consume optional whitespace (concrete error type avoids inference issues).
fn skip_space(input: &mut &str) {
    use winnow::ascii::space0;
    let _: Result<&str, winnow::error::ErrMode<ContextError>> = space0.parse_next(input);
}

fn parse_number(input: &mut &str) -> ModalResult<f32> {
    skip_space(input);
    let start = *input;
    if input.starts_with('-') {
        *input = &input[1..];
    }
    let _ = take_while::<_, _, ContextError>(0.., |c: char| c.is_ascii_digit()).parse_next(input);
    if input.starts_with('.') {
        *input = &input[1..];
        let _ =
            take_while::<_, _, ContextError>(0.., |c: char| c.is_ascii_digit()).parse_next(input);
    }
    let matched = &start[..start.len() - input.len()];
    matched
        .parse::<f32>()
        .map_err(|_| winnow::error::ErrMode::Backtrack(ContextError::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_forms() {
        assert_eq!(Color::parse("#fff"), Some(Color::rgba(255, 255, 255, 1.0)));
        assert_eq!(Color::parse("#21262d"), Some(Color::rgba(0x21, 0x26, 0x2d, 1.0)));
        let c = Color::parse("#FF000080").unwrap();
        assert!((c.a - 128.0 / 255.0).abs() < 0.01);
    }

    #[test]
    fn rgba_function() {
        let c = Color::parse("rgba(22, 27, 34, 0.5)").unwrap();
        assert_eq!((c.r, c.g, c.b), (22, 27, 34));
        assert_eq!(c.a, 0.5);
        assert_eq!(c.to_css_rgba(), "rgba(22, 27, 34, 0.5)");
    }

    #[test]
    fn rgb_function_is_opaque() {
        let c = Color::parse("rgb(1,2,3)").unwrap();
        assert_eq!(c.a, 1.0);
        assert_eq!(c.to_hex(), "#010203");
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Color::parse("blue"), None);
        assert_eq!(Color::parse("rgba(1, 2)"), None);
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::parse("rgb(1,2,3) trailing"), None);
    }
}
