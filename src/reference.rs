//! Parsing of `C:V` passage locations given on the command line.

use anyhow::{bail, Context, Result};

use crate::extract::PassageRange;

/// Parses `"<chapter>:<verse>"`, e.g. `"1:31"`.
pub fn parse_location(s: &str) -> Result<(u32, u32)> {
    let (chapter, verse) = s
        .trim()
        .split_once(':')
        .with_context(|| format!("invalid location '{}': expected CHAPTER:VERSE", s))?;

    let chapter: u32 = chapter
        .trim()
        .parse()
        .with_context(|| format!("invalid chapter in '{}'", s))?;
    let verse: u32 = verse
        .trim()
        .parse()
        .with_context(|| format!("invalid verse in '{}'", s))?;

    if chapter == 0 || verse == 0 {
        bail!("invalid location '{}': chapter and verse start at 1", s);
    }

    Ok((chapter, verse))
}

/// Builds a range from a start location and an optional end location.
pub fn parse_range(start: &str, end: Option<&str>) -> Result<PassageRange> {
    let (start_chapter, start_verse) = parse_location(start)?;
    let end = end.map(parse_location).transpose()?;

    Ok(PassageRange::new(
        start_chapter,
        start_verse,
        end.map(|(c, _)| c),
        end.map(|(_, v)| v),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location() {
        assert_eq!(parse_location("1:31").unwrap(), (1, 31));
        assert_eq!(parse_location(" 12 : 4 ").unwrap(), (12, 4));
    }

    #[test]
    fn test_parse_location_rejects_bad_input() {
        assert!(parse_location("31").is_err());
        assert!(parse_location("a:1").is_err());
        assert!(parse_location("1:").is_err());
        assert!(parse_location("0:1").is_err());
        assert!(parse_location("-1:2").is_err());
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(
            parse_range("1:31", Some("2:2")).unwrap(),
            PassageRange::new(1, 31, Some(2), Some(2))
        );
        assert_eq!(
            parse_range("3:16", None).unwrap(),
            PassageRange::new(3, 16, None, None)
        );
    }
}
