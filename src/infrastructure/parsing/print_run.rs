//! Serial-numbered print run extractor (`25/99`, `/25`, `1/1`)

use super::{FieldExtractor, FieldInput, Located};

const MAX_DENOMINATOR: u32 = 99_999;

#[derive(Debug, Clone, Copy, Default)]
pub struct PrintRunExtractor;

fn looks_like_year(digits: &str) -> bool {
    digits.len() == 4 && digits.parse::<u16>().is_ok_and(|y| (1900..=2100).contains(&y))
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

impl PrintRunExtractor {
    /// Canonical print run of a raw token, if it is one
    pub fn parse(raw: &str) -> Option<String> {
        let trimmed = raw
            .trim_end_matches(['.', ',', ')', ']'])
            .trim_start_matches(['(', '[', '#']);
        let (numerator, denominator) = trimmed.split_once('/')?;
        if !all_digits(denominator) || denominator.len() > 5 {
            return None;
        }
        let d: u32 = denominator.parse().ok()?;
        if d == 0 || d > MAX_DENOMINATOR {
            return None;
        }

        if numerator.is_empty() {
            // a bare `/2021` is a year fragment, not a print run
            return (!looks_like_year(denominator)).then(|| format!("/{d}"));
        }
        if !all_digits(numerator) || numerator.len() > 5 {
            return None;
        }
        // seasons such as 2021/22 or 2021/2022
        if looks_like_year(numerator) && (denominator.len() == 2 || looks_like_year(denominator)) {
            return None;
        }
        let n: u32 = numerator.parse().ok()?;
        (n >= 1 && n <= d).then(|| format!("{n}/{d}"))
    }
}

impl FieldExtractor for PrintRunExtractor {
    type Output = Located<String>;

    fn extract(&self, input: &FieldInput<'_>) -> Option<Located<String>> {
        input
            .tokens
            .iter()
            .filter(|t| t.raw.contains('/'))
            .find_map(|t| {
                let run = Self::parse(t.raw)?;
                // `start` points at the trimmed core; widen to the slash
                let leading = t.raw.find(t.core).unwrap_or(0);
                let raw_start = t.start - leading;
                let skip = t.raw.find(|c: char| c.is_ascii_digit() || c == '/').unwrap_or(0);
                let end = raw_start + t.raw.trim_end_matches(|c: char| !c.is_ascii_digit()).len();
                Some(Located::new(run, raw_start + skip, end))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/25", Some("/25"))]
    #[case("#/25", Some("/25"))]
    #[case("12/99", Some("12/99"))]
    #[case("01/10", Some("1/10"))]
    #[case("1/1", Some("1/1"))]
    #[case("(5/5)", Some("5/5"))]
    #[case("100/99", None)]
    #[case("0/10", None)]
    #[case("/0", None)]
    #[case("/2021", None)]
    #[case("2021/22", None)]
    #[case("2021/2022", None)]
    #[case("a/b", None)]
    #[case("12/ab", None)]
    fn test_parse(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(PrintRunExtractor::parse(raw).as_deref(), expected);
    }

    #[test]
    fn test_extract_first_print_run_with_span() {
        use crate::infrastructure::parsing::test_support::{KNOWLEDGE, Tagged};

        let tagged = Tagged::new("2021 Topps Chrome Tobin Heath /25 #112", Some(2021));
        let tokens = tagged.tokens();
        let input = FieldInput::new(&tagged.text, &tokens, &tagged.tags, &KNOWLEDGE);
        let run = PrintRunExtractor.extract(&input).unwrap();
        assert_eq!(run.value, "/25");
        assert_eq!(&tagged.text[run.start..run.end], "/25");
    }
}
