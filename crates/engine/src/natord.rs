use std::cmp::Ordering;

/// Compare two display labels the way humans read them: embedded digit
/// runs compare by numeric value, everything else compares
/// case-insensitively. "Season 2" sorts before "Season 10", and
/// "Season 02" ties with "Season 2".
///
/// The order is total, so it can drive `sort_by` directly; the standard
/// sort is stable, so labels that compare equal keep their relative order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ta = Tokens::new(a);
    let mut tb = Tokens::new(b);
    loop {
        match (ta.next(), tb.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match cmp_token(x, y) {
                Ordering::Equal => {}
                ord => return ord,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Num(&'a str),
    Text(&'a str),
}

/// Splits a label into alternating digit and non-digit runs.
struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Tokens<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let first = self.rest.chars().next()?;
        let is_digit = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != is_digit)
            .unwrap_or(self.rest.len());
        let (run, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if is_digit {
            Token::Num(run)
        } else {
            Token::Text(run)
        })
    }
}

fn cmp_token(a: Token<'_>, b: Token<'_>) -> Ordering {
    match (a, b) {
        (Token::Num(x), Token::Num(y)) => cmp_numeric(x, y),
        (Token::Text(x), Token::Text(y)) => {
            x.chars().map(lower).cmp(y.chars().map(lower))
        }
        // A digit run sorts before a text run at the same position.
        (Token::Num(_), Token::Text(_)) => Ordering::Less,
        (Token::Text(_), Token::Num(_)) => Ordering::Greater,
    }
}

/// Compare two digit runs by value without parsing, so arbitrarily long
/// runs cannot overflow. Leading zeros are ignored.
fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn lower(c: char) -> char {
    c.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut labels: Vec<&str>) -> Vec<&str> {
        labels.sort_by(|a, b| natural_cmp(a, b));
        labels
    }

    #[test]
    fn seasons_sort_numerically() {
        assert_eq!(
            sorted(vec!["Season 10", "Season 2", "Season 1"]),
            vec!["Season 1", "Season 2", "Season 10"]
        );
    }

    #[test]
    fn leading_zeros_compare_equal() {
        assert_eq!(natural_cmp("Season 02", "Season 2"), Ordering::Equal);
        assert_eq!(natural_cmp("Season 02", "Season 3"), Ordering::Less);
    }

    #[test]
    fn empty_sorts_first() {
        assert_eq!(natural_cmp("", "a"), Ordering::Less);
        assert_eq!(natural_cmp("", ""), Ordering::Equal);
        assert_eq!(natural_cmp("0", ""), Ordering::Greater);
    }

    #[test]
    fn case_insensitive_text() {
        assert_eq!(natural_cmp("season 5", "Season 5"), Ordering::Equal);
        assert_eq!(natural_cmp("alpha", "Beta"), Ordering::Less);
    }

    #[test]
    fn digits_sort_before_text() {
        assert_eq!(sorted(vec!["extras", "2 extras"]), vec!["2 extras", "extras"]);
    }

    #[test]
    fn mixed_file_names() {
        assert_eq!(
            sorted(vec![
                "ep12.mkv",
                "ep2.mkv",
                "ep1.mkv",
                "Specials",
                "ep10.mkv",
            ]),
            vec!["ep1.mkv", "ep2.mkv", "ep10.mkv", "ep12.mkv", "Specials"]
        );
    }

    #[test]
    fn prefix_sorts_first() {
        assert_eq!(natural_cmp("Season 1", "Season 1 Extras"), Ordering::Less);
    }

    #[test]
    fn long_digit_runs_do_not_overflow() {
        let big = "99999999999999999999999999999999999999";
        let bigger = "100000000000000000000000000000000000000";
        assert_eq!(natural_cmp(big, bigger), Ordering::Less);
    }

    #[test]
    fn transitive_on_mixed_labels() {
        let labels = ["10", "9", "a", "A", "", "Season 010", "Season 9"];
        for x in &labels {
            for y in &labels {
                // Antisymmetry
                assert_eq!(natural_cmp(x, y), natural_cmp(y, x).reverse());
                for z in &labels {
                    if natural_cmp(x, y) != Ordering::Greater
                        && natural_cmp(y, z) != Ordering::Greater
                    {
                        assert_ne!(natural_cmp(x, z), Ordering::Greater);
                    }
                }
            }
        }
    }
}
