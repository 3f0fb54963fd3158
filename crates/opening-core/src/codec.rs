//! Annotation tags embedded in node comments.
//!
//! A comment carries up to three independent tag groups:
//!
//! - opening: `[open: B90, Sicilian Defense: Najdorf Variation]`
//! - statistics: `[freq: 100, 70.0][wdb: 55, 30, 15][wdb%: 55.0, 30.0, 15.0]`
//! - evaluation: `[%eval 0.25,20]` or `[%eval #3,20]`
//!
//! Any subset may be present and anything else in the comment is free text.
//! Parsing never fails: missing or malformed groups decode as absent.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use shakmaty::Color;

/// Pawn value reported for forced mates when an evaluation is read as a number.
pub const MATE_PAWNS: f64 = 100.0;

static OPENING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[open: (.*?), (.*?)\]").expect("opening tag pattern"));

static STATISTICS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[freq: (\d+), (\d+(?:\.\d+)?)\]\s*\[wdb: (\d+), (\d+), (\d+)\]\s*\[wdb%: (\d+(?:\.\d+)?), (\d+(?:\.\d+)?), (\d+(?:\.\d+)?)\]",
    )
    .expect("statistics tag pattern")
});

static FREQ_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[freq: (\d+), \d+(?:\.\d+)?\]").expect("freq tag pattern"));

static EVAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[%eval\s+(#[+-]?\d+|[+-]?\d*\.?\d+)(?:,(\d+))?\]").expect("eval tag pattern")
});

static ANY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(?:open: |freq: |wdb: |wdb%: |%eval )[^\]]*\]").expect("tag pattern")
});

/// ECO classification of a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opening {
    pub eco: String,
    pub name: String,
}

/// Game counts for a position and its share of the parent's games.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statistics {
    pub total_occurrence: u64,
    /// Percentage of the parent's games that reached this position.
    pub frequency: f64,
    pub white_wins: u64,
    pub draws: u64,
    pub black_wins: u64,
    pub white_percentage: f64,
    pub draw_percentage: f64,
    pub black_percentage: f64,
}

impl Statistics {
    /// Totals and outcome percentages from raw counts. A zero total yields
    /// zero percentages.
    pub fn from_counts(white_wins: u64, draws: u64, black_wins: u64, frequency: f64) -> Self {
        let total_occurrence = white_wins + draws + black_wins;
        Self {
            total_occurrence,
            frequency,
            white_wins,
            draws,
            black_wins,
            white_percentage: percentage(white_wins, total_occurrence),
            draw_percentage: percentage(draws, total_occurrence),
            black_percentage: percentage(black_wins, total_occurrence),
        }
    }
}

/// Engine score from White's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Cp(i32),
    /// Mate in `n`, positive when White mates.
    Mate(i32),
    /// The given side is already checkmated. Written as `#-0` (White mated)
    /// or `#+0` (Black mated).
    Mated(Color),
}

impl Score {
    pub fn pawns(&self) -> f64 {
        match *self {
            Score::Cp(cp) => cp as f64 / 100.0,
            Score::Mate(n) if n >= 0 => MATE_PAWNS,
            Score::Mate(_) => -MATE_PAWNS,
            Score::Mated(Color::White) => -MATE_PAWNS,
            Score::Mated(Color::Black) => MATE_PAWNS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub score: Score,
    pub depth: u32,
}

/// The tag groups found in one comment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Annotation {
    pub opening: Option<Opening>,
    pub statistics: Option<Statistics>,
    pub evaluation: Option<Evaluation>,
}

impl Annotation {
    pub fn parse(comment: &str) -> Self {
        Self {
            opening: parse_opening(comment),
            statistics: parse_statistics(comment),
            evaluation: parse_evaluation(comment),
        }
    }

    /// Encode the present groups in `open`, `freq`/`wdb`/`wdb%`, `%eval` order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(opening) = &self.opening {
            out.push_str(&format!("[open: {}, {}]", opening.eco, opening.name));
        }
        if let Some(stats) = &self.statistics {
            out.push_str(&format!(
                "[freq: {}, {}][wdb: {}, {}, {}][wdb%: {}, {}, {}]",
                stats.total_occurrence,
                format_number(stats.frequency),
                stats.white_wins,
                stats.draws,
                stats.black_wins,
                format_number(stats.white_percentage),
                format_number(stats.draw_percentage),
                format_number(stats.black_percentage),
            ));
        }
        if let Some(eval) = &self.evaluation {
            let score = match eval.score {
                Score::Cp(cp) => format!("{:.2}", cp as f64 / 100.0),
                Score::Mate(n) => format!("#{n}"),
                Score::Mated(Color::White) => "#-0".to_string(),
                Score::Mated(Color::Black) => "#+0".to_string(),
            };
            out.push_str(&format!("[%eval {},{}]", score, eval.depth));
        }
        out
    }
}

/// Flat view of a node's annotation with defaults filled in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metadata {
    pub eco: String,
    pub opening_name: String,
    pub total_occurrence: u64,
    pub frequency: f64,
    pub white_wins: u64,
    pub draws: u64,
    pub black_wins: u64,
    pub white_percentage: f64,
    pub draw_percentage: f64,
    pub black_percentage: f64,
    /// Pawns from White's point of view; `None` when no evaluation is known.
    pub eval: Option<f64>,
    pub eval_depth: u32,
}

impl From<&Annotation> for Metadata {
    fn from(annotation: &Annotation) -> Self {
        let mut meta = Metadata::default();
        if let Some(opening) = &annotation.opening {
            meta.eco = opening.eco.clone();
            meta.opening_name = opening.name.clone();
        }
        if let Some(stats) = &annotation.statistics {
            meta.total_occurrence = stats.total_occurrence;
            meta.frequency = stats.frequency;
            meta.white_wins = stats.white_wins;
            meta.draws = stats.draws;
            meta.black_wins = stats.black_wins;
            meta.white_percentage = stats.white_percentage;
            meta.draw_percentage = stats.draw_percentage;
            meta.black_percentage = stats.black_percentage;
        }
        if let Some(eval) = &annotation.evaluation {
            meta.eval = Some(eval.score.pawns());
            meta.eval_depth = eval.depth;
        }
        meta
    }
}

fn parse_opening(comment: &str) -> Option<Opening> {
    let caps = OPENING_RE.captures(comment)?;
    Some(Opening {
        eco: caps[1].to_string(),
        name: caps[2].to_string(),
    })
}

fn parse_statistics(comment: &str) -> Option<Statistics> {
    let caps = STATISTICS_RE.captures(comment)?;
    Some(Statistics {
        total_occurrence: caps[1].parse().ok()?,
        frequency: caps[2].parse().ok()?,
        white_wins: caps[3].parse().ok()?,
        draws: caps[4].parse().ok()?,
        black_wins: caps[5].parse().ok()?,
        white_percentage: caps[6].parse().ok()?,
        draw_percentage: caps[7].parse().ok()?,
        black_percentage: caps[8].parse().ok()?,
    })
}

fn parse_evaluation(comment: &str) -> Option<Evaluation> {
    let caps = EVAL_RE.captures(comment)?;
    let raw = &caps[1];
    let score = match raw.strip_prefix('#') {
        Some("-0") => Score::Mated(Color::White),
        Some("+0") => Score::Mated(Color::Black),
        Some(mate) => Score::Mate(mate.trim_start_matches('+').parse().ok()?),
        None => {
            let pawns: f64 = raw.parse().ok()?;
            Score::Cp((pawns * 100.0).round() as i32)
        }
    };
    let depth = match caps.get(2) {
        Some(d) => d.as_str().parse().ok()?,
        None => 0,
    };
    Some(Evaluation { score, depth })
}

/// Replace only the relative-frequency number of the first `[freq: ...]` tag.
pub fn patch_frequency(comment: &str, relative_freq: f64) -> String {
    FREQ_RE
        .replace(comment, |caps: &Captures| {
            format!("[freq: {}, {}]", &caps[1], format_number(relative_freq))
        })
        .into_owned()
}

/// Remove every recognized tag, keeping the surrounding free text.
pub fn strip_tags(comment: &str) -> String {
    let stripped = ANY_TAG_RE.replace_all(comment, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Percentage of `part` in `total`, two decimals; zero when `total` is zero.
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 / total as f64 * 100.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whole numbers keep one decimal (`70.0`), others print as-is (`45.67`).
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "[open: B20, Sicilian Defense][freq: 100, 70.0][wdb: 55, 30, 15][wdb%: 55.0, 30.0, 15.0][%eval 0.31,22]";

    #[test]
    fn test_parse_full_comment() {
        let a = Annotation::parse(FULL);
        assert_eq!(
            a.opening,
            Some(Opening {
                eco: "B20".into(),
                name: "Sicilian Defense".into()
            })
        );
        let stats = a.statistics.unwrap();
        assert_eq!(stats.total_occurrence, 100);
        assert_eq!(stats.frequency, 70.0);
        assert_eq!(stats.white_wins + stats.draws + stats.black_wins, 100);
        assert_eq!(stats.white_percentage, 55.0);
        assert_eq!(
            a.evaluation,
            Some(Evaluation {
                score: Score::Cp(31),
                depth: 22
            })
        );
    }

    #[test]
    fn test_opening_name_with_comma() {
        let a = Annotation::parse("[open: B90, Sicilian Defense: Najdorf Variation, English Attack]");
        let opening = a.opening.unwrap();
        assert_eq!(opening.eco, "B90");
        assert_eq!(opening.name, "Sicilian Defense: Najdorf Variation, English Attack");
    }

    #[test]
    fn test_empty_comment_defaults() {
        let a = Annotation::parse("");
        assert_eq!(a, Annotation::default());

        let meta = Metadata::from(&a);
        assert_eq!(meta.total_occurrence, 0);
        assert_eq!(meta.frequency, 0.0);
        assert_eq!(meta.eval, None);
        assert_eq!(meta.eval_depth, 0);
        assert!(meta.eco.is_empty());
    }

    #[test]
    fn test_missing_eval_is_unknown() {
        let meta = Metadata::from(&Annotation::parse(
            "[freq: 10, 5.5][wdb: 4, 3, 3][wdb%: 40.0, 30.0, 30.0]",
        ));
        assert_eq!(meta.total_occurrence, 10);
        assert_eq!(meta.eval, None);
        assert_eq!(meta.eval_depth, 0);
    }

    #[test]
    fn test_tolerates_surrounding_text() {
        let a = Annotation::parse("Main line! [freq: 7, 3][wdb: 3, 2, 2] [wdb%: 42.86, 28.57, 28.57] see game 12");
        let stats = a.statistics.unwrap();
        assert_eq!(stats.total_occurrence, 7);
        assert_eq!(stats.frequency, 3.0);
        assert_eq!(stats.black_percentage, 28.57);
    }

    #[test]
    fn test_partial_statistics_block_ignored() {
        let a = Annotation::parse("[freq: 7, 3][wdb: 3, 2, 2]");
        assert!(a.statistics.is_none());
    }

    #[test]
    fn test_eval_variants() {
        let neg = Annotation::parse("[%eval -1.25,18]").evaluation.unwrap();
        assert_eq!(neg.score, Score::Cp(-125));
        assert_eq!(neg.score.pawns(), -1.25);

        let mate = Annotation::parse("[%eval #-3,30]").evaluation.unwrap();
        assert_eq!(mate.score, Score::Mate(-3));
        assert_eq!(mate.score.pawns(), -MATE_PAWNS);

        let mated = Annotation::parse("[%eval #-0,0]").evaluation.unwrap();
        assert_eq!(mated.score, Score::Mated(Color::White));
        assert_eq!(mated.score.pawns(), -MATE_PAWNS);

        let no_depth = Annotation::parse("[%eval 0.17]").evaluation.unwrap();
        assert_eq!(no_depth.depth, 0);
    }

    #[test]
    fn test_render_parse_round_trip() {
        let a = Annotation {
            opening: Some(Opening {
                eco: "C50".into(),
                name: "Italian Game".into(),
            }),
            statistics: Some(Statistics::from_counts(1200, 900, 600, 33.33)),
            evaluation: Some(Evaluation {
                score: Score::Cp(-40),
                depth: 19,
            }),
        };
        assert_eq!(Annotation::parse(&a.render()), a);
    }

    #[test]
    fn test_render_format() {
        let a = Annotation {
            opening: None,
            statistics: Some(Statistics::from_counts(55, 30, 15, 100.0)),
            evaluation: Some(Evaluation {
                score: Score::Cp(25),
                depth: 20,
            }),
        };
        assert_eq!(
            a.render(),
            "[freq: 100, 100.0][wdb: 55, 30, 15][wdb%: 55.0, 30.0, 15.0][%eval 0.25,20]"
        );
    }

    #[test]
    fn test_patch_frequency_only_touches_relative_number() {
        let patched = patch_frequency(FULL, 12.5);
        assert!(patched.contains("[freq: 100, 12.5]"));
        assert!(patched.contains("[wdb: 55, 30, 15]"));
        assert!(patched.contains("[%eval 0.31,22]"));

        let from_int = patch_frequency("[freq: 40, 100]", 61.54);
        assert_eq!(from_int, "[freq: 40, 61.54]");

        assert_eq!(patch_frequency("no tags", 5.0), "no tags");
    }

    #[test]
    fn test_strip_tags_keeps_free_text() {
        assert_eq!(strip_tags(&format!("Sharp line {FULL} beware")), "Sharp line beware");
        assert_eq!(strip_tags(FULL), "");
    }

    #[test]
    fn test_zero_total_percentages() {
        let stats = Statistics::from_counts(0, 0, 0, 0.0);
        assert_eq!(stats.total_occurrence, 0);
        assert_eq!(stats.white_percentage, 0.0);
        assert_eq!(stats.draw_percentage, 0.0);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(70.0), "70.0");
        assert_eq!(format_number(45.67), "45.67");
        assert_eq!(format_number(round2(2.0 / 3.0 * 100.0)), "66.67");
    }

    #[test]
    fn test_checkmated_side_round_trip() {
        for side in [Color::White, Color::Black] {
            let a = Annotation {
                evaluation: Some(Evaluation {
                    score: Score::Mated(side),
                    depth: 0,
                }),
                ..Annotation::default()
            };
            let back = Annotation::parse(&a.render());
            assert_eq!(back, a);
        }
    }
}
