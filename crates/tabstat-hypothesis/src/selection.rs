//! The closed catalogues of tests and post-hoc procedures
//!
//! User-facing identifiers are the Japanese menu labels; each variant also
//! has an ASCII slug for command lines. A label outside the catalogue
//! parses to the `Unsupported` selection instead of failing, so callers can
//! still dispatch it and receive the fixed fallback summary.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Test family, as grouped in the selection menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestFamily {
    Parametric,
    NonParametric,
}

impl TestFamily {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Parametric => "パラメトリック検定",
            Self::NonParametric => "ノンパラメトリック検定",
        }
    }
}

/// Every implemented statistical test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatTest {
    IndependentT,
    PairedT,
    OneWayAnova,
    TwoWayAnova,
    RepeatedMeasuresAnova,
    Ancova,
    MannWhitneyU,
    WilcoxonSignedRank,
    KruskalWallis,
    Friedman,
    Spearman,
}

impl StatTest {
    /// Menu order
    pub const ALL: [StatTest; 11] = [
        Self::IndependentT,
        Self::PairedT,
        Self::OneWayAnova,
        Self::TwoWayAnova,
        Self::RepeatedMeasuresAnova,
        Self::Ancova,
        Self::MannWhitneyU,
        Self::WilcoxonSignedRank,
        Self::KruskalWallis,
        Self::Friedman,
        Self::Spearman,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::IndependentT => "対応のないt検定",
            Self::PairedT => "対応のあるt検定",
            Self::OneWayAnova => "一元配置分散分析（ANOVA）",
            Self::TwoWayAnova => "二元配置分散分析",
            Self::RepeatedMeasuresAnova => "反復測定分散分析",
            Self::Ancova => "共分散分析（ANCOVA）",
            Self::MannWhitneyU => "Mann-Whitney U検定",
            Self::WilcoxonSignedRank => "Wilcoxon符号順位検定",
            Self::KruskalWallis => "Kruskal-Wallis検定",
            Self::Friedman => "Friedman検定",
            Self::Spearman => "Spearman順位相関係数",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::IndependentT => "t-independent",
            Self::PairedT => "t-paired",
            Self::OneWayAnova => "anova",
            Self::TwoWayAnova => "two-way-anova",
            Self::RepeatedMeasuresAnova => "rm-anova",
            Self::Ancova => "ancova",
            Self::MannWhitneyU => "mann-whitney",
            Self::WilcoxonSignedRank => "wilcoxon",
            Self::KruskalWallis => "kruskal",
            Self::Friedman => "friedman",
            Self::Spearman => "spearman",
        }
    }

    pub fn family(&self) -> TestFamily {
        match self {
            Self::IndependentT
            | Self::PairedT
            | Self::OneWayAnova
            | Self::TwoWayAnova
            | Self::RepeatedMeasuresAnova
            | Self::Ancova => TestFamily::Parametric,
            Self::MannWhitneyU
            | Self::WilcoxonSignedRank
            | Self::KruskalWallis
            | Self::Friedman
            | Self::Spearman => TestFamily::NonParametric,
        }
    }

    /// Omnibus group comparisons that can be followed by a post-hoc test
    pub fn supports_post_hoc(&self) -> bool {
        matches!(self, Self::OneWayAnova | Self::KruskalWallis | Self::Friedman)
    }

    /// Look a test up by menu label or slug
    pub fn from_identifier(input: &str) -> Option<Self> {
        let needle = input.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.label() == needle || t.slug().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for StatTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A test selection as received from the user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum TestSelection {
    Known(StatTest),
    /// Any identifier outside the catalogue
    Unsupported(String),
}

impl TestSelection {
    pub fn label(&self) -> &str {
        match self {
            Self::Known(test) => test.label(),
            Self::Unsupported(raw) => raw,
        }
    }

    pub fn test(&self) -> Option<StatTest> {
        match self {
            Self::Known(test) => Some(*test),
            Self::Unsupported(_) => None,
        }
    }

    pub fn supports_post_hoc(&self) -> bool {
        self.test().is_some_and(|t| t.supports_post_hoc())
    }
}

impl From<StatTest> for TestSelection {
    fn from(test: StatTest) -> Self {
        Self::Known(test)
    }
}

impl FromStr for TestSelection {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(StatTest::from_identifier(s).map_or_else(|| Self::Unsupported(s.to_string()), Self::Known))
    }
}

impl From<String> for TestSelection {
    fn from(s: String) -> Self {
        match StatTest::from_identifier(&s) {
            Some(test) => Self::Known(test),
            None => Self::Unsupported(s),
        }
    }
}

impl From<TestSelection> for String {
    fn from(selection: TestSelection) -> Self {
        selection.label().to_string()
    }
}

impl fmt::Display for TestSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Every implemented post-hoc procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostHoc {
    TukeyHsd,
    /// Reported with the Tukey HSD table
    Dunnett,
    Bonferroni,
    Holm,
    Scheffe,
    GamesHowell,
}

impl PostHoc {
    pub const ALL: [PostHoc; 6] = [
        Self::TukeyHsd,
        Self::Dunnett,
        Self::Bonferroni,
        Self::Holm,
        Self::Scheffe,
        Self::GamesHowell,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::TukeyHsd => "Tukey's HSD検定",
            Self::Dunnett => "Dunnett検定",
            Self::Bonferroni => "Bonferroni法",
            Self::Holm => "Holm法",
            Self::Scheffe => "Scheffe法",
            Self::GamesHowell => "Games-Howell法",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::TukeyHsd => "tukey",
            Self::Dunnett => "dunnett",
            Self::Bonferroni => "bonferroni",
            Self::Holm => "holm",
            Self::Scheffe => "scheffe",
            Self::GamesHowell => "games-howell",
        }
    }

    pub fn from_identifier(input: &str) -> Option<Self> {
        let needle = input.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.label() == needle || p.slug().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for PostHoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A post-hoc selection as received from the user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum PostHocSelection {
    Known(PostHoc),
    Unsupported(String),
}

impl PostHocSelection {
    pub fn label(&self) -> &str {
        match self {
            Self::Known(p) => p.label(),
            Self::Unsupported(raw) => raw,
        }
    }
}

impl From<PostHoc> for PostHocSelection {
    fn from(p: PostHoc) -> Self {
        Self::Known(p)
    }
}

impl FromStr for PostHocSelection {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl From<String> for PostHocSelection {
    fn from(s: String) -> Self {
        match PostHoc::from_identifier(&s) {
            Some(p) => Self::Known(p),
            None => Self::Unsupported(s),
        }
    }
}

impl From<PostHocSelection> for String {
    fn from(selection: PostHocSelection) -> Self {
        selection.label().to_string()
    }
}

impl fmt::Display for PostHocSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for test in StatTest::ALL {
            let parsed: TestSelection = test.label().parse().unwrap();
            assert_eq!(parsed, TestSelection::Known(test));
            assert_eq!(StatTest::from_identifier(test.slug()), Some(test));
        }
        for p in PostHoc::ALL {
            let parsed: PostHocSelection = p.label().parse().unwrap();
            assert_eq!(parsed, PostHocSelection::Known(p));
        }
    }

    #[test]
    fn test_unknown_label_is_unsupported() {
        let parsed: TestSelection = "カイ二乗検定".parse().unwrap();
        assert_eq!(parsed, TestSelection::Unsupported("カイ二乗検定".to_string()));
        assert_eq!(parsed.label(), "カイ二乗検定");
        assert!(!parsed.supports_post_hoc());
    }

    #[test]
    fn test_post_hoc_support() {
        assert!(StatTest::OneWayAnova.supports_post_hoc());
        assert!(StatTest::KruskalWallis.supports_post_hoc());
        assert!(!StatTest::IndependentT.supports_post_hoc());
        assert_eq!(StatTest::Friedman.family(), TestFamily::NonParametric);
    }
}
