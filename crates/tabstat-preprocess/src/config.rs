//! Preprocessing method choices and their configuration

use std::fmt;
use std::str::FromStr;
use tabstat_core::{Error, Result};

/// Threshold used by outlier removal when none is configured
pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 3.0;

/// Shared behaviour of the enumerated method choices
pub trait MethodChoice: Sized + Copy + 'static {
    /// Every variant, in menu order
    const ALL: &'static [Self];

    /// Label shown to users and stored by the UI
    fn label(&self) -> &'static str;

    /// Short ASCII identifier for command lines
    fn slug(&self) -> &'static str;

    /// Look a variant up by label or slug
    fn parse(input: &str) -> Result<Self> {
        let needle = input.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.label() == needle || m.slug().eq_ignore_ascii_case(needle))
            .ok_or_else(|| Error::InvalidParameter(format!("unknown method '{needle}'")))
    }
}

macro_rules! method_str_impls {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                <$ty as MethodChoice>::parse(s)
            }
        }
    };
}

/// Outlier removal method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutlierMethod {
    #[default]
    None,
    /// Drop rows with any |z| >= threshold (population standard deviation)
    ZScore,
    /// Drop rows outside [Q1 - t*IQR, Q3 + t*IQR] in any numeric column
    Iqr,
}

impl MethodChoice for OutlierMethod {
    const ALL: &'static [Self] = &[Self::None, Self::ZScore, Self::Iqr];

    fn label(&self) -> &'static str {
        match self {
            Self::None => "なし",
            Self::ZScore => "Z-score",
            Self::Iqr => "IQR",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ZScore => "zscore",
            Self::Iqr => "iqr",
        }
    }
}

/// Normalization method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    #[default]
    None,
    /// (x - mean) / sample standard deviation
    Standardize,
    /// (x - min) / (max - min)
    MinMax,
}

impl MethodChoice for Normalization {
    const ALL: &'static [Self] = &[Self::None, Self::Standardize, Self::MinMax];

    fn label(&self) -> &'static str {
        match self {
            Self::None => "なし",
            Self::Standardize => "標準化",
            Self::MinMax => "最小最大スケーリング",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Standardize => "standardize",
            Self::MinMax => "minmax",
        }
    }
}

/// Missing value handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingValues {
    #[default]
    None,
    /// Drop every row with a missing cell
    Drop,
    /// Fill numeric gaps with the column mean
    Mean,
    /// Fill numeric gaps with the column median
    Median,
}

impl MethodChoice for MissingValues {
    const ALL: &'static [Self] = &[Self::None, Self::Drop, Self::Mean, Self::Median];

    fn label(&self) -> &'static str {
        match self {
            Self::None => "なし",
            Self::Drop => "削除",
            Self::Mean => "平均値で補完",
            Self::Median => "中央値で補完",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Drop => "drop",
            Self::Mean => "mean",
            Self::Median => "median",
        }
    }
}

/// Categorical encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    None,
    /// Replace each text column with one 0/1 indicator column per level
    OneHot,
    /// Replace each text column with integer codes of its sorted levels
    Label,
}

impl MethodChoice for Encoding {
    const ALL: &'static [Self] = &[Self::None, Self::OneHot, Self::Label];

    fn label(&self) -> &'static str {
        match self {
            Self::None => "なし",
            Self::OneHot => "One-hot encoding",
            Self::Label => "Label encoding",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::OneHot => "onehot",
            Self::Label => "label",
        }
    }
}

/// Value transform applied to numeric columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transform {
    #[default]
    None,
    /// ln(1 + x)
    Log,
    /// sqrt(x)
    Sqrt,
}

impl MethodChoice for Transform {
    const ALL: &'static [Self] = &[Self::None, Self::Log, Self::Sqrt];

    fn label(&self) -> &'static str {
        match self {
            Self::None => "なし",
            Self::Log => "対数変換",
            Self::Sqrt => "平方根変換",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Log => "log",
            Self::Sqrt => "sqrt",
        }
    }
}

method_str_impls!(OutlierMethod);
method_str_impls!(Normalization);
method_str_impls!(MissingValues);
method_str_impls!(Encoding);
method_str_impls!(Transform);

/// The five independent preprocessing choices plus the outlier threshold
///
/// Stateless: a config is applied in full on every run and nothing about
/// earlier runs is kept.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PreprocessingConfig {
    pub outliers: OutlierMethod,
    /// Outlier threshold; [`DEFAULT_OUTLIER_THRESHOLD`] when `None`
    pub threshold: Option<f64>,
    pub normalization: Normalization,
    pub missing: MissingValues,
    pub encoding: Encoding,
    pub transform: Transform,
}

impl PreprocessingConfig {
    /// Every method set to "none"
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outliers(mut self, method: OutlierMethod) -> Self {
        self.outliers = method;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_normalization(mut self, method: Normalization) -> Self {
        self.normalization = method;
        self
    }

    pub fn with_missing(mut self, method: MissingValues) -> Self {
        self.missing = method;
        self
    }

    pub fn with_encoding(mut self, method: Encoding) -> Self {
        self.encoding = method;
        self
    }

    pub fn with_transform(mut self, method: Transform) -> Self {
        self.transform = method;
        self
    }

    /// Threshold actually used by outlier removal
    pub fn effective_threshold(&self) -> f64 {
        self.threshold.unwrap_or(DEFAULT_OUTLIER_THRESHOLD)
    }

    /// Validate parameters before running
    pub fn validate(&self) -> Result<()> {
        let t = self.effective_threshold();
        if !t.is_finite() || t <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "outlier threshold must be a positive number, got {t}"
            )));
        }
        Ok(())
    }

    /// True when every method is "none"
    pub fn is_noop(&self) -> bool {
        self.outliers == OutlierMethod::None
            && self.normalization == Normalization::None
            && self.missing == MissingValues::None
            && self.encoding == Encoding::None
            && self.transform == Transform::None
    }
}
