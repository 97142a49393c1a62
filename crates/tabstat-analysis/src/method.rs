//! The advanced-analysis catalogue

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shown when a requested method has no implementation
pub const ANALYSIS_NOT_IMPLEMENTED: &str = "選択された分析手法は実装されていません。";

/// Implemented analysis methods, in menu order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisMethod {
    Pca,
    KMeans,
    LinearRegression,
    LogisticRegression,
    Svm,
    RandomForest,
    NaiveBayes,
}

impl AnalysisMethod {
    pub const ALL: [AnalysisMethod; 7] = [
        Self::Pca,
        Self::KMeans,
        Self::LinearRegression,
        Self::LogisticRegression,
        Self::Svm,
        Self::RandomForest,
        Self::NaiveBayes,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pca => "主成分分析 (PCA)",
            Self::KMeans => "K-means クラスタリング",
            Self::LinearRegression => "線形回帰",
            Self::LogisticRegression => "ロジスティック回帰",
            Self::Svm => "サポートベクターマシン (SVM)",
            Self::RandomForest => "ランダムフォレスト",
            Self::NaiveBayes => "ナイーブベイズ",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Pca => "pca",
            Self::KMeans => "kmeans",
            Self::LinearRegression => "linear-regression",
            Self::LogisticRegression => "logistic-regression",
            Self::Svm => "svm",
            Self::RandomForest => "random-forest",
            Self::NaiveBayes => "naive-bayes",
        }
    }

    /// Look a method up by label or slug
    pub fn from_identifier(input: &str) -> Option<Self> {
        let needle = input.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.label() == needle || m.slug().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for AnalysisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
