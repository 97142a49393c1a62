//! Conventional column names the tests and graph recipes read

pub const GROUP: &str = "group";
pub const VALUE: &str = "value";
pub const X: &str = "x";
pub const Y: &str = "y";
pub const FACTOR1: &str = "factor1";
pub const FACTOR2: &str = "factor2";
pub const SUBJECT: &str = "subject";
pub const TIME: &str = "time";
pub const COVARIATE: &str = "covariate";

/// Column name of single-cell result tables
pub const RESULT: &str = "結果";
