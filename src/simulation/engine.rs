//! High-level runtime engine settings
//!
//! Selects the gravity model (direct or Barnes–Hut) and whether the
//! data-parallel stages run on the rayon pool

use serde::Deserialize;

/// Where the embarrassingly parallel stages run
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    #[default]
    #[serde(rename = "serial")]
    Serial,

    #[serde(rename = "parallel")]
    Parallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engine {
    pub barnes_hut: bool, // false = direct, true = barnes-hut
    pub execution: Execution, // serial or rayon
}
