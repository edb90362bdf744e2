use std::fmt;
use std::time::Duration;

use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// The four request kinds a worker mixes into its traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Predict,
    Batch,
    Health,
    ModelInfo,
}

impl RequestKind {
    pub const ALL: [RequestKind; 4] = [Self::Predict, Self::Batch, Self::Health, Self::ModelInfo];

    /// Selection weight; the four weights sum to 1.
    pub fn weight(self) -> f64 {
        match self {
            Self::Predict => 0.6,
            Self::Batch => 0.2,
            Self::Health => 0.1,
            Self::ModelInfo => 0.1,
        }
    }

    pub fn timeout(self) -> Duration {
        match self {
            Self::Predict => Duration::from_secs(10),
            Self::Batch => Duration::from_secs(15),
            Self::Health | Self::ModelInfo => Duration::from_secs(5),
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Predict => "/predict",
            Self::Batch => "/predict/batch",
            Self::Health => "/health",
            Self::ModelInfo => "/model/info",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Predict => "predict",
            Self::Batch => "batch",
            Self::Health => "health",
            Self::ModelInfo => "model_info",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Predict => 0,
            Self::Batch => 1,
            Self::Health => 2,
            Self::ModelInfo => 3,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Weighted choice over [`RequestKind::ALL`].
#[derive(Debug, Clone)]
pub struct KindSampler {
    cumulative: [f64; 4],
}

impl Default for KindSampler {
    fn default() -> Self { Self::new() }
}

impl KindSampler {
    pub fn new() -> Self {
        let mut cumulative = [0.0_f64; 4];
        let mut acc = 0.0;
        for (slot, kind) in cumulative.iter_mut().zip(RequestKind::ALL) {
            acc += kind.weight();
            *slot = acc;
        }
        Self { cumulative }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> RequestKind {
        let total = self.cumulative[3];
        let r: f64 = rng.gen::<f64>() * total;
        for (i, edge) in self.cumulative.iter().enumerate() {
            if r < *edge { return RequestKind::ALL[i]; }
        }
        // float rounding at the top edge
        RequestKind::ALL[3]
    }
}

/// Seeded RNG when `seed` is given, entropy otherwise.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}
