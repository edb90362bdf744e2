use std::ops::RangeInclusive;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DESTINATION_CENTERS: [&str; 5] = ["Mumbai", "Delhi", "Bangalore", "Chennai", "Kolkata"];
pub const DESTINATION_NAMES: [&str; 5] = ["Office", "Home", "Warehouse", "Store", "Factory"];

pub const NUMERIC_FIELD_COUNT: usize = 15;

/// Sampling domain of every numeric feature, in wire order.
pub const FIELD_RANGES: [(&str, RangeInclusive<f64>); NUMERIC_FIELD_COUNT] = [
    ("osrm_distance", 1000.0..=50000.0),
    ("osrm_time", 60.0..=3600.0),
    ("actual_distance_to_destination", 1000.0..=50000.0),
    ("cutoff_factor", 0.8..=1.2),
    ("factor", 0.9..=1.1),
    ("time_difference", -300.0..=300.0),
    ("distance_per_min", 500.0..=2000.0),
    ("planned_duration", 1800.0..=7200.0),
    ("actual_vs_osrm_time", -600.0..=600.0),
    ("start_scan_to_end_scan", 0.0..=3600.0),
    ("start_to_cutoff_mins", 0.0..=120.0),
    ("center_pair_count", 0.0..=10.0),
    ("cutoff_hour", 0.0..=23.0),
    ("od_start_time_hour", 0.0..=23.0),
    ("cutoff_timestamp_weekday", 0.0..=6.0),
];

/// Every key a prediction request carries.
pub const FEATURE_NAMES: [&str; 19] = [
    "osrm_distance",
    "osrm_time",
    "actual_distance_to_destination",
    "cutoff_factor",
    "factor",
    "time_difference",
    "distance_per_min",
    "planned_duration",
    "actual_vs_osrm_time",
    "is_cutoff",
    "is_heavy_delay",
    "start_scan_to_end_scan",
    "start_to_cutoff_mins",
    "center_pair_count",
    "cutoff_hour",
    "od_start_time_hour",
    "cutoff_timestamp_weekday",
    "destination_center",
    "destination_name",
];

pub const MAX_BATCH_SIZE: usize = 5;

/// One synthetic delivery-ETA prediction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub osrm_distance: f64,
    pub osrm_time: f64,
    pub actual_distance_to_destination: f64,
    pub cutoff_factor: f64,
    pub factor: f64,
    pub time_difference: f64,
    pub distance_per_min: f64,
    pub planned_duration: f64,
    pub actual_vs_osrm_time: f64,
    pub is_cutoff: bool,
    pub is_heavy_delay: bool,
    pub start_scan_to_end_scan: f64,
    pub start_to_cutoff_mins: f64,
    pub center_pair_count: f64,
    pub cutoff_hour: f64,
    pub od_start_time_hour: f64,
    pub cutoff_timestamp_weekday: f64,
    pub destination_center: String,
    pub destination_name: String,
}

impl DeliveryRecord {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut numeric = [0.0_f64; NUMERIC_FIELD_COUNT];
        for (slot, (_, range)) in numeric.iter_mut().zip(FIELD_RANGES.iter()) {
            *slot = rng.gen_range(range.clone());
        }
        let [
            osrm_distance,
            osrm_time,
            actual_distance_to_destination,
            cutoff_factor,
            factor,
            time_difference,
            distance_per_min,
            planned_duration,
            actual_vs_osrm_time,
            start_scan_to_end_scan,
            start_to_cutoff_mins,
            center_pair_count,
            cutoff_hour,
            od_start_time_hour,
            cutoff_timestamp_weekday,
        ] = numeric;
        Self {
            osrm_distance,
            osrm_time,
            actual_distance_to_destination,
            cutoff_factor,
            factor,
            time_difference,
            distance_per_min,
            planned_duration,
            actual_vs_osrm_time,
            is_cutoff: rng.gen_bool(0.5),
            is_heavy_delay: rng.gen_bool(0.5),
            start_scan_to_end_scan,
            start_to_cutoff_mins,
            center_pair_count,
            cutoff_hour,
            od_start_time_hour,
            cutoff_timestamp_weekday,
            destination_center: pick(rng, &DESTINATION_CENTERS),
            destination_name: pick(rng, &DESTINATION_NAMES),
        }
    }

    /// Numeric features in the same order as [`FIELD_RANGES`].
    pub fn numeric_fields(&self) -> [(&'static str, f64); NUMERIC_FIELD_COUNT] {
        [
            ("osrm_distance", self.osrm_distance),
            ("osrm_time", self.osrm_time),
            ("actual_distance_to_destination", self.actual_distance_to_destination),
            ("cutoff_factor", self.cutoff_factor),
            ("factor", self.factor),
            ("time_difference", self.time_difference),
            ("distance_per_min", self.distance_per_min),
            ("planned_duration", self.planned_duration),
            ("actual_vs_osrm_time", self.actual_vs_osrm_time),
            ("start_scan_to_end_scan", self.start_scan_to_end_scan),
            ("start_to_cutoff_mins", self.start_to_cutoff_mins),
            ("center_pair_count", self.center_pair_count),
            ("cutoff_hour", self.cutoff_hour),
            ("od_start_time_hour", self.od_start_time_hour),
            ("cutoff_timestamp_weekday", self.cutoff_timestamp_weekday),
        ]
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, choices: &[&str]) -> String {
    // choices are non-empty constants
    choices.choose(rng).copied().unwrap_or_default().to_string()
}

/// Body of `POST /predict/batch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub deliveries: Vec<DeliveryRecord>,
}

impl BatchRequest {
    /// Between 1 and [`MAX_BATCH_SIZE`] independent records.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let n = rng.gen_range(1..=MAX_BATCH_SIZE);
        Self { deliveries: (0..n).map(|_| DeliveryRecord::random(&mut *rng)).collect() }
    }

    pub fn len(&self) -> usize { self.deliveries.len() }

    pub fn is_empty(&self) -> bool { self.deliveries.is_empty() }
}
