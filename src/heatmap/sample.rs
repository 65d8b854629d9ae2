// src/heatmap/sample.rs

use crate::math::{
    error::{HeatmapError, HeatmapResult},
    types::{Offset, Point2D},
    utils::power::dbm_to_watts,
};
use nalgebra::distance_squared;
use serde::{Deserialize, Serialize};

/// Eine einzelne, lokalisierte Messung.
///
/// `power` liegt immer auf linearer Skala (Watt). Umrechnungen von und nach dBm
/// passieren nur an den Systemgrenzen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub position: Point2D,
    pub power: f64,
    pub frequency: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, power: f64, frequency: f64) -> Self {
        Self {
            position: Point2D::new(x, y),
            power,
            frequency,
        }
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Kopie derselben Messung an einer anderen Position.
    pub fn moved_to(&self, position: Point2D) -> Self {
        Self { position, ..*self }
    }

    pub fn with_power(&self, power: f64) -> Self {
        Self { power, ..*self }
    }

    pub fn translated(&self, offset: &Offset) -> Self {
        self.moved_to(self.position + *offset)
    }
}

/// Findet die Messung mit dem geringsten euklidischen Abstand zu `position`.
///
/// Bei gleichem Abstand gewinnt die zuerst gefundene Messung, damit
/// wiederholte Läufe identische Ergebnisse liefern.
pub fn find_closest_sample<'a>(samples: &'a [Sample], position: &Point2D) -> HeatmapResult<&'a Sample> {
    let mut closest: Option<(&Sample, f64)> = None;
    for sample in samples {
        let dist = distance_squared(&sample.position, position);
        match closest {
            Some((_, best)) if dist >= best => {}
            _ => closest = Some((sample, dist)),
        }
    }
    closest
        .map(|(sample, _)| sample)
        .ok_or(HeatmapError::EmptySampleSet)
}

/// Sammelt wiederholte RSSI-Messungen (dBm) an einem Ort, um später den Mittelwert zu bilden.
#[derive(Debug, Clone, Default)]
pub struct RssiAggregate {
    rssi_sum: f64,
    number_of_values: usize,
    location: Option<Point2D>,
}

impl RssiAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(location: Point2D) -> Self {
        Self {
            location: Some(location),
            ..Self::default()
        }
    }

    pub fn add_value(&mut self, rssi: f64) {
        self.rssi_sum += rssi;
        self.number_of_values += 1;
    }

    /// Mittelwert aller Werte; `None` solange nichts gesammelt wurde.
    pub fn average(&self) -> Option<f64> {
        if self.number_of_values == 0 {
            None
        } else {
            Some(self.rssi_sum / self.number_of_values as f64)
        }
    }

    pub fn count(&self) -> usize {
        self.number_of_values
    }

    pub fn location(&self) -> Option<Point2D> {
        self.location
    }

    pub fn set_location(&mut self, location: Point2D) {
        self.location = Some(location);
    }

    /// Wandelt den Mittelwert in eine Messung auf linearer Skala um.
    pub fn to_sample(&self, frequency: f64) -> HeatmapResult<Sample> {
        let average = self.average().ok_or(HeatmapError::EmptySampleSet)?;
        let location = self.location.ok_or_else(|| HeatmapError::InvalidConfiguration {
            message: "RSSI aggregate has no location".to_string(),
        })?;
        Ok(Sample {
            position: location,
            power: dbm_to_watts(average),
            frequency,
        })
    }
}
