// src/math/utils.rs

/// Konstanten für Interpolation, Leistung und Farbskala
pub mod constants {
    /// Standard-Toleranz für die unscharfe Dreiecksprüfung (weit unter einem Pixel)
    pub const FUZZY_WIDTH: f64 = 1e-9;
    /// Ab dieser Pixelanzahl wird ein Rechteck in vier Quadranten zerlegt
    pub const MAX_PIXELS_PER_TASK: usize = 10_000;
    /// Untergrenze für die Größe des Worker-Pools
    pub const MIN_THREAD_COUNT: usize = 2;

    /// Leistung in Watt
    pub const MAX_POWER: f64 = 0.0001;
    pub const MIN_POWER: f64 = 0.0;
    pub const MIN_POWER_DBM: f64 = -100.0;

    /// Grenzen der Balken-Quantisierung (dBm)
    pub const MIN_RSSI: i32 = -100;
    pub const MAX_RSSI: i32 = -55;

    pub const DEFAULT_PIXELS_PER_METER: f64 = 100.0;
}

pub mod interpolation {
    /// Lineare Interpolation
    pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * t
    }
}

/// Umrechnung zwischen logarithmischer und linearer Leistung
pub mod power {
    use super::constants::{MAX_RSSI, MIN_POWER, MIN_POWER_DBM, MIN_RSSI};

    /// dBm -> Watt. Alles unterhalb von `MIN_POWER_DBM` gilt als keine Leistung.
    pub fn dbm_to_watts(dbm: f64) -> f64 {
        if dbm <= MIN_POWER_DBM {
            return MIN_POWER;
        }
        10f64.powf((dbm - 30.0) / 10.0)
    }

    /// Watt -> dBm
    pub fn watts_to_dbm(watts: f64) -> f64 {
        if watts == MIN_POWER {
            return MIN_POWER_DBM;
        }
        30.0 + 10.0 * watts.log10()
    }

    /// Quantisiert einen RSSI-Wert (dBm) auf `levels` Signalbalken (0..levels-1).
    pub fn signal_level(rssi: i32, levels: usize) -> usize {
        if levels == 0 {
            return 0;
        }
        if rssi <= MIN_RSSI {
            0
        } else if rssi >= MAX_RSSI {
            levels - 1
        } else {
            let input_range = (MAX_RSSI - MIN_RSSI) as f32;
            let output_range = (levels - 1) as f32;
            ((rssi - MIN_RSSI) as f32 * output_range / input_range) as usize
        }
    }
}

/// Umrechnung zwischen Metern und Pixeln
pub mod scale {
    pub fn meters_to_pixels(meters: f64, pixels_per_meter: f64) -> i64 {
        (meters * pixels_per_meter).ceil() as i64
    }

    pub fn pixels_to_meters(pixels: i64, pixels_per_meter: f64) -> f64 {
        pixels as f64 / pixels_per_meter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dbm_watts_conversion() {
        assert_relative_eq!(power::dbm_to_watts(30.0), 1.0);
        assert_relative_eq!(power::dbm_to_watts(-10.0), constants::MAX_POWER, epsilon = 1e-15);
        assert_eq!(power::dbm_to_watts(-100.0), 0.0);
        assert_eq!(power::dbm_to_watts(-120.0), 0.0);

        assert_relative_eq!(power::watts_to_dbm(1.0), 30.0);
        assert_relative_eq!(power::watts_to_dbm(1e-9), -60.0, epsilon = 1e-9);
        assert_eq!(power::watts_to_dbm(0.0), constants::MIN_POWER_DBM);
    }

    #[test]
    fn test_signal_level_quantization() {
        assert_eq!(power::signal_level(-110, 5), 0);
        assert_eq!(power::signal_level(-100, 5), 0);
        assert_eq!(power::signal_level(-55, 5), 4);
        assert_eq!(power::signal_level(-30, 5), 4);
        // (-70 + 100) * 4 / 45 = 2.66
        assert_eq!(power::signal_level(-70, 5), 2);
        assert_eq!(power::signal_level(-70, 0), 0);
    }

    #[test]
    fn test_scale_rounds_up() {
        assert_eq!(scale::meters_to_pixels(1.001, 100.0), 101);
        assert_eq!(scale::meters_to_pixels(-0.5, 100.0), -50);
        assert_relative_eq!(scale::pixels_to_meters(250, 100.0), 2.5);
    }
}
