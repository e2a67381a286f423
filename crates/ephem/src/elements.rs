//! Analytic planetary positions from JPL approximate mean Keplerian elements.
//!
//! Elements and their per-century rates come from Standish, "Keplerian Elements
//! for Approximate Positions of the Major Planets" (table valid 1800–2050 AD),
//! referred to the J2000 ecliptic. Positions are projected onto the ecliptic
//! plane. `earth` resolves to the Earth–Moon barycentre.

use std::f64::consts::{PI, TAU};

use chrono::NaiveDateTime;
use swingby_core::time::julian_centuries_since_j2000;
use swingby_core::units::au_to_km;
use swingby_core::vector::Vector2;

use crate::{EphemerisError, EphemerisProvider, normalize_body_name};

/// Mean elements at J2000 and their rates per Julian century.
///
/// Angles in degrees, semi-major axis in au.
#[derive(Debug, Clone, Copy)]
struct MeanElements {
    a: [f64; 2],
    e: [f64; 2],
    inclination: [f64; 2],
    mean_longitude: [f64; 2],
    longitude_perihelion: [f64; 2],
    longitude_node: [f64; 2],
}

const MERCURY: MeanElements = MeanElements {
    a: [0.387_099_27, 0.000_000_37],
    e: [0.205_635_93, 0.000_019_06],
    inclination: [7.004_979_02, -0.005_947_49],
    mean_longitude: [252.250_323_50, 149_472.674_111_75],
    longitude_perihelion: [77.457_796_28, 0.160_476_89],
    longitude_node: [48.330_765_93, -0.125_340_81],
};

const VENUS: MeanElements = MeanElements {
    a: [0.723_335_66, 0.000_003_90],
    e: [0.006_776_72, -0.000_041_07],
    inclination: [3.394_676_05, -0.000_788_90],
    mean_longitude: [181.979_099_50, 58_517.815_387_29],
    longitude_perihelion: [131.602_467_18, 0.002_683_29],
    longitude_node: [76.679_842_55, -0.277_694_18],
};

const EARTH_MOON_BARYCENTER: MeanElements = MeanElements {
    a: [1.000_002_61, 0.000_005_62],
    e: [0.016_711_23, -0.000_043_92],
    inclination: [-0.000_015_31, -0.012_946_68],
    mean_longitude: [100.464_571_66, 35_999.372_449_81],
    longitude_perihelion: [102.937_681_93, 0.323_273_64],
    longitude_node: [0.0, 0.0],
};

const MARS: MeanElements = MeanElements {
    a: [1.523_710_34, 0.000_018_47],
    e: [0.093_394_10, 0.000_078_82],
    inclination: [1.849_691_42, -0.008_131_31],
    mean_longitude: [-4.553_432_05, 19_140.302_684_99],
    longitude_perihelion: [-23.943_629_59, 0.444_410_88],
    longitude_node: [49.559_538_91, -0.292_573_43],
};

const JUPITER: MeanElements = MeanElements {
    a: [5.202_887_00, -0.000_116_07],
    e: [0.048_386_24, -0.000_132_53],
    inclination: [1.304_396_95, -0.001_837_14],
    mean_longitude: [34.396_440_51, 3_034.746_127_75],
    longitude_perihelion: [14.728_479_83, 0.212_526_68],
    longitude_node: [100.473_909_09, 0.204_691_06],
};

const SATURN: MeanElements = MeanElements {
    a: [9.536_675_94, -0.001_250_60],
    e: [0.053_861_79, -0.000_509_91],
    inclination: [2.485_991_87, 0.001_936_09],
    mean_longitude: [49.954_244_23, 1_222.493_622_01],
    longitude_perihelion: [92.598_878_31, -0.418_972_16],
    longitude_node: [113.662_424_48, -0.288_677_94],
};

const URANUS: MeanElements = MeanElements {
    a: [19.189_164_64, -0.001_961_76],
    e: [0.047_257_44, -0.000_043_97],
    inclination: [0.772_637_83, -0.002_429_39],
    mean_longitude: [313.238_104_51, 428.482_027_85],
    longitude_perihelion: [170.954_276_30, 0.408_052_81],
    longitude_node: [74.016_925_03, 0.042_405_89],
};

const NEPTUNE: MeanElements = MeanElements {
    a: [30.069_922_76, 0.000_262_91],
    e: [0.008_590_48, 0.000_051_05],
    inclination: [1.770_043_47, 0.000_353_72],
    mean_longitude: [-55.120_029_69, 218.459_453_25],
    longitude_perihelion: [44.964_762_27, -0.322_414_64],
    longitude_node: [131.784_225_74, -0.005_086_64],
};

const PLUTO: MeanElements = MeanElements {
    a: [39.482_116_75, -0.000_315_96],
    e: [0.248_827_30, 0.000_051_70],
    inclination: [17.140_012_06, 0.000_048_18],
    mean_longitude: [238.929_038_33, 145.207_805_15],
    longitude_perihelion: [224.068_916_29, -0.040_629_42],
    longitude_node: [110.303_936_84, -0.011_834_82],
};

const KEPLER_TOLERANCE: f64 = 1e-12;
const KEPLER_MAX_ITERATIONS: usize = 50;

/// Ephemeris backed by the mean-elements table for the Sun and nine planets.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanElementsEphemeris;

impl MeanElementsEphemeris {
    pub fn new() -> Self {
        Self
    }

    /// Bodies this provider resolves, in heliocentric order.
    pub fn bodies() -> &'static [&'static str] {
        &[
            "sun", "mercury", "venus", "earth", "mars", "jupiter", "saturn", "uranus", "neptune",
            "pluto",
        ]
    }
}

fn elements_for(body: &str) -> Option<MeanElements> {
    match body {
        "mercury" => Some(MERCURY),
        "venus" => Some(VENUS),
        "earth" | "earth-moon" | "emb" => Some(EARTH_MOON_BARYCENTER),
        "mars" => Some(MARS),
        "jupiter" => Some(JUPITER),
        "saturn" => Some(SATURN),
        "uranus" => Some(URANUS),
        "neptune" => Some(NEPTUNE),
        "pluto" => Some(PLUTO),
        _ => None,
    }
}

/// Wrap an angle in degrees to `[-180, 180)`.
fn wrap_degrees(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Solve Kepler's equation `M = E - e sin E` for the eccentric anomaly (radians).
pub(crate) fn eccentric_anomaly(mean_anomaly: f64, e: f64) -> f64 {
    let m = (mean_anomaly + PI).rem_euclid(TAU) - PI;
    let mut ea = if e < 0.8 { m } else { PI.copysign(m) };
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let delta = (ea - e * ea.sin() - m) / (1.0 - e * ea.cos());
        ea -= delta;
        if delta.abs() < KEPLER_TOLERANCE {
            break;
        }
    }
    ea
}

fn ecliptic_position_au(elements: &MeanElements, centuries: f64) -> Vector2 {
    let at = |pair: [f64; 2]| pair[0] + pair[1] * centuries;

    let a = at(elements.a);
    let e = at(elements.e);
    let inclination = at(elements.inclination).to_radians();
    let mean_longitude = at(elements.mean_longitude);
    let longitude_perihelion = at(elements.longitude_perihelion);
    let longitude_node = at(elements.longitude_node);

    let argument_perihelion = (longitude_perihelion - longitude_node).to_radians();
    let mean_anomaly = wrap_degrees(mean_longitude - longitude_perihelion).to_radians();
    let node = longitude_node.to_radians();

    let ea = eccentric_anomaly(mean_anomaly, e);
    let x_orbit = a * (ea.cos() - e);
    let y_orbit = a * (1.0 - e * e).sqrt() * ea.sin();

    let (sin_w, cos_w) = argument_perihelion.sin_cos();
    let (sin_o, cos_o) = node.sin_cos();
    let cos_i = inclination.cos();

    [
        (cos_w * cos_o - sin_w * sin_o * cos_i) * x_orbit
            + (-sin_w * cos_o - cos_w * sin_o * cos_i) * y_orbit,
        (cos_w * sin_o + sin_w * cos_o * cos_i) * x_orbit
            + (-sin_w * sin_o + cos_w * cos_o * cos_i) * y_orbit,
    ]
}

impl EphemerisProvider for MeanElementsEphemeris {
    fn position(&self, body: &str, instant: NaiveDateTime) -> Result<Vector2, EphemerisError> {
        let name = normalize_body_name(body);
        if name == "sun" {
            return Ok([0.0, 0.0]);
        }
        let elements =
            elements_for(&name).ok_or_else(|| EphemerisError::UnknownBody(body.to_string()))?;

        let centuries = julian_centuries_since_j2000(instant);
        let [x_au, y_au] = ecliptic_position_au(&elements, centuries);
        let position = [au_to_km(x_au), au_to_km(y_au)];
        if !(position[0].is_finite() && position[1].is_finite()) {
            return Err(EphemerisError::NonFinite {
                body: name,
                instant,
            });
        }
        Ok(position)
    }
}
