/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Minimum map count to use map-level Rayon parallelism when coadding.
pub const PARALLEL_MAP_THRESHOLD: usize = 2;

/// Nominal photospheric radius of the Sun in metres (IAU 2015 B3).
pub const RSUN_METERS: f64 = 695_700_000.0;

/// Astronomical unit in metres.
pub const AU_METERS: f64 = 149_597_870_700.0;

/// Julian date of the J2000.0 epoch.
pub const J2000_JD: f64 = 2_451_545.0;

/// Julian date of the Unix epoch.
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Days per Julian century.
pub const DAYS_PER_CENTURY: f64 = 36_525.0;

/// TT - UTC in seconds. Leap seconds since 2017-01-01 plus the fixed 32.184 s.
pub const TT_MINUS_UTC_SECONDS: f64 = 69.184;

/// Inclination of the solar equator to the J2000 ecliptic, in degrees.
pub const SOLAR_EQUATOR_INCLINATION_DEG: f64 = 7.25;

/// Ecliptic longitude of the ascending node of the solar equator at J2000, in degrees.
pub const SOLAR_EQUATOR_NODE_DEG: f64 = 75.76;

/// Julian date at which the Carrington prime meridian crossed the ascending node.
pub const CARRINGTON_EPOCH_JD: f64 = 2_398_220.0;

/// Sidereal Carrington rotation period in days.
pub const CARRINGTON_SIDEREAL_PERIOD_DAYS: f64 = 25.38;

/// Mean synodic Carrington rotation period in days.
pub const CARRINGTON_SYNODIC_PERIOD_DAYS: f64 = 27.2753;

/// Julian date on which Carrington rotation 1 began (1853-11-09).
pub const CARRINGTON_ROTATION_ONE_JD: f64 = 2_398_167.4;

/// Tolerance (metres) below which two observer positions are considered the same.
pub const OBSERVER_TOLERANCE_METERS: f64 = 1.0;

/// Convergence threshold for Kepler's equation, in radians.
pub const KEPLER_TOLERANCE: f64 = 1e-12;

/// Iteration cap for Kepler's equation.
pub const KEPLER_MAX_ITERATIONS: usize = 50;

/// Size in bytes of a FITS header/data block.
pub const FITS_BLOCK_SIZE: usize = 2880;

/// Length in bytes of one FITS header card.
pub const FITS_CARD_SIZE: usize = 80;
