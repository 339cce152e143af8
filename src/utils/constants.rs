//! Simulation constants and defaults

/// Default executive timestep (120 Hz)
pub const SIM_TIMESTEP: f64 = 1.0 / 120.0;

/// Configuration document version this executive understands
pub const CONFIG_VERSION: &str = "2.0";

/// Environment variable holding the initial debug bitmask
pub const DEBUG_ENV_VAR: &str = "RUSTFDM_DEBUG";

/// Debug bitmask used when the environment does not provide one
pub const DEFAULT_DEBUG_LEVEL: u32 = 1;

/// Idle value of the trigger properties (reset, trims, linearization)
pub const TRIGGER_IDLE: f64 = -1.0;

/// Highest output logging rate accepted, in Hz
pub const OUTPUT_RATE_MAX_HZ: f64 = 1000.0;

/// Slack when comparing the clock against a scheduled event time
pub const SCHEDULE_TOLERANCE: f64 = 1e-9;

// Planet (WGS84 Earth) in English units

/// Planet rotation rate, rad/s
pub const PLANET_ROTATION_RATE: f64 = 0.000_072_921_15;

/// Gravitational parameter, ft^3/s^2
pub const PLANET_GM: f64 = 14.076_441_757_2e15;

/// Reference (equatorial) radius, ft
pub const PLANET_RADIUS_REFERENCE: f64 = 20_925_646.325_46;

/// Semi-major axis, ft
pub const PLANET_SEMI_MAJOR: f64 = 20_925_646.325_46;

/// Semi-minor axis, ft
pub const PLANET_SEMI_MINOR: f64 = 20_855_486.595_1;

// Standard atmosphere

/// Sea level temperature, Rankine
pub const ISA_SL_TEMPERATURE: f64 = 518.67;

/// Sea level pressure, lbf/ft^2
pub const ISA_SL_PRESSURE: f64 = 2116.228;

/// Sea level density, slug/ft^3
pub const ISA_SL_DENSITY: f64 = 0.002_376_892_4;

/// Troposphere temperature lapse rate, Rankine/ft
pub const ISA_LAPSE_RATE: f64 = 0.003_566_16;

/// Tropopause altitude, ft
pub const ISA_TROPOPAUSE: f64 = 36_089.24;

/// Specific gas constant for air, ft*lbf/(slug*R)
pub const AIR_GAS_CONSTANT: f64 = 1716.557;

/// Ratio of specific heats for air
pub const AIR_GAMMA: f64 = 1.4;

/// Sutherland constant for dynamic viscosity, slug/(ft*s*R^0.5)
pub const SUTHERLAND_BETA: f64 = 2.269_690e-8;

/// Sutherland temperature, Rankine
pub const SUTHERLAND_CONSTANT: f64 = 198.72;

// Unit conversions

/// Pounds (weight) per slug at standard gravity
pub const SLUG_TO_LB: f64 = 32.174_049;

/// Slugs per pound
pub const LB_TO_SLUG: f64 = 1.0 / SLUG_TO_LB;

/// Feet per inch
pub const INCH_TO_FT: f64 = 1.0 / 12.0;

/// Radians per degree
pub const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Feet per second per knot
pub const KTS_TO_FPS: f64 = 1.687_809_86;
