//! Fill-in of sensor fields a device does not report.
//!
//! Not every PurpleAir model reports every field. `sanitize_sensor_data`
//! makes the `sensor` object of a single-sensor payload carry every
//! documented field so downstream code can index it unconditionally. Missing
//! fields get the zero value of their type.

use serde_json::{Map, Value};

use crate::error::{ApiError, Result};

/// The zero value a missing field is filled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Text,
    Integer,
    Float,
}

impl FieldDefault {
    pub fn value(self) -> Value {
        match self {
            FieldDefault::Text => Value::String(String::new()),
            FieldDefault::Integer => Value::from(0),
            FieldDefault::Float => Value::from(0.0),
        }
    }
}

use FieldDefault::{Float, Integer, Text};

/// Every documented sensor data field with the type of its zero value.
pub const SENSOR_FIELD_DEFAULTS: &[(&str, FieldDefault)] = &[
    // Station information and status
    ("sensor_index", Integer),
    ("name", Text),
    ("icon", Integer),
    ("model", Text),
    ("hardware", Text),
    ("location_type", Integer),
    ("private", Integer),
    ("latitude", Float),
    ("longitude", Float),
    ("altitude", Float),
    ("position_rating", Integer),
    ("led_brightness", Integer),
    ("firmware_version", Text),
    ("firmware_upgrade", Text),
    ("rssi", Integer),
    ("uptime", Integer),
    ("pa_latency", Integer),
    ("memory", Integer),
    ("last_seen", Integer),
    ("last_modified", Integer),
    ("date_created", Integer),
    ("channel_state", Integer),
    ("channel_flags", Integer),
    ("channel_flags_manual", Integer),
    ("channel_flags_auto", Integer),
    ("confidence", Integer),
    ("confidence_manual", Integer),
    ("confidence_auto", Integer),
    // Environmental
    ("humidity", Integer),
    ("humidity_a", Integer),
    ("humidity_b", Integer),
    ("temperature", Integer),
    ("temperature_a", Integer),
    ("temperature_b", Integer),
    ("pressure", Float),
    ("pressure_a", Float),
    ("pressure_b", Float),
    // Miscellaneous
    ("voc", Float),
    ("voc_a", Float),
    ("voc_b", Float),
    ("ozone1", Float),
    ("analog_input", Float),
    // PM1.0
    ("pm1.0", Float),
    ("pm1.0_a", Float),
    ("pm1.0_b", Float),
    ("pm1.0_atm", Float),
    ("pm1.0_atm_a", Float),
    ("pm1.0_atm_b", Float),
    ("pm1.0_cf_1", Float),
    ("pm1.0_cf_1_a", Float),
    ("pm1.0_cf_1_b", Float),
    // PM2.5
    ("pm2.5_alt", Float),
    ("pm2.5_alt_a", Float),
    ("pm2.5_alt_b", Float),
    ("pm2.5", Float),
    ("pm2.5_a", Float),
    ("pm2.5_b", Float),
    ("pm2.5_atm", Float),
    ("pm2.5_atm_a", Float),
    ("pm2.5_atm_b", Float),
    ("pm2.5_cf_1", Float),
    ("pm2.5_cf_1_a", Float),
    ("pm2.5_cf_1_b", Float),
    // PM2.5 running averages
    ("pm2.5_10minute", Float),
    ("pm2.5_10minute_a", Float),
    ("pm2.5_10minute_b", Float),
    ("pm2.5_30minute", Float),
    ("pm2.5_30minute_a", Float),
    ("pm2.5_30minute_b", Float),
    ("pm2.5_60minute", Float),
    ("pm2.5_60minute_a", Float),
    ("pm2.5_60minute_b", Float),
    ("pm2.5_6hour", Float),
    ("pm2.5_6hour_a", Float),
    ("pm2.5_6hour_b", Float),
    ("pm2.5_24hour", Float),
    ("pm2.5_24hour_a", Float),
    ("pm2.5_24hour_b", Float),
    ("pm2.5_1week", Float),
    ("pm2.5_1week_a", Float),
    ("pm2.5_1week_b", Float),
    // PM10.0
    ("pm10.0", Float),
    ("pm10.0_a", Float),
    ("pm10.0_b", Float),
    ("pm10.0_atm", Float),
    ("pm10.0_atm_a", Float),
    ("pm10.0_atm_b", Float),
    ("pm10.0_cf_1", Float),
    ("pm10.0_cf_1_a", Float),
    ("pm10.0_cf_1_b", Float),
    // Visibility
    ("scattering_coefficient", Float),
    ("scattering_coefficient_a", Float),
    ("scattering_coefficient_b", Float),
    ("deciviews", Float),
    ("deciviews_a", Float),
    ("deciviews_b", Float),
    ("visual_range", Float),
    ("visual_range_a", Float),
    ("visual_range_b", Float),
    // Particle counts
    ("0.3_um_count", Float),
    ("0.3_um_count_a", Float),
    ("0.3_um_count_b", Float),
    ("0.5_um_count", Float),
    ("0.5_um_count_a", Float),
    ("0.5_um_count_b", Float),
    ("1.0_um_count", Float),
    ("1.0_um_count_a", Float),
    ("1.0_um_count_b", Float),
    ("2.5_um_count", Float),
    ("2.5_um_count_a", Float),
    ("2.5_um_count_b", Float),
    ("5.0_um_count", Float),
    ("5.0_um_count_a", Float),
    ("5.0_um_count_b", Float),
    ("10.0_um_count", Float),
    ("10.0_um_count_a", Float),
    ("10.0_um_count_b", Float),
    // ThingSpeak
    ("primary_id_a", Integer),
    ("primary_key_a", Text),
    ("secondary_id_a", Integer),
    ("secondary_key_a", Text),
    ("primary_id_b", Integer),
    ("primary_key_b", Text),
    ("secondary_id_b", Integer),
    ("secondary_key_b", Text),
];

/// Insert every missing field of `SENSOR_FIELD_DEFAULTS` into
/// `payload["sensor"]`. Values already present are left untouched and no
/// other part of the payload is modified.
pub fn sanitize_sensor_data(payload: &mut Value) -> Result<()> {
    let root = payload
        .as_object_mut()
        .ok_or_else(|| ApiError::config("sensor payload must be a JSON object"))?;

    let sensor = root
        .entry("sensor")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| ApiError::config("`sensor` entry of the payload must be a JSON object"))?;

    for (name, default) in SENSOR_FIELD_DEFAULTS {
        sensor
            .entry(name.to_string())
            .or_insert_with(|| default.value());
    }
    Ok(())
}
