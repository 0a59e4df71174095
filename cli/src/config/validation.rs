//! Setting value validation.

use thermal_image::DitherAlgorithm;

/// Keys read from the environment.
pub const SETTING_KEYS: &[&str] = &[
    "PRINT_WIDTH",
    "DITHER_ALGORITHM",
    "BRIGHTNESS",
    "ALPHA_AS_WHITE",
    "FETCH_TIMEOUT_SECS",
];

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "PRINT_WIDTH" => validate_int_range(value, 1, 4096)?,
        "BRIGHTNESS" => validate_int_range(value, 0, 255)?,
        "FETCH_TIMEOUT_SECS" => validate_int_range(value, 1, 300)?,
        "DITHER_ALGORITHM" => {
            value
                .parse::<DitherAlgorithm>()
                .map_err(|_| "must be 'direct', 'floyd-steinberg' or 'ordered'")?;
        }
        "ALPHA_AS_WHITE" => {
            if value != "true" && value != "false" {
                return Err("must be 'true' or 'false'".into());
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_int_range(value: &str, min: i64, max: i64) -> Result<(), String> {
    let v: i64 = value.trim().parse().map_err(|_| "must be an integer")?;
    if v < min || v > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}
