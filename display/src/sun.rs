use common::prayer::Coordinates;

/// Solar altitude in degrees at `unixtime_in_ms`.
pub fn altitude(unixtime_in_ms: i64, coordinates: &Coordinates) -> f64 {
    let pos = sun::pos(unixtime_in_ms, coordinates.latitude, coordinates.longitude);
    pos.altitude.to_degrees()
}

/// Above the apparent horizon used for sunrise and sunset.
pub fn is_up(unixtime_in_ms: i64, coordinates: &Coordinates) -> bool {
    altitude(unixtime_in_ms, coordinates) > -0.833
}
