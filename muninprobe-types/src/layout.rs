//! Observation field names shared by the adapters that produce them and the
//! schema registry that reads them.

/// Weather station fields, named as the API names them.
pub mod weather {
    pub const HUMIDITY: &str = "humidity";
    pub const WIND_DIR: &str = "winddir";
    pub const UV: &str = "uv";
    pub const SOLAR_RADIATION: &str = "solarRadiation";

    pub const TEMP: &str = "temp";
    pub const HEAT_INDEX: &str = "heatIndex";
    pub const DEW_POINT: &str = "dewpt";
    pub const WIND_CHILL: &str = "windChill";
    pub const WIND_SPEED: &str = "windSpeed";
    pub const WIND_GUST: &str = "windGust";
    pub const PRESSURE: &str = "pressure";
    pub const PRECIP_RATE: &str = "precipRate";
    pub const PRECIP_TOTAL: &str = "precipTotal";
    pub const ELEVATION: &str = "elev";
}

/// Cable modem channel layout.
pub mod modem {
    use crate::channel_key;

    /// Downstream channel slots.
    pub const DOWNSTREAM_CHANNELS: usize = 16;

    /// Upstream channel slots.
    pub const UPSTREAM_CHANNELS: usize = 4;

    pub const DOWNSTREAM_PREFIX: &str = "down";
    pub const UPSTREAM_PREFIX: &str = "up";

    /// Prefix of the all-channel error totals.
    pub const TOTAL: &str = "total";

    pub const POWER: &str = "power";
    pub const SNR: &str = "snr";
    pub const CORRECTED: &str = "corrected";
    pub const UNCORRECTED: &str = "uncorrected";

    /// Field name for one channel attribute, e.g. `down_03.snr`.
    pub fn field(prefix: &str, index: usize, attribute: &str) -> String {
        format!("{}.{attribute}", channel_key(prefix, index))
    }

    /// Field name for one error total, e.g. `total.corrected`.
    pub fn total_field(attribute: &str) -> String {
        format!("{TOTAL}.{attribute}")
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn field_names() {
            assert_eq!(field(DOWNSTREAM_PREFIX, 3, SNR), "down_03.snr");
            assert_eq!(field(UPSTREAM_PREFIX, 4, POWER), "up_04.power");
            assert_eq!(total_field(CORRECTED), "total.corrected");
        }
    }
}
