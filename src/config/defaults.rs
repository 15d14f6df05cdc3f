use super::*;

impl Default for OctopusConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            account: String::new(),
            postcode: String::new(),
            base_url: "https://api.octopus.energy".to_string(),
            page_size: 25000,
            max_pages: 100,
            timeout_secs: 60,
            price_basis: PriceBasis::IncVat,
        }
    }
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            database: "octopus".to_string(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/octolog.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            classifier: "price".to_string(),
            off_peak_start: "00:30".to_string(),
            off_peak_end: "04:30".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            octopus: OctopusConfig::default(),
            influx: InfluxConfig::default(),
            logging: LoggingConfig::default(),
            peak: PeakConfig::default(),
            timezone: "Europe/London".to_string(),
        }
    }
}
