use wayside::{
    alerts::AlertMode,
    config::Config,
    geocoder::{self, Geocoder},
    oba::{ObaClient, RoutesCache},
};

pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
    pub oba: ObaClient,
    pub geocoder: Geocoder,
    pub routes: RoutesCache,
    pub alert_mode: AlertMode,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, geocoder::Error> {
        let http = reqwest::Client::new();
        let oba = ObaClient::with_client(
            http.clone(),
            config.oba_server_url.clone(),
            config.oba_api_key.clone(),
        );
        let geocoder = Geocoder::new(
            config.geocoder_provider.parse()?,
            config.geocoder_api_key.clone(),
        );
        let alert_mode = if config.alerts_test_mode {
            AlertMode::Test
        } else {
            AlertMode::Live
        };
        Ok(Self {
            config,
            http,
            oba,
            geocoder,
            routes: RoutesCache::new(),
            alert_mode,
        })
    }
}
