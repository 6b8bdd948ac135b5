//! Maps inbound user actions to replies.
//!
//! The dispatcher never fails: fetch errors are logged and turned into the
//! fixed "sensors unavailable" message.

use tracing::{error, info};

use crate::{
    Config, FetchError,
    alert::AlertPolicy,
    config::LocationConfig,
    format,
    model::Report,
    provider::WeatherProvider,
};

pub const STATUS_BUTTON: &str = "🏔️ Estado Actual";
pub const EMERGENCIES_BUTTON: &str = "🚨 Emergencias";
pub const TIPS_BUTTON: &str = "📝 Consejos Zonda";

/// Reply keyboard layout, row by row.
pub const MENU: &[&[&str]] = &[&[STATUS_BUTTON], &[EMERGENCIES_BUTTON, TIPS_BUTTON]];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start,
    CurrentStatus,
    Emergencies,
    ZondaTips,
    Unrecognized(String),
}

impl Action {
    /// Parse the text of an inbound message. Commands may carry a
    /// `@botname` suffix as sent in group chats.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        if let Some(command) = text.strip_prefix('/') {
            let name = command.split_whitespace().next().unwrap_or_default();
            let name = name.split('@').next().unwrap_or_default();
            return match name.to_lowercase().as_str() {
                "start" => Action::Start,
                "clima" | "estado" => Action::CurrentStatus,
                "emergencias" => Action::Emergencies,
                "consejos" => Action::ZondaTips,
                _ => Action::Unrecognized(text.to_string()),
            };
        }

        match text {
            STATUS_BUTTON => Action::CurrentStatus,
            EMERGENCIES_BUTTON => Action::Emergencies,
            TIPS_BUTTON => Action::ZondaTips,
            _ => Action::Unrecognized(text.to_string()),
        }
    }
}

/// Text to send back, and whether to (re)present the action menu with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub show_menu: bool,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), show_menu: false }
    }

    fn with_menu(text: impl Into<String>) -> Self {
        Self { text: text.into(), show_menu: true }
    }
}

#[derive(Debug)]
pub struct Dispatcher {
    provider: Box<dyn WeatherProvider>,
    policy: AlertPolicy,
    location: LocationConfig,
}

impl Dispatcher {
    pub fn new(
        provider: Box<dyn WeatherProvider>,
        policy: AlertPolicy,
        location: LocationConfig,
    ) -> Self {
        Self { provider, policy, location }
    }

    pub fn from_config(config: &Config, provider: Box<dyn WeatherProvider>) -> Self {
        Self::new(provider, config.alerts.clone(), config.location.clone())
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    /// Fetch current conditions once and classify them.
    pub async fn current_report(&self) -> Result<Report, FetchError> {
        let reading = self.provider.fetch(self.location.coordinates()).await?;
        Ok(self.policy.classify(reading))
    }

    async fn status_reply(&self) -> Reply {
        match self.current_report().await {
            Ok(report) => {
                info!(tier = ?report.tier, gust_kph = report.reading.wind_gust_kph, "Report ready");
                Reply::text(format::render_report(&report, &self.location.name))
            }
            Err(err) => {
                error!(error = %err, provider = %self.provider.id(), "Weather fetch failed");
                Reply::text(format::SENSORS_UNAVAILABLE)
            }
        }
    }

    pub async fn handle(&self, action: &Action, display_name: Option<&str>) -> Reply {
        info!(?action, "Handling action");
        match action {
            Action::Start => Reply::with_menu(format::onboarding(display_name)),
            Action::CurrentStatus => self.status_reply().await,
            Action::Emergencies => Reply::text(format::EMERGENCY_CONTACTS),
            Action::ZondaTips => Reply::text(format::ZONDA_TIPS),
            Action::Unrecognized(_) => Reply::with_menu(format::UNRECOGNIZED),
        }
    }
}
