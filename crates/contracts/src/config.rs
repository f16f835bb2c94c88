//! LoaderConfig - Config Loader output
//!
//! Core timing consumed by the dispatcher, plus per-vendor sections that are
//! opaque to the core and handed to the roster builder as-is.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use validator::Validate;

use crate::{Placement, TriggerKind};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Full loader configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoaderConfig {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Emit gated diagnostics
    #[serde(default)]
    pub debug: bool,

    /// Fallback timer delay in milliseconds
    #[serde(default = "default_delay_timeout_ms")]
    #[validate(range(
        min = 1,
        max = 600_000,
        message = "delay_timeout_ms must be within 1..=600000"
    ))]
    pub delay_timeout_ms: u64,

    /// Upper bound on the idle wait before the fallback timer is armed
    #[serde(default = "default_idle_timeout_ms")]
    #[validate(range(
        min = 1,
        max = 60_000,
        message = "idle_timeout_ms must be within 1..=60000"
    ))]
    pub idle_timeout_ms: u64,

    /// Interaction events that trigger dispatch
    #[serde(default = "default_triggers")]
    pub triggers: Vec<TriggerKind>,

    /// Analytics and advertising vendors
    #[serde(default)]
    #[validate(nested)]
    pub analytics: AnalyticsConfig,

    /// Chat widget vendors
    #[serde(default)]
    pub chat: ChatConfig,

    /// Flag-enabled services
    #[serde(default)]
    pub services: ServicesConfig,

    /// ProveSource social proof
    #[serde(default)]
    pub provesource: ProveSourceConfig,

    /// UserWay accessibility widget
    #[serde(default)]
    pub userway: UserWayConfig,

    /// accessiBe accessibility widget
    #[serde(default)]
    pub accessibe: AccessibeConfig,

    /// Site-specific scripts declared in configuration
    #[serde(default)]
    #[validate(nested)]
    pub custom_scripts: Vec<CustomScript>,
}

fn default_delay_timeout_ms() -> u64 {
    5000
}

fn default_idle_timeout_ms() -> u64 {
    1000
}

fn default_triggers() -> Vec<TriggerKind> {
    TriggerKind::DEFAULT.to_vec()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            version: ConfigVersion::V1,
            debug: false,
            delay_timeout_ms: default_delay_timeout_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            triggers: default_triggers(),
            analytics: AnalyticsConfig::default(),
            chat: ChatConfig::default(),
            services: ServicesConfig::default(),
            provesource: ProveSourceConfig::default(),
            userway: UserWayConfig::default(),
            accessibe: AccessibeConfig::default(),
            custom_scripts: Vec::new(),
        }
    }
}

impl LoaderConfig {
    /// Fallback timer delay
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_timeout_ms)
    }

    /// Idle wait bound
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// Analytics and advertising section
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalyticsConfig {
    /// GA4 measurement id, `G-0000000000`
    #[serde(default)]
    pub google_analytics_id: String,

    /// Tag Manager container id, `GTM-0000000`
    #[serde(default)]
    pub google_tag_manager_id: String,

    /// Ads id, `AW-000000000`
    #[serde(default)]
    pub google_ads_id: String,

    /// Call metrics conversion id, `AW-000000000/00000000000000000000`
    #[serde(default)]
    pub call_metrics_id: String,

    /// Phone numbers tracked by call metrics, `1-000-000-0000`
    #[serde(default)]
    pub call_metrics_phones: Vec<String>,

    /// Lead conversion id, `AW-000000000/00000000000000000000`
    #[serde(default)]
    pub lead_conversion_id: String,

    /// Lead conversion value
    #[serde(default = "default_lead_conversion_value")]
    pub lead_conversion_value: f64,

    /// ISO 4217 currency code
    #[serde(default = "default_lead_conversion_currency")]
    #[validate(length(equal = 3, message = "lead_conversion_currency must be a 3-letter code"))]
    pub lead_conversion_currency: String,

    /// Facebook pixel id, `000000000000000`
    #[serde(default)]
    pub facebook_pixel_id: String,

    /// Bing UET tag id, `000000000`
    #[serde(default)]
    pub bing_conversion_id: String,

    /// HotJar site id, `0000000`
    #[serde(default)]
    pub hotjar_id: String,
}

fn default_lead_conversion_value() -> f64 {
    1.0
}

fn default_lead_conversion_currency() -> String {
    "USD".to_string()
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            google_analytics_id: String::new(),
            google_tag_manager_id: String::new(),
            google_ads_id: String::new(),
            call_metrics_id: String::new(),
            call_metrics_phones: Vec::new(),
            lead_conversion_id: String::new(),
            lead_conversion_value: default_lead_conversion_value(),
            lead_conversion_currency: default_lead_conversion_currency(),
            facebook_pixel_id: String::new(),
            bing_conversion_id: String::new(),
            hotjar_id: String::new(),
        }
    }
}

/// Chat widget section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Ngage website id, `0-000-000-000-000-000-000-000`
    #[serde(default)]
    pub ngage_id: String,

    /// Olark site id, `0000-000-00-0000`
    #[serde(default)]
    pub olark_id: String,

    /// Apex company name
    #[serde(default)]
    pub apex_id: String,

    /// Intaker site name
    #[serde(default)]
    pub intaker_id: String,

    /// Juvo Leads tag id, `0000000000`
    #[serde(default)]
    pub juvo_leads_id: String,

    /// HubSpot portal id, `00000000`
    #[serde(default)]
    pub hubspot_id: String,
}

/// Flag-enabled services
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// ClickCease fraud monitor
    #[serde(default)]
    pub click_cease: bool,

    /// Custom Google Translate element
    #[serde(default)]
    pub google_translate: bool,

    /// Translate element options
    #[serde(default)]
    pub translate: TranslateOptions,
}

/// Google Translate element options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateOptions {
    #[serde(default = "default_page_language")]
    pub page_language: String,

    #[serde(default = "default_included_languages")]
    pub included_languages: String,

    /// Id of the element the widget renders into
    #[serde(default = "default_translate_element_id")]
    pub element_id: String,
}

fn default_page_language() -> String {
    "en".to_string()
}

fn default_included_languages() -> String {
    "cy,de,es,fr,hi,it,nl,no,ru,tr,zh-CN".to_string()
}

fn default_translate_element_id() -> String {
    "google_translate_element".to_string()
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            page_language: default_page_language(),
            included_languages: default_included_languages(),
            element_id: default_translate_element_id(),
        }
    }
}

/// ProveSource section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProveSourceConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_provesource_version")]
    pub version: String,
}

fn default_provesource_version() -> String {
    "0.0.4".to_string()
}

impl Default for ProveSourceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            version: default_provesource_version(),
        }
    }
}

/// UserWay section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserWayConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub account: String,

    #[serde(default = "default_userway_position")]
    pub position: u32,

    #[serde(default = "default_userway_color")]
    pub color: String,

    #[serde(rename = "type", default = "default_userway_type")]
    pub widget_type: String,
}

fn default_userway_position() -> u32 {
    5
}

fn default_userway_color() -> String {
    "#2d68ff".to_string()
}

fn default_userway_type() -> String {
    "1".to_string()
}

impl Default for UserWayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            account: String::new(),
            position: default_userway_position(),
            color: default_userway_color(),
            widget_type: default_userway_type(),
        }
    }
}

/// accessiBe section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessibeConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Widget options, merged over the vendor defaults key by key
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

/// Script declared directly in configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CustomScript {
    /// Diagnostic name, unique within `custom_scripts`
    #[validate(length(min = 1, message = "custom script name cannot be empty"))]
    pub name: String,

    /// Source URL
    #[validate(length(min = 1, message = "custom script src cannot be empty"))]
    pub src: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub placement: Placement,

    #[serde(default = "default_true")]
    pub async_load: bool,

    #[serde(default)]
    pub defer: bool,

    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// Literal markup for a `<noscript>` fallback
    #[serde(default)]
    pub noscript: Option<String>,

    /// Global init function called once the script has loaded
    #[serde(default)]
    pub init: Option<String>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.delay(), Duration::from_millis(5000));
        assert_eq!(config.idle_timeout(), Duration::from_millis(1000));
        assert_eq!(config.triggers, TriggerKind::DEFAULT.to_vec());
        assert!(!config.debug);
        assert_eq!(config.analytics.lead_conversion_currency, "USD");
        assert_eq!(config.provesource.version, "0.0.4");
        assert_eq!(config.userway.position, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: LoaderConfig = toml::from_str("").unwrap();
        assert_eq!(config.delay_timeout_ms, 5000);
        assert_eq!(config.triggers.len(), 5);
        assert!(config.custom_scripts.is_empty());
    }

    #[test]
    fn test_range_validation() {
        let config = LoaderConfig {
            delay_timeout_ms: 0,
            ..LoaderConfig::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("delay_timeout_ms must be within"), "got: {err}");
    }

    #[test]
    fn test_userway_type_rename() {
        let config: LoaderConfig = toml::from_str(
            r#"
[userway]
enabled = true
account = "abc"
type = "2"
"#,
        )
        .unwrap();
        assert_eq!(config.userway.widget_type, "2");
        assert_eq!(config.userway.color, "#2d68ff");
    }
}
