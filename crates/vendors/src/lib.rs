//! # Vendors
//!
//! The roster of third-party integrations.
//!
//! Every vendor is an [`ActionEntry`] whose predicate is "configured" and whose
//! effect seeds the globals the vendor snippet expects and injects its script.
//! Entries are built from [`LoaderConfig`] in a fixed order.

#[macro_use]
mod macros;

pub mod analytics;
pub mod chat;
pub mod custom;
pub mod services;

use contracts::{ActionEntry, HostEnvironment, LoaderConfig, Roster, SharedHost};
use injector::{Diagnostics, Injector};
use tracing::{debug, warn};

/// Names of the built-in entries, in dispatch order
pub const BUILTIN_ENTRIES: [&str; 16] = [
    "Google Analytics",
    "Google Tag Manager",
    "Facebook Pixel",
    "Bing Conversion",
    "Ngage Chat",
    "Olark Chat",
    "Apex Chat",
    "HubSpot Chat",
    "Intaker Chat",
    "Juvo Leads",
    "ClickCease",
    "Google Translate",
    "HotJar",
    "ProveSource",
    "UserWay",
    "accessiBe",
];

/// Build the roster for `host` from configuration
pub fn build_roster(config: &LoaderConfig, host: SharedHost) -> Roster {
    let injector = Injector::new(host, Diagnostics::new(config.debug));
    build_roster_with(config, &injector)
}

/// Window global through which page code can inspect or adjust the config
pub const CONFIG_GLOBAL: &str = "delayedJsConfig";

/// Build the roster around an existing injector
///
/// Also publishes the configuration on the page as [`CONFIG_GLOBAL`].
pub fn build_roster_with(config: &LoaderConfig, injector: &Injector) -> Roster {
    publish_config(config, injector);

    let analytics = &config.analytics;
    let chat = &config.chat;

    let builtin: [ActionEntry; 16] = [
        analytics::google_analytics(analytics, injector),
        analytics::google_tag_manager(analytics, injector),
        analytics::facebook_pixel(analytics, injector),
        analytics::bing_conversion(analytics, injector),
        chat::ngage_chat(&chat.ngage_id, injector),
        chat::olark_chat(&chat.olark_id, injector),
        chat::apex_chat(&chat.apex_id, injector),
        chat::hubspot_chat(&chat.hubspot_id, injector),
        chat::intaker_chat(&chat.intaker_id, injector),
        chat::juvo_leads(&chat.juvo_leads_id, injector),
        services::click_cease(&config.services, injector),
        services::google_translate(
            &config.services,
            &analytics.google_analytics_id,
            injector,
        ),
        analytics::hotjar(analytics, injector),
        services::provesource(&config.provesource, injector),
        services::userway(&config.userway, injector),
        services::accessibe(&config.accessibe, injector),
    ];

    let mut roster: Roster = builtin.into_iter().collect();
    roster.extend(custom::custom_scripts(&config.custom_scripts, injector));

    debug!(
        entries = roster.len(),
        custom = config.custom_scripts.len(),
        "Roster built"
    );
    roster
}

fn publish_config(config: &LoaderConfig, injector: &Injector) {
    match serde_json::to_value(config) {
        Ok(value) => injector.host().set_global(CONFIG_GLOBAL, value),
        Err(e) => warn!(error = %e, "Failed to publish loader config"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::CustomScript;
    use page_sim::SimulatedPage;
    use std::sync::Arc;

    #[test]
    fn test_roster_order_is_fixed() {
        let page: SharedHost = Arc::new(SimulatedPage::new());
        let mut config = LoaderConfig::default();
        config.custom_scripts.push(CustomScript {
            name: "extra".into(),
            src: "/extra.js".into(),
            enabled: true,
            placement: Default::default(),
            async_load: true,
            defer: false,
            attributes: Default::default(),
            noscript: None,
            init: None,
        });

        let roster = build_roster(&config, page);
        let names = roster.names();
        assert_eq!(names[..16], BUILTIN_ENTRIES[..]);
        assert_eq!(names[16], "custom:extra");
    }

    #[test]
    fn test_default_config_enables_nothing() {
        let page: SharedHost = Arc::new(SimulatedPage::new());
        let roster = build_roster(&LoaderConfig::default(), page);
        assert!(roster.entries().iter().all(|e| !e.is_enabled()));
    }

    #[test]
    fn test_configured_vendors_enabled() {
        let mut config = LoaderConfig::default();
        config.analytics.google_analytics_id = "G-1".into();
        config.chat.hubspot_id = "77".into();
        config.userway.enabled = true;

        let page: SharedHost = Arc::new(SimulatedPage::new());
        let roster = build_roster(&config, page);

        let enabled: Vec<_> = roster
            .entries()
            .iter()
            .filter(|e| e.is_enabled())
            .map(|e| e.name())
            .collect();
        assert_eq!(enabled, vec!["Google Analytics", "HubSpot Chat", "UserWay"]);
    }

    #[test]
    fn test_config_published_on_page() {
        let mut config = LoaderConfig::default();
        config.delay_timeout_ms = 3000;
        config.chat.olark_id = "1-2-3".into();

        let page = Arc::new(SimulatedPage::new());
        let host: SharedHost = page.clone();
        build_roster(&config, host);

        let published = page.global(CONFIG_GLOBAL).unwrap();
        assert_eq!(published["delay_timeout_ms"], serde_json::json!(3000));
        assert_eq!(published["chat"]["olark_id"], serde_json::json!("1-2-3"));
        assert_eq!(published["triggers"][0], serde_json::json!("scroll"));
    }
}
