//! Analytics and advertising integrations

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use contracts::{ActionEntry, AnalyticsConfig, HostEnvironment, Placement, ScriptDescriptor};
use injector::globals::{define_if_absent, push_nested, push_queue};
use injector::Injector;

const GTAG_URL: &str = "https://www.googletagmanager.com/gtag/js?id=";
const GTM_URL: &str = "https://www.googletagmanager.com/gtm.js?id=";
const GTM_NOSCRIPT_URL: &str = "https://www.googletagmanager.com/ns.html?id=";
const FB_EVENTS_URL: &str = "https://connect.facebook.net/en_US/fbevents.js";
const FB_PIXEL_URL: &str = "https://www.facebook.com/tr";
const BING_URL: &str = "//bat.bing.com/bat.js";

/// `gtag(...)` calls queued once gtag.js has loaded
pub fn gtag_commands(config: &AnalyticsConfig, now: DateTime<Utc>) -> Vec<Value> {
    let mut commands = vec![
        json!(["js", now.to_rfc3339()]),
        json!(["config", config.google_analytics_id]),
    ];

    if !config.google_ads_id.is_empty() {
        commands.push(json!(["config", config.google_ads_id]));
    }

    if !config.call_metrics_id.is_empty() {
        for phone in config.call_metrics_phones.iter().filter(|p| !p.is_empty()) {
            commands.push(json!([
                "config",
                config.call_metrics_id,
                { "phone_conversion_number": phone }
            ]));
        }
    }

    if !config.lead_conversion_id.is_empty() {
        commands.push(json!([
            "event",
            "conversion",
            {
                "send_to": config.lead_conversion_id,
                "value": config.lead_conversion_value,
                "currency": config.lead_conversion_currency,
            }
        ]));
    }

    commands
}

/// Google Analytics 4 via gtag.js
pub fn google_analytics(config: &AnalyticsConfig, injector: &Injector) -> ActionEntry {
    let config = config.clone();
    let injector = injector.clone();
    let enabled = !config.google_analytics_id.is_empty();

    ActionEntry::gated("Google Analytics", enabled, move || {
        let id = &config.google_analytics_id;
        injector
            .diagnostics()
            .log(format!("Setting up Google Analytics: {id}"));

        let host = Arc::clone(injector.host());
        let config = config.clone();
        injector.inject(
            ScriptDescriptor::new(format!("{GTAG_URL}{id}"))
                .defer(true)
                .on_load(move || {
                    for command in gtag_commands(&config, Utc::now()) {
                        push_queue(host.as_ref(), "dataLayer", command);
                    }
                }),
        )?;
        Ok(())
    })
}

/// Google Tag Manager container plus its iframe fallback
pub fn google_tag_manager(config: &AnalyticsConfig, injector: &Injector) -> ActionEntry {
    let id = config.google_tag_manager_id.clone();
    let injector = injector.clone();

    ActionEntry::gated("Google Tag Manager", !id.is_empty(), move || {
        injector
            .diagnostics()
            .log(format!("Setting up Google Tag Manager: {id}"));

        push_queue(
            injector.host().as_ref(),
            "dataLayer",
            json!({ "gtm.start": Utc::now().timestamp_millis(), "event": "gtm.js" }),
        );
        injector.inject(ScriptDescriptor::new(format!("{GTM_URL}{id}")).target(Placement::Head))?;
        injector.inject_noscript_first(&format!(
            r#"<iframe src="{GTM_NOSCRIPT_URL}{id}" height="0" width="0" style="display:none;visibility:hidden"></iframe>"#
        ))?;
        Ok(())
    })
}

/// Facebook Pixel; never re-initialises an `fbq` already on the page
pub fn facebook_pixel(config: &AnalyticsConfig, injector: &Injector) -> ActionEntry {
    let pixel_id = config.facebook_pixel_id.clone();
    let injector = injector.clone();

    ActionEntry::gated("Facebook Pixel", !pixel_id.is_empty(), move || {
        let diagnostics = injector.diagnostics();
        diagnostics.log(format!("Setting up Facebook Pixel: {pixel_id}"));

        let host = Arc::clone(injector.host());
        let stub = json!({ "loaded": true, "version": "2.0", "queue": [] });
        if !define_if_absent(host.as_ref(), "fbq", stub.clone()) {
            diagnostics.log("Facebook Pixel already present, skipping");
            return Ok(());
        }
        define_if_absent(host.as_ref(), "_fbq", stub);

        let id = pixel_id.clone();
        injector.inject(ScriptDescriptor::new(FB_EVENTS_URL).on_load(move || {
            let host = host.as_ref();
            push_nested(
                host,
                "fbq",
                &["queue"],
                json!(["init", id, {}, { "agent": "wordpress-delayed-js" }]),
            );
            push_nested(host, "fbq", &["queue"], json!(["track", "PageView", []]));
        }))?;

        injector.inject_noscript(
            &format!(
                r#"<img height="1" width="1" style="display:none" alt="fbpx" src="{FB_PIXEL_URL}?id={pixel_id}&ev=PageView&noscript=1" />"#
            ),
            Placement::Head,
        )?;
        Ok(())
    })
}

/// Bing UET conversion tracking
pub fn bing_conversion(config: &AnalyticsConfig, injector: &Injector) -> ActionEntry {
    let tag_id = config.bing_conversion_id.clone();
    let injector = injector.clone();

    ActionEntry::gated("Bing Conversion", !tag_id.is_empty(), move || {
        injector
            .diagnostics()
            .log(format!("Setting up Bing Conversion: {tag_id}"));

        let host = Arc::clone(injector.host());
        define_if_absent(host.as_ref(), "uetq", json!([]));

        let tag_id = tag_id.clone();
        injector.inject(ScriptDescriptor::new(BING_URL).on_load(move || {
            let queued = host.global("uetq").unwrap_or_else(|| json!([]));
            host.set_global("uetq", json!({ "ti": tag_id, "q": queued }));
            push_nested(host.as_ref(), "uetq", &["q"], json!("pageLoad"));
        }))?;
        Ok(())
    })
}

/// HotJar session recording
pub fn hotjar(config: &AnalyticsConfig, injector: &Injector) -> ActionEntry {
    let id = config.hotjar_id.clone();
    let injector = injector.clone();

    ActionEntry::gated("HotJar", !id.is_empty(), move || {
        injector.diagnostics().log(format!("Setting up HotJar: {id}"));

        let host = injector.host().as_ref();
        define_if_absent(host, "hj", json!({ "q": [] }));
        host.set_global("_hjSettings", json!({ "hjid": id, "hjsv": 6 }));

        injector.inject(
            ScriptDescriptor::new(format!("https://static.hotjar.com/c/hotjar-{id}.js?sv=6"))
                .target(Placement::Head),
        )?;
        Ok(())
    })
}
