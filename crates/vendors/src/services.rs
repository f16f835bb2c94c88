//! Flag-enabled services and accessibility widgets

use std::sync::Arc;

use serde_json::{json, Map, Value};

use contracts::{
    AccessibeConfig, ActionEntry, HostEnvironment, Placement, ProveSourceConfig, ScriptDescriptor,
    ServicesConfig, UserWayConfig,
};
use injector::globals::set_field;
use injector::Injector;

const CLICK_CEASE_URL: &str = "https://www.clickcease.com/monitor/stat.js";
const CLICK_CEASE_NOSCRIPT: &str = r#"<a href="https://www.clickcease.com"><img src="https://monitor.clickcease.com/stats/stats.aspx" alt="Click Fraud Protection" /></a>"#;
const TRANSLATE_URL: &str =
    "https://translate.google.com/translate_a/element.js?cb=googleTranslateElementInit";
const PROVESOURCE_URL: &str = "https://cdn.provesrc.com/provesrc.js";
const USERWAY_URL: &str = "https://cdn.userway.org/widget.js";
const ACCESSIBE_URL: &str = "https://acsbapp.com/apps/app/dist/js/app.js";

/// ClickCease click-fraud monitor
pub fn click_cease(config: &ServicesConfig, injector: &Injector) -> ActionEntry {
    let injector = injector.clone();

    ActionEntry::gated("ClickCease", config.click_cease, move || {
        injector.diagnostics().log("Setting up ClickCease");
        injector.inject(ScriptDescriptor::new(CLICK_CEASE_URL).target(Placement::Head))?;
        injector.inject_noscript(CLICK_CEASE_NOSCRIPT, Placement::Body)?;
        Ok(())
    })
}

/// Options handed to `google.translate.TranslateElement`
pub fn translate_element_options(config: &ServicesConfig, ga_id: &str) -> Value {
    let options = &config.translate;
    json!({
        "pageLanguage": options.page_language,
        "includedLanguages": options.included_languages,
        "layout": "SIMPLE",
        "gaTrack": !ga_id.is_empty(),
        "gaId": ga_id,
        "elementId": options.element_id,
    })
}

/// Custom Google Translate element
///
/// GA tracking inside the widget follows whether a GA4 id is configured.
pub fn google_translate(config: &ServicesConfig, ga_id: &str, injector: &Injector) -> ActionEntry {
    let options = translate_element_options(config, ga_id);
    let injector = injector.clone();

    ActionEntry::gated("Google Translate", config.google_translate, move || {
        injector.diagnostics().log("Setting up Google Translate");
        injector
            .host()
            .set_global("googleTranslateElementInit", options.clone());
        injector.inject(ScriptDescriptor::new(TRANSLATE_URL).target(Placement::Footer))?;
        Ok(())
    })
}

/// ProveSource social proof; refuses to load twice
pub fn provesource(config: &ProveSourceConfig, injector: &Injector) -> ActionEntry {
    let config = config.clone();
    let injector = injector.clone();
    let enabled = !config.api_key.is_empty();

    ActionEntry::gated("ProveSource", enabled, move || {
        let diagnostics = injector.diagnostics();
        diagnostics.log(format!("Setting up ProveSource: {}", config.api_key));

        let host = injector.host();
        if host.global("provesrc").is_some() {
            diagnostics.warn("ProveSource is already loaded on this page");
            return Ok(());
        }

        host.set_global("provesrc", json!({ "dq": [] }));
        host.set_global(
            "_provesrcAsyncInit",
            json!({ "apiKey": config.api_key, "v": config.version }),
        );
        injector.inject(ScriptDescriptor::new(PROVESOURCE_URL).attribute("charset", "UTF-8"))?;
        Ok(())
    })
}

/// UserWay accessibility widget; an account id is mandatory
pub fn userway(config: &UserWayConfig, injector: &Injector) -> ActionEntry {
    let config = config.clone();
    let injector = injector.clone();

    ActionEntry::gated("UserWay", config.enabled, move || {
        let diagnostics = injector.diagnostics();
        diagnostics.log("Setting up UserWay");

        if config.account.is_empty() {
            diagnostics.warn("UserWay account ID is required");
            return Ok(());
        }

        injector.inject(
            ScriptDescriptor::new(USERWAY_URL)
                .target(Placement::Footer)
                .attribute("data-account", &config.account)
                .attribute("data-position", config.position)
                .attribute("data-color", &config.color)
                .attribute("data-type", &config.widget_type),
        )?;
        Ok(())
    })
}

/// accessiBe widget defaults
pub fn accessibe_default_options() -> Map<String, Value> {
    let defaults = json!({
        "statementLink": "",
        "footerHtml": "ADA Website Access",
        "hideMobile": false,
        "hideTrigger": false,
        "disableBgProcess": false,
        "language": "en",
        "position": "right",
        "leadColor": "#146ff8",
        "triggerColor": "#146ff8",
        "triggerRadius": "50%",
        "triggerPositionX": "right",
        "triggerPositionY": "center",
        "triggerIcon": "people",
        "triggerSize": "medium",
        "triggerOffsetX": 20,
        "triggerOffsetY": 49,
        "mobile": {
            "triggerSize": "small",
            "triggerPositionX": "right",
            "triggerPositionY": "center",
            "triggerOffsetX": 10,
            "triggerOffsetY": 20,
            "triggerRadius": "50%"
        }
    });
    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Defaults overridden key by key with the configured options
pub fn accessibe_options(config: &AccessibeConfig) -> Map<String, Value> {
    let mut options = accessibe_default_options();
    for (key, value) in &config.options {
        options.insert(key.clone(), value.clone());
    }
    options
}

/// accessiBe widget; `acsbJS.init` runs only if the loaded script exposed it
pub fn accessibe(config: &AccessibeConfig, injector: &Injector) -> ActionEntry {
    let options = Value::Object(accessibe_options(config));
    let injector = injector.clone();

    ActionEntry::gated("accessiBe", config.enabled, move || {
        let diagnostics = injector.diagnostics();
        diagnostics.log("Setting up accessiBe");

        let host = Arc::clone(injector.host());
        let options = options.clone();
        injector.inject(
            ScriptDescriptor::new(ACCESSIBE_URL)
                .target(Placement::Head)
                .on_load(move || {
                    if host.global("acsbJS").is_some_and(|acsb| acsb.is_object()) {
                        set_field(host.as_ref(), "acsbJS", "initOptions", options);
                    } else {
                        diagnostics.log("acsbJS not available after load");
                    }
                }),
        )?;
        Ok(())
    })
}
