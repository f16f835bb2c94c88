//! Chat widget integrations

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};

use contracts::{ActionEntry, HostEnvironment, Placement, ScriptDescriptor};
use injector::globals::{push_nested, set_field};
use injector::Injector;

const OLARK_LOADER: &str = "static.olark.com/jsclient/loader.js";
const INTAKER_URL: &str = "https://intaker.azureedge.net/widget/chat.min.js";

/// Upper bound of the Juvo Leads cache-busting query value
const JUVO_CACHE_BUSTER_MAX: u64 = 9_999_999_999;

define_script_vendor!(
    /// Ngage live chat
    ngage_chat,
    "Ngage Chat",
    |id| format!("https://messenger.ngageics.com/ilnksrvr.aspx?websiteid={id}")
);

define_script_vendor!(
    /// Apex live chat
    apex_chat,
    "Apex Chat",
    |id| format!("//www.apex.live/scripts/invitation.ashx?company={id}")
);

define_script_vendor!(
    /// HubSpot chat, keyed by portal id
    hubspot_chat,
    "HubSpot Chat",
    |id| format!("https://js.hs-scripts.com/{id}.js")
);

/// Olark chat; identifies the site once the loader script arrives
pub fn olark_chat(id: &str, injector: &Injector) -> ActionEntry {
    let id = id.to_string();
    let injector = injector.clone();

    ActionEntry::gated("Olark Chat", !id.is_empty(), move || {
        injector.diagnostics().log(format!("Setting up Olark Chat: {id}"));

        let host = Arc::clone(injector.host());
        let now = Utc::now().timestamp_millis();
        host.set_global(
            "olark",
            json!({ "_": { "s": [], "t": [now], "c": {}, "l": OLARK_LOADER } }),
        );

        let id = id.clone();
        injector.inject(
            ScriptDescriptor::new(format!("//{OLARK_LOADER}")).on_load(move || {
                host.update_global("olark", &mut |olark| {
                    if let Some(state) = olark.get_mut("_").and_then(Value::as_object_mut) {
                        state.insert("i".to_string(), json!(id));
                    }
                });
                let host = host.as_ref();
                push_nested(host, "olark", &["_", "s"], json!(["identify", id]));
                push_nested(host, "olark", &["_", "t"], json!(Utc::now().timestamp_millis()));
            }),
        )?;
        Ok(())
    })
}

/// Intaker chat; the widget reads its site name from `Intaker.odl`
pub fn intaker_chat(id: &str, injector: &Injector) -> ActionEntry {
    let id = id.to_string();
    let injector = injector.clone();

    ActionEntry::gated("Intaker Chat", !id.is_empty(), move || {
        injector
            .diagnostics()
            .log(format!("Setting up Intaker Chat: {id}"));

        set_field(injector.host().as_ref(), "Intaker", "odl", json!(id));
        injector.inject(ScriptDescriptor::new(INTAKER_URL))?;
        Ok(())
    })
}

/// Juvo Leads tag, appended to the footer with a fresh cache buster
pub fn juvo_leads(id: &str, injector: &Injector) -> ActionEntry {
    let id = id.to_string();
    let injector = injector.clone();

    ActionEntry::gated("Juvo Leads", !id.is_empty(), move || {
        injector.diagnostics().log(format!("Setting up Juvo Leads: {id}"));

        let cache_buster = rand::rng().random_range(0..JUVO_CACHE_BUSTER_MAX);
        injector.inject(
            ScriptDescriptor::new(format!("https://cdn.juvoleads.com/tag/{id}.js?v={cache_buster}"))
                .target(Placement::Footer),
        )?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SharedHost;
    use injector::Diagnostics;
    use page_sim::SimulatedPage;

    fn setup() -> (Arc<SimulatedPage>, Injector) {
        let page = Arc::new(SimulatedPage::new());
        let host: SharedHost = page.clone();
        (page, Injector::new(host, Diagnostics::default()))
    }

    #[test]
    fn test_simple_script_vendors() {
        let (page, injector) = setup();
        ngage_chat("0-1-2", &injector).run().unwrap();
        apex_chat("acme", &injector).run().unwrap();
        hubspot_chat("4242", &injector).run().unwrap();

        assert_eq!(
            page.script_sources(),
            vec![
                "https://messenger.ngageics.com/ilnksrvr.aspx?websiteid=0-1-2",
                "//www.apex.live/scripts/invitation.ashx?company=acme",
                "https://js.hs-scripts.com/4242.js",
            ]
        );
        assert!(page.scripts().iter().all(|s| s.container == "body"));
    }

    #[test]
    fn test_empty_ids_disable_entries() {
        let (_, injector) = setup();
        for entry in [
            ngage_chat("", &injector),
            olark_chat("", &injector),
            apex_chat("", &injector),
            hubspot_chat("", &injector),
            intaker_chat("", &injector),
            juvo_leads("", &injector),
        ] {
            assert!(!entry.is_enabled(), "{} should be disabled", entry.name());
        }
    }

    #[test]
    fn test_olark_identifies_on_load() {
        let (page, injector) = setup();
        olark_chat("1111-222-33-4444", &injector).run().unwrap();
        assert_eq!(page.script_sources(), vec!["//static.olark.com/jsclient/loader.js"]);

        page.settle_loads();
        let olark = page.global("olark").unwrap();
        assert_eq!(olark["_"]["i"], json!("1111-222-33-4444"));
        assert_eq!(olark["_"]["s"], json!([["identify", "1111-222-33-4444"]]));
        assert_eq!(olark["_"]["t"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_intaker_sets_site_name() {
        let (page, injector) = setup();
        intaker_chat("lawfirm", &injector).run().unwrap();
        assert_eq!(page.global("Intaker"), Some(json!({ "odl": "lawfirm" })));
        assert_eq!(page.script_sources(), vec![INTAKER_URL]);
    }

    #[test]
    fn test_juvo_leads_footer_with_cache_buster() {
        let (page, injector) = setup();
        let entry = juvo_leads("12345", &injector);
        entry.run().unwrap();
        entry.run().unwrap();

        let scripts = page.scripts();
        assert_eq!(scripts.len(), 2);
        for script in &scripts {
            assert_eq!(script.container, "footer");
            let src = script.src.as_deref().unwrap();
            let (base, buster) = src.split_once("?v=").unwrap();
            assert_eq!(base, "https://cdn.juvoleads.com/tag/12345.js");
            assert!(buster.parse::<u64>().unwrap() < JUVO_CACHE_BUSTER_MAX);
        }
    }
}
